//! Query command - scan once, then answer a single query.

use crate::app::App;
use crate::OutputFormat;
use findex_core::{QueryMode, ResolverKind};
use std::path::Path;
use std::time::Instant;

/// Run the query command.
pub fn run(
    config_path: &Path,
    resolver: ResolverKind,
    text: &str,
    limit: usize,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let app = App::new(config_path, resolver)?;

    // Path mode reads the directory live; only name mode needs a scan
    let mode = app.engine.mode(text);
    if matches!(mode, QueryMode::Name { .. }) {
        app.scan_once();
    }

    let start = Instant::now();
    let mut results = app.engine.results(text, || false);
    let elapsed = start.elapsed();
    results.truncate(limit);

    match output {
        OutputFormat::Text => {
            for item in &results {
                println!("{}  {}", item.text, item.subtext);
            }

            eprintln!();
            eprintln!(
                "Found {} results ({}) in {:.3}ms",
                results.len(),
                mode,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}
