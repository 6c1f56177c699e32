//! Index command - scan the configured patterns once.

use crate::app::App;
use findex_core::{EntryKind, ResolverKind};
use std::path::Path;
use std::time::Instant;

/// Run the index command.
pub fn run(config_path: &Path, resolver: ResolverKind) -> anyhow::Result<()> {
    let app = App::new(config_path, resolver)?;

    println!("Scanning {} pattern(s)...", app.config.paths.len());

    let start = Instant::now();
    let snapshot = app.scan_once();
    let elapsed = start.elapsed();

    let places = snapshot
        .iter()
        .filter(|e| e.kind() == EntryKind::Virtual)
        .count();
    let dirs = snapshot.iter().filter(|e| e.is_dir()).count();

    println!();
    println!("Scan complete!");
    println!("  Entries:     {}", snapshot.len());
    println!("  Directories: {}", dirs);
    println!("  Files:       {}", snapshot.len() - dirs - places);
    println!("  Places:      {}", places);
    println!("  Resolver:    {}", app.resolver.name());
    println!("  Time:        {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
