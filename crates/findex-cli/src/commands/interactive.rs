//! Interactive command - answer queries from stdin while the refresher runs.
//!
//! Each input line is a query. A few lines starting with `:` are commands:
//!
//! - `:rescan` - rescan now instead of waiting for the interval
//! - `:status` - show refresher and snapshot state
//! - `:quit` - leave (same as EOF)

use crate::app::App;
use findex_core::{Refresher, RefresherHandle, ResolverKind};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// Run the interactive command.
pub fn run(config_path: &Path, resolver: ResolverKind, limit: usize) -> anyhow::Result<()> {
    let app = App::new(config_path, resolver)?;
    let mut refresher = Refresher::start(
        app.config.clone(),
        app.scanner(),
        app.index.clone(),
    )?;

    eprintln!(
        "Indexing {} pattern(s) every {}s. Type a query, :status, :rescan or :quit.",
        app.config.paths.len(),
        app.config.scan_interval
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        match line.trim() {
            ":quit" | ":q" => break,
            ":rescan" => {
                refresher.rescan_now();
                writeln!(stdout, "Rescan requested")?;
            }
            ":status" => print_status(&mut stdout, &app, &refresher)?,
            _ => {
                let results = app.engine.results(&line, || false);
                for item in results.iter().take(limit) {
                    writeln!(stdout, "{}  {}", item.text, item.subtext)?;
                }
                if results.len() > limit {
                    writeln!(stdout, "... {} more", results.len() - limit)?;
                }
                writeln!(stdout)?;
            }
        }
        stdout.flush()?;
    }

    if refresher.shutdown_default() {
        info!("Refresher shut down cleanly");
    } else {
        warn!("Refresher did not stop in time; exiting anyway");
    }

    Ok(())
}

fn print_status(out: &mut impl Write, app: &App, refresher: &RefresherHandle) -> io::Result<()> {
    let snapshot = app.index.current();

    writeln!(out, "Refresher:  {}", refresher.status())?;
    writeln!(out, "Scans:      {}", refresher.scans_completed())?;
    writeln!(out, "Generation: {}", snapshot.generation())?;
    writeln!(out, "Entries:    {}", snapshot.len())?;
    match snapshot.published_at() {
        Some(at) => writeln!(
            out,
            "Published:  {}",
            at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        )?,
        None => writeln!(out, "Published:  never")?,
    }
    writeln!(out)
}
