//! Application state management.

use findex_core::{
    Config, EntryResolver, Index, QueryEngine, ResolverKind, Scanner, Snapshot, ThemeIconLookup,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration, normalized on load
    pub config: Arc<Config>,

    /// Where the configuration was read from
    pub config_path: PathBuf,

    /// The published index
    pub index: Arc<Index>,

    /// Resolver shared by scans and path-mode queries
    pub resolver: Arc<dyn EntryResolver>,

    /// Query front end over `index`
    pub engine: QueryEngine,
}

impl App {
    /// Create a new application instance with an empty index.
    pub fn new(config_path: &Path, resolver: ResolverKind) -> anyhow::Result<Self> {
        let config = Arc::new(Config::load_from(config_path)?);
        let resolver = resolver.build(Arc::new(ThemeIconLookup::system()));
        let index = Arc::new(Index::new());
        let engine = QueryEngine::new(
            Arc::clone(&config),
            Arc::clone(&index),
            Arc::clone(&resolver),
        );

        info!(
            config = %config_path.display(),
            patterns = config.paths.len(),
            resolver = resolver.name(),
            "Application initialized"
        );

        Ok(App {
            config,
            config_path: config_path.to_path_buf(),
            index,
            resolver,
            engine,
        })
    }

    /// A scanner over this app's resolver.
    pub fn scanner(&self) -> Scanner {
        Scanner::new(Arc::clone(&self.resolver))
    }

    /// Run one scan in the foreground and publish it.
    pub fn scan_once(&self) -> Arc<Snapshot> {
        let scanner = self.scanner();
        self.index.publish(scanner.scan(&self.config))
    }
}
