//! # Findex Core Library
//!
//! This crate provides indexing and search for a launcher-style "find and
//! open" feature: files and folders matched by configured glob patterns,
//! plus a few special locations such as the trash.
//!
//! ## Architecture
//!
//! - **Config** (`config`): JSON configuration with defaults written back
//! - **Types** (`types`): The immutable entry model
//! - **Resolver** (`resolver`): Path/URI to entry conversion and icon lookup
//! - **Scanner** (`scanner`): Glob expansion into entries
//! - **Index** (`index`): Atomically replaced snapshots
//! - **Search** (`search`): Path-mode and name-mode query handling
//! - **Refresher** (`refresher`): Periodic background rescans
//! - **Result** (`result`): Host-facing result records
//!
//! ## Example
//!
//! ```rust,ignore
//! use findex_core::{Config, Index, NamedIconLookup, QueryEngine, Refresher, ResolverKind, Scanner};
//! use std::sync::Arc;
//!
//! let config = Arc::new(Config::load()?);
//! let resolver = ResolverKind::Metadata.build(Arc::new(NamedIconLookup));
//! let index = Arc::new(Index::new());
//!
//! let mut refresher = Refresher::start(
//!     Arc::clone(&config),
//!     Scanner::new(Arc::clone(&resolver)),
//!     Arc::clone(&index),
//! )?;
//!
//! let engine = QueryEngine::new(config, index, resolver);
//! for item in engine.results("readme", || false) {
//!     println!("{} ({})", item.text, item.subtext);
//! }
//!
//! refresher.shutdown_default();
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod refresher;
pub mod resolver;
pub mod result;
pub mod scanner;
pub mod search;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{FindexError, Result};
pub use index::{Index, Snapshot};
pub use refresher::{Refresher, RefresherHandle, RefresherStatus};
pub use resolver::{
    EntryResolver, IconLookup, MetadataResolver, NamedIconLookup, PathResolver, ResolverKind,
    ThemeIconLookup,
};
pub use result::{ResultAction, ResultItem};
pub use scanner::Scanner;
pub use search::{QueryEngine, QueryMode};
pub use types::{EntryKind, IconHandle, IndexEntry, VirtualLocation};
