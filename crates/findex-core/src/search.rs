//! Query handling for Findex.
//!
//! A query runs in one of two modes:
//!
//! - **Path mode**: the query looks like `<existing dir>/<partial name>`. The
//!   directory is listed live, bypassing the index, so unindexed locations
//!   and fresh files show up immediately.
//! - **Name mode**: everything else. Titles in the current snapshot are
//!   matched by case-insensitive substring.
//!
//! Results are ranked by the character position of the first match in the
//! name, so names that start with the query come first. Name mode breaks ties by
//! title; path mode keeps directory listing order for ties.
//!
//! Queries never fail: I/O errors, unresolvable entries and cancellation all
//! just shorten the result list.

use crate::config::Config;
use crate::index::Index;
use crate::resolver::EntryResolver;
use crate::result::ResultItem;
use crate::types::{char_position, IndexEntry, VirtualLocation};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// How a query will be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    /// List `dir` live and keep children whose name contains `needle`
    Path { dir: PathBuf, needle: String },

    /// Search entry titles in the current snapshot for `needle`
    Name { needle: String },
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::Path { .. } => write!(f, "path"),
            QueryMode::Name { .. } => write!(f, "name"),
        }
    }
}

/// A matching entry with its rank key.
struct Candidate {
    pos: usize,
    entry: Arc<IndexEntry>,
}

/// Answers queries against the published index or the live filesystem.
#[derive(Clone)]
pub struct QueryEngine {
    config: Arc<Config>,
    index: Arc<Index>,
    resolver: Arc<dyn EntryResolver>,
}

impl QueryEngine {
    /// Create a query engine.
    pub fn new(config: Arc<Config>, index: Arc<Index>, resolver: Arc<dyn EntryResolver>) -> Self {
        QueryEngine {
            config,
            index,
            resolver,
        }
    }

    /// Decide how a raw query string will be answered.
    ///
    /// Path mode needs a separator in the query. If the whole query is an
    /// existing directory it is listed in full; otherwise the part before
    /// the last separator must be an existing directory and the part after
    /// it filters the listing.
    pub fn mode(&self, query: &str) -> QueryMode {
        classify(query)
    }

    /// Run a query and return matching entries, best first.
    ///
    /// `is_cancelled` is polled before each candidate. Once it returns true
    /// the entries matched so far are ranked and returned.
    pub fn handle<F>(&self, query: &str, is_cancelled: F) -> Vec<Arc<IndexEntry>>
    where
        F: Fn() -> bool,
    {
        let normalized = query.trim().to_lowercase();
        if !self.config.accepts_query(&normalized) {
            return Vec::new();
        }

        let start = Instant::now();
        let mode = self.mode(query);
        let results = match &mode {
            QueryMode::Path { dir, needle } => self.search_dir(dir, needle, &is_cancelled),
            QueryMode::Name { needle } => self.search_index(needle, &is_cancelled),
        };

        debug!(
            query,
            mode = %mode,
            results = results.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Query handled"
        );
        results
    }

    /// Run a query and convert the entries into host result records.
    pub fn results<F>(&self, query: &str, is_cancelled: F) -> Vec<ResultItem>
    where
        F: Fn() -> bool,
    {
        self.handle(query, is_cancelled)
            .iter()
            .map(|entry| self.to_result(entry))
            .collect()
    }

    /// Build a result record, refreshing the trash icon since its
    /// empty/full state goes stale between scans.
    fn to_result(&self, entry: &IndexEntry) -> ResultItem {
        let mut item = ResultItem::from(entry);
        if entry.uri() == VirtualLocation::Trash.uri() {
            if let Ok(fresh) = self.resolver.resolve(entry.uri()) {
                item.icon = fresh.icon().map(|icon| icon.as_str().to_string());
            }
        }
        item
    }

    /// Name mode: substring search over the snapshot current at call time.
    fn search_index(&self, needle: &str, is_cancelled: &dyn Fn() -> bool) -> Vec<Arc<IndexEntry>> {
        let snapshot = self.index.current();
        let mut candidates = Vec::new();

        for entry in snapshot.iter() {
            if is_cancelled() {
                debug!(collected = candidates.len(), "Name query cancelled");
                break;
            }
            if let Some(pos) = entry.match_position(needle) {
                candidates.push(Candidate {
                    pos,
                    entry: Arc::clone(entry),
                });
            }
        }

        candidates.sort_by(|a, b| {
            a.pos
                .cmp(&b.pos)
                .then_with(|| a.entry.title().cmp(b.entry.title()))
        });
        candidates.into_iter().map(|c| c.entry).collect()
    }

    /// Path mode: list `dir` live and filter children by name.
    fn search_dir(
        &self,
        dir: &Path,
        needle: &str,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Vec<Arc<IndexEntry>> {
        let listing = match fs::read_dir(dir) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to list directory");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for child in listing {
            if is_cancelled() {
                debug!(collected = candidates.len(), "Path query cancelled");
                break;
            }
            let child = match child {
                Ok(child) => child,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let name = child.file_name().to_string_lossy().to_lowercase();
            let Some(pos) = char_position(&name, needle) else {
                continue;
            };

            let path = child.path();
            match self.resolver.resolve_path(&path) {
                Ok(entry) => candidates.push(Candidate {
                    pos,
                    entry: Arc::new(entry),
                }),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping unresolvable child"),
            }
        }

        // Stable sort on position only: ties keep listing order.
        candidates.sort_by_key(|c| c.pos);
        candidates.into_iter().map(|c| c.entry).collect()
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("min_length", &self.config.min_length)
            .field("index", &self.index)
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

/// Pick path or name mode for a raw query.
fn classify(query: &str) -> QueryMode {
    let name_mode = || QueryMode::Name {
        needle: query.trim().to_lowercase(),
    };

    let Some(split) = query.rfind(MAIN_SEPARATOR) else {
        return name_mode();
    };

    if Path::new(query).is_dir() {
        return QueryMode::Path {
            dir: PathBuf::from(query),
            needle: String::new(),
        };
    }

    let (head, tail) = (&query[..split], &query[split + MAIN_SEPARATOR.len_utf8()..]);
    let head = if head.is_empty() {
        PathBuf::from(MAIN_SEPARATOR.to_string())
    } else {
        PathBuf::from(head)
    };

    if head.is_dir() {
        QueryMode::Path {
            dir: head,
            needle: tail.trim().to_lowercase(),
        }
    } else {
        name_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MetadataResolver, NamedIconLookup};
    use crate::types::EntryKind;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn resolver() -> Arc<dyn EntryResolver> {
        Arc::new(MetadataResolver::new(Arc::new(NamedIconLookup)))
    }

    fn entry(title: &str) -> IndexEntry {
        let uri = format!("file:///index/{}", title);
        let path = format!("/index/{}", title);
        IndexEntry::new(EntryKind::Regular, uri, path, title).unwrap()
    }

    fn engine_with(titles: &[&str], min_length: usize) -> QueryEngine {
        let index = Arc::new(Index::new());
        index.publish(titles.iter().map(|t| entry(t)));
        let config = Config {
            min_length,
            ..Config::default()
        };
        QueryEngine::new(Arc::new(config), index, resolver())
    }

    fn titles(results: &[Arc<IndexEntry>]) -> Vec<&str> {
        results.iter().map(|e| e.title()).collect()
    }

    fn never() -> bool {
        false
    }

    #[test]
    fn test_name_mode_ranking() {
        let engine = engine_with(&["Cabinet", "Abacus", "Banana"], 1);
        let results = engine.handle("a", never);
        assert_eq!(titles(&results), vec!["Abacus", "Banana", "Cabinet"]);
    }

    #[test]
    fn test_name_mode_ranks_by_character_position() {
        // "a" is the second character of "éa" but its third byte
        let engine = engine_with(&["xya", "éa"], 1);
        let results = engine.handle("a", never);
        assert_eq!(titles(&results), vec!["éa", "xya"]);
    }

    #[test]
    fn test_name_mode_is_case_insensitive_and_trimmed() {
        let engine = engine_with(&["README.md", "notes.txt", "MyReadme"], 1);
        let results = engine.handle("  ReadMe ", never);
        assert_eq!(titles(&results), vec!["README.md", "MyReadme"]);
    }

    #[test]
    fn test_min_length_gate() {
        let engine = engine_with(&["abc", "abd"], 3);
        assert!(engine.handle("ab", never).is_empty());
        assert!(engine.handle("  ab   ", never).is_empty());
        assert_eq!(engine.handle("abc", never).len(), 1);
    }

    #[test]
    fn test_zero_min_length_matches_everything() {
        let engine = engine_with(&["b", "a"], 0);
        assert_eq!(titles(&engine.handle("", never)), vec!["a", "b"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let engine = engine_with(&["alpha"], 1);
        assert!(engine.handle("zzz", never).is_empty());
    }

    #[test]
    fn test_cancellation_returns_first_n_candidates() {
        let engine = engine_with(&["x1", "x2", "x3", "x4", "x5"], 1);
        let polls = Cell::new(0);
        // Live for three candidates, then cancelled
        let results = engine.handle("x", || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });
        assert_eq!(titles(&results), vec!["x1", "x2", "x3"]);
    }

    #[test]
    fn test_query_uses_snapshot_at_call_start() {
        let engine = engine_with(&["old"], 1);
        let index = Arc::clone(&engine.index);
        let results = engine.handle("o", || {
            index.publish(vec![entry("new")]);
            false
        });
        assert_eq!(titles(&results), vec!["old"]);
        assert_eq!(titles(&engine.handle("n", never)), vec!["new"]);
    }

    fn make_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in ["Documents", "notes.doc", "Music", "adoc.txt"] {
            fs::write(temp_dir.path().join(name), "").unwrap();
        }
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        temp_dir
    }

    #[test]
    fn test_path_mode_detection() {
        let dir = make_dir();
        let engine = engine_with(&[], 1);
        let root = dir.path().to_string_lossy().into_owned();

        let query = format!("{}/Doc", root);
        assert_eq!(
            engine.mode(&query),
            QueryMode::Path {
                dir: dir.path().to_path_buf(),
                needle: "doc".to_string(),
            }
        );

        // Whole query is an existing directory: list it in full
        let query = format!("{}/sub", root);
        assert_eq!(
            engine.mode(&query),
            QueryMode::Path {
                dir: dir.path().join("sub"),
                needle: String::new(),
            }
        );

        // Parent does not exist: back to name mode
        let query = format!("{}/missing/Doc", root);
        assert!(matches!(engine.mode(&query), QueryMode::Name { .. }));

        assert!(matches!(engine.mode("Doc"), QueryMode::Name { .. }));
    }

    #[test]
    fn test_path_mode_bypasses_index() {
        let dir = make_dir();
        // The index knows nothing about the directory
        let engine = engine_with(&["Documents elsewhere"], 1);

        let query = format!("{}/Doc", dir.path().display());
        let results = engine.handle(&query, never);

        // Ranked by match position: 0, 1, 6
        assert_eq!(titles(&results), vec!["Documents", "adoc.txt", "notes.doc"]);
        assert!(results.iter().all(|e| e.path().starts_with(&*dir.path().to_string_lossy())));
    }

    #[test]
    fn test_path_mode_ties_keep_listing_order() {
        // Known quirk: unlike name mode, ties are not broken by title.
        let dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let listing: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        let engine = engine_with(&[], 1);
        let query = format!("{}/", dir.path().display());
        let results = engine.handle(&query, never);

        assert_eq!(titles(&results), listing.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_path_mode_cancellation() {
        let dir = make_dir();
        let engine = engine_with(&[], 1);
        let query = format!("{}/", dir.path().display());

        let results = engine.handle(&query, || true);
        assert!(results.is_empty());
    }

    #[test]
    fn test_path_mode_cancellation_after_n_children() {
        let dir = TempDir::new().unwrap();
        for name in ["x1", "skip", "x2", "x3", "other", "x4"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let listing: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();

        let engine = engine_with(&[], 1);
        let query = format!("{}/x", dir.path().display());
        let polls = Cell::new(0);
        // Polled once per listed child, matching or not
        let results = engine.handle(&query, || {
            polls.set(polls.get() + 1);
            polls.get() > 3
        });

        let expected: Vec<&str> = listing[..3]
            .iter()
            .map(String::as_str)
            .filter(|name| name.starts_with('x'))
            .collect();
        assert_eq!(titles(&results), expected);
        assert_eq!(polls.get(), 4);
    }

    #[test]
    fn test_path_mode_ranks_by_character_position() {
        let dir = TempDir::new().unwrap();
        // "na" starts at character 2 / byte 4 and character 3 / byte 3
        for name in ["ééna", "zzzna"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let engine = engine_with(&[], 1);
        let query = format!("{}/na", dir.path().display());

        let results = engine.handle(&query, never);
        assert_eq!(titles(&results), vec!["ééna", "zzzna"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_path_mode_lists_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xffname")), "").unwrap();
        let engine = engine_with(&[], 1);
        let query = format!("{}/bad", dir.path().display());

        let results = engine.handle(&query, never);
        assert_eq!(titles(&results), vec!["bad\u{FFFD}name"]);
        assert!(results[0].uri().ends_with("/bad%FFname"));
    }

    #[test]
    fn test_results_records() {
        let engine = engine_with(&["Abacus"], 1);
        let items = engine.results("aba", never);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "file:///index/Abacus");
        assert_eq!(items[0].text, "Abacus");
        assert_eq!(items[0].subtext, "/index/Abacus");
        assert_eq!(items[0].completion, "/index/Abacus");
        assert_eq!(items[0].actions.len(), 1);
        assert_eq!(items[0].actions[0].url, "file:///index/Abacus");
    }
}
