//! Glob-driven scanning.
//!
//! The scanner expands every configured pattern, resolves each matching path
//! into an [`IndexEntry`] and finally appends the virtual locations. It is
//! lazy: nothing touches the filesystem until the returned iterator is
//! driven, and every call to [`Scanner::scan`] walks the patterns afresh.
//!
//! Failures are per path. An invalid pattern, an unreadable directory, a path
//! the resolver rejects or even a resolver panic only drops the affected
//! entries; the rest of the scan carries on.

use crate::config::Config;
use crate::error::{FindexError, Result};
use crate::resolver::EntryResolver;
use crate::types::{IndexEntry, VirtualLocation};
use directories::BaseDirs;
use glob::MatchOptions;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Leading dots are filtered by [`HiddenFilter`] instead of glob, whose own
/// filter cannot cope with names that are not UTF-8.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Expands configured patterns into index entries.
#[derive(Clone)]
pub struct Scanner {
    resolver: Arc<dyn EntryResolver>,
}

impl Scanner {
    /// Create a scanner that builds entries with `resolver`.
    pub fn new(resolver: Arc<dyn EntryResolver>) -> Self {
        Scanner { resolver }
    }

    /// The resolver used to build entries
    pub fn resolver(&self) -> &Arc<dyn EntryResolver> {
        &self.resolver
    }

    /// Scan all configured patterns, then the virtual locations.
    ///
    /// Entries come out in pattern order, then match order within each
    /// pattern. Paths matched by more than one pattern appear once per match.
    pub fn scan<'a>(&'a self, config: &'a Config) -> impl Iterator<Item = IndexEntry> + 'a {
        let regular = config
            .paths
            .iter()
            .flat_map(|pattern| expand_pattern(pattern))
            .filter_map(move |path| {
                self.resolve_logged(&path.display(), || self.resolver.resolve_path(&path))
            });

        let virtuals = VirtualLocation::ALL.into_iter().filter_map(move |location| {
            self.resolve_logged(&location, || self.resolver.resolve(location.uri()))
        });

        regular.chain(virtuals)
    }

    /// Run one resolution, turning errors and panics into a skipped entry.
    fn resolve_logged<F>(&self, input: &dyn fmt::Display, resolve: F) -> Option<IndexEntry>
    where
        F: FnOnce() -> Result<IndexEntry>,
    {
        trace!(%input, "Resolving");
        match panic::catch_unwind(AssertUnwindSafe(resolve)) {
            Ok(Ok(entry)) => Some(entry),
            Ok(Err(e)) => {
                debug!(%input, error = %e, "Skipping unresolvable path");
                None
            }
            Err(_) => {
                warn!(%input, resolver = self.resolver.name(), "Resolver panicked, skipping");
                None
            }
        }
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scanner")
            .field("resolver", &self.resolver.name())
            .finish()
    }
}

/// Expand `~` and glob-match a single pattern.
fn expand_pattern(pattern: &str) -> impl Iterator<Item = PathBuf> {
    let expanded = expand_home(pattern);
    let paths = match glob::glob_with(&expanded, GLOB_OPTIONS) {
        Ok(paths) => Some(paths),
        Err(e) => {
            let err = FindexError::InvalidPattern {
                pattern: expanded.clone(),
                reason: e.msg.to_string(),
            };
            warn!(error = %err, "Skipping invalid glob pattern");
            None
        }
    };

    let hidden = HiddenFilter::new(&expanded);
    paths
        .into_iter()
        .flatten()
        .filter_map(|result| match result {
            Ok(path) => Some(path),
            Err(e) => {
                debug!(path = %e.path().display(), error = %e.error(), "Skipping unreadable path");
                None
            }
        })
        .filter(move |path| hidden.allows(path))
}

/// Drops matches where a wildcard matched a name starting with a dot.
///
/// Components of the pattern's literal prefix are never checked, and a
/// dotted name passes when the pattern has a dotted component matching it
/// (`~/.*`, `~/**/.config`). The `.` and `..` entries never pass.
struct HiddenFilter {
    literal_depth: usize,
    dot_patterns: Vec<glob::Pattern>,
}

impl HiddenFilter {
    fn new(pattern: &str) -> Self {
        let components: Vec<&str> = pattern.split('/').collect();
        let literal = components
            .iter()
            .take_while(|c| !c.contains(['*', '?', '[']))
            .count();
        let literal_prefix = components[..literal].join("/");
        let literal_depth = Path::new(&literal_prefix).components().count();

        let dot_patterns = components[literal..]
            .iter()
            .filter(|c| c.starts_with('.'))
            .filter_map(|c| glob::Pattern::new(c).ok())
            .collect();

        HiddenFilter {
            literal_depth,
            dot_patterns,
        }
    }

    fn allows(&self, path: &Path) -> bool {
        // glob hands back `dir/.` and `dir/..` for patterns like `.*`
        let raw = path.as_os_str().as_encoded_bytes();
        if raw.ends_with(b"/.") || raw.ends_with(b"/..") {
            return false;
        }
        path.components().skip(self.literal_depth).all(|component| {
            let Component::Normal(name) = component else {
                return true;
            };
            if name.as_encoded_bytes().first() != Some(&b'.') {
                return true;
            }
            let name = name.to_string_lossy();
            self.dot_patterns
                .iter()
                .any(|pattern| pattern.matches_with(&name, GLOB_OPTIONS))
        })
    }
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(pattern: &str) -> String {
    let rest = match pattern.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return pattern.to_string(),
    };
    match BaseDirs::new() {
        Some(base) => {
            let home = glob::Pattern::escape(&base.home_dir().to_string_lossy());
            format!("{}{}", home, rest)
        }
        None => pattern.to_string(),
    }
}
