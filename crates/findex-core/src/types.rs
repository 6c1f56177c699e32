//! Core data types for Findex.
//!
//! This module defines the entry model stored in the index. Entries are:
//!
//! - **Immutable**: every field is fixed at construction
//! - **Shareable**: snapshots hand them out as `Arc<IndexEntry>`
//! - **Self-describing**: an entry carries everything a host needs to
//!   display and open it

use crate::error::{FindexError, Result};
use std::fmt;
use std::path::MAIN_SEPARATOR;

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Found by expanding a configured glob pattern
    Regular,

    /// One of the fixed, non-scanned special locations
    Virtual,
}

/// The special locations appended to every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualLocation {
    /// The "computer" overview of drives and mounts
    Computer,

    /// Recently used documents
    Recent,

    /// The user's trash
    Trash,
}

impl VirtualLocation {
    /// All virtual locations, in the order they are appended to the index.
    pub const ALL: [VirtualLocation; 3] = [
        VirtualLocation::Computer,
        VirtualLocation::Recent,
        VirtualLocation::Trash,
    ];

    /// The fixed URI identifying this location
    pub fn uri(&self) -> &'static str {
        match self {
            VirtualLocation::Computer => "computer:///",
            VirtualLocation::Recent => "recent:///",
            VirtualLocation::Trash => "trash:///",
        }
    }

    /// Display title used when no richer metadata is available
    pub fn title(&self) -> &'static str {
        match self {
            VirtualLocation::Computer => "Computer",
            VirtualLocation::Recent => "Recent",
            VirtualLocation::Trash => "Trash",
        }
    }

    /// Icon name to try when the resolver cannot derive one
    pub fn icon_name(&self) -> &'static str {
        match self {
            VirtualLocation::Computer => "computer",
            VirtualLocation::Recent => "document-open-recent",
            VirtualLocation::Trash => "user-trash",
        }
    }

    /// Look up a virtual location by its URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|loc| loc.uri() == uri)
    }
}

impl fmt::Display for VirtualLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

/// An opaque, resolved icon reference.
///
/// Depending on the icon lookup in use this is either an icon file path or
/// a themed icon name the host knows how to draw.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconHandle(pub String);

impl IconHandle {
    /// Create a new icon handle
    pub fn new(handle: impl Into<String>) -> Self {
        IconHandle(handle.into())
    }

    /// Get the handle as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IconHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One indexable location: a file, a directory, or a virtual location.
///
/// ## Design Notes
///
/// - Fields are private; the entry cannot change once built
/// - `title_lower` is pre-computed for case-insensitive matching
/// - `is_dir` is captured when the entry is built and drives `completion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    uri: String,
    path: String,
    title: String,
    title_lower: String,
    icon: Option<IconHandle>,
    kind: EntryKind,
    is_dir: bool,
}

impl IndexEntry {
    /// Create a new entry.
    ///
    /// An empty `title` falls back to the `uri`; an empty `uri` is rejected.
    pub fn new(
        kind: EntryKind,
        uri: impl Into<String>,
        path: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self> {
        let uri = uri.into();
        let path = path.into();
        if uri.is_empty() {
            return Err(FindexError::resolve(path, "entry has no URI"));
        }

        let mut title = title.into();
        if title.is_empty() {
            title = uri.clone();
        }
        let title_lower = title.to_lowercase();

        Ok(IndexEntry {
            uri,
            path,
            title,
            title_lower,
            icon: None,
            kind,
            is_dir: false,
        })
    }

    /// Attach an icon
    pub fn with_icon(mut self, icon: Option<IconHandle>) -> Self {
        self.icon = icon;
        self
    }

    /// Mark whether the entry's path is a directory
    pub fn with_dir(mut self, is_dir: bool) -> Self {
        self.is_dir = is_dir;
        self
    }

    /// Canonical URI, e.g. `file:///home/u/doc.txt` or `trash:///`
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Local filesystem path, empty for virtual entries
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Human-readable display name
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Lower-cased title used for matching
    pub fn title_lower(&self) -> &str {
        &self.title_lower
    }

    /// Resolved icon, if any
    pub fn icon(&self) -> Option<&IconHandle> {
        self.icon.as_ref()
    }

    /// Where the entry came from
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// True if the entry's path was a directory when it was built
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Text to complete the query with when the entry is selected.
    ///
    /// Directories get a trailing separator so the next keystroke lists
    /// their contents.
    pub fn completion(&self) -> String {
        if self.path.is_empty() {
            return self.title.clone();
        }
        if self.is_dir && !self.path.ends_with(MAIN_SEPARATOR) {
            return format!("{}{}", self.path, MAIN_SEPARATOR);
        }
        self.path.clone()
    }

    /// Secondary display line: the path if there is one, else the URI.
    pub fn subtext(&self) -> &str {
        if self.path.is_empty() {
            &self.uri
        } else {
            &self.path
        }
    }

    /// Find the character offset of `needle_lower` in the lower-cased title.
    pub fn match_position(&self, needle_lower: &str) -> Option<usize> {
        char_position(&self.title_lower, needle_lower)
    }
}

/// Character offset of the first occurrence of `needle` in `haystack`.
pub fn char_position(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

impl fmt::Display for IndexEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IndexEntry(title={:?}, uri={:?})", self.title, self.uri)
    }
}
