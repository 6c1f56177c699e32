//! Entry resolution and icon lookup.
//!
//! This module defines the capabilities the scanner and query engine use to
//! turn a filesystem path or a location URI into an [`IndexEntry`]. Keeping
//! them behind traits lets the host choose a resolver once at startup:
//!
//! - [`MetadataResolver`] stats every path and derives icons from file type
//! - [`PathResolver`] only looks at the path string and never fails for a
//!   non-empty input
//!
//! Icons go through a second capability, [`IconLookup`], so hosts with their
//! own icon theme support can plug it in.

use crate::error::{FindexError, Result};
use crate::types::{EntryKind, IconHandle, IndexEntry, VirtualLocation};
use directories::BaseDirs;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Icon name used for directories when no candidate resolves
pub const FOLDER_ICON: &str = "folder";
/// Icon name used for files when no candidate resolves
pub const GENERIC_FILE_ICON: &str = "text-x-generic";

const FILE_SCHEME: &str = "file://";

/// Resolves icon names to icon handles.
pub trait IconLookup: Send + Sync {
    /// Resolve a single icon name, or `None` if it is unknown.
    fn lookup(&self, name: &str) -> Option<IconHandle>;
}

/// Icon lookup that accepts every name as-is.
///
/// Suitable for hosts that draw themed icons by name themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct NamedIconLookup;

impl IconLookup for NamedIconLookup {
    fn lookup(&self, name: &str) -> Option<IconHandle> {
        if name.is_empty() {
            None
        } else {
            Some(IconHandle::new(name))
        }
    }
}

/// Icon lookup that searches icon theme directories for image files.
///
/// Each root is walked once, on the first lookup, into a name-to-file map.
/// Earlier roots win over later ones; within a root `svg` beats `png`
/// beats `xpm`.
pub struct ThemeIconLookup {
    roots: Vec<PathBuf>,
    names: Mutex<Option<HashMap<String, IconHandle>>>,
}

impl ThemeIconLookup {
    /// Image extensions, in preference order
    const EXTENSIONS: [&'static str; 3] = ["svg", "png", "xpm"];

    /// Create a lookup over explicit theme roots.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        ThemeIconLookup {
            roots,
            names: Mutex::new(None),
        }
    }

    /// Create a lookup over the usual per-user and system icon locations.
    pub fn system() -> Self {
        let mut roots = Vec::new();
        if let Some(base) = BaseDirs::new() {
            roots.push(base.data_dir().join("icons"));
            roots.push(base.home_dir().join(".icons"));
        }
        roots.push(PathBuf::from("/usr/local/share/icons"));
        roots.push(PathBuf::from("/usr/share/icons"));
        roots.push(PathBuf::from("/usr/share/pixmaps"));
        roots.retain(|root| root.is_dir());
        Self::new(roots)
    }

    fn build_names(&self) -> HashMap<String, IconHandle> {
        let mut names = HashMap::new();
        for root in &self.roots {
            for (name, path) in Self::walk_root(root) {
                names
                    .entry(name)
                    .or_insert_with(|| IconHandle::new(path.to_string_lossy()));
            }
        }
        info!(roots = self.roots.len(), icons = names.len(), "Icon themes loaded");
        names
    }

    /// Best file per icon name under one root.
    fn walk_root(root: &Path) -> HashMap<String, PathBuf> {
        let pattern = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));
        let Ok(paths) = glob::glob(&pattern) else {
            return HashMap::new();
        };

        let mut best: HashMap<String, (usize, PathBuf)> = HashMap::new();
        for path in paths.flatten() {
            let Some(rank) = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(|ext| Self::EXTENSIONS.iter().position(|known| *known == ext))
            else {
                continue;
            };
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match best.get(stem) {
                Some((held, _)) if *held <= rank => {}
                _ => {
                    best.insert(stem.to_string(), (rank, path));
                }
            }
        }
        best.into_iter().map(|(name, (_, path))| (name, path)).collect()
    }
}

impl IconLookup for ThemeIconLookup {
    fn lookup(&self, name: &str) -> Option<IconHandle> {
        if name.is_empty() {
            return None;
        }
        let mut names = self.names.lock();
        names
            .get_or_insert_with(|| self.build_names())
            .get(name)
            .cloned()
    }
}

impl fmt::Debug for ThemeIconLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeIconLookup")
            .field("roots", &self.roots)
            .field("loaded", &self.names.lock().is_some())
            .finish()
    }
}

/// Turns a path or URI into an [`IndexEntry`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`: the refresher thread and query
/// callers share one resolver.
pub trait EntryResolver: Send + Sync {
    /// Build an entry for a location URI or a path given as text.
    fn resolve(&self, path_or_uri: &str) -> Result<IndexEntry>;

    /// Build an entry for a filesystem path.
    ///
    /// Scans and directory listings come through here so names that are not
    /// valid UTF-8 reach the filesystem unchanged. The default goes through
    /// [`resolve`](Self::resolve) with a lossy string.
    fn resolve_path(&self, path: &Path) -> Result<IndexEntry> {
        self.resolve(&path.to_string_lossy())
    }

    /// Get the resolver name (e.g., "metadata", "path")
    fn name(&self) -> &'static str;
}

/// Which resolver the host wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
    /// [`MetadataResolver`]
    #[default]
    Metadata,

    /// [`PathResolver`]
    Path,
}

impl ResolverKind {
    /// Build the selected resolver around an icon lookup.
    pub fn build(self, icons: Arc<dyn IconLookup>) -> Arc<dyn EntryResolver> {
        match self {
            ResolverKind::Metadata => Arc::new(MetadataResolver::new(icons)),
            ResolverKind::Path => Arc::new(PathResolver::new(icons)),
        }
    }
}

impl FromStr for ResolverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metadata" => Ok(ResolverKind::Metadata),
            "path" => Ok(ResolverKind::Path),
            _ => Err(format!("Unknown resolver: {}", s)),
        }
    }
}

/// Resolver backed by filesystem metadata.
///
/// Paths that cannot be stat'ed are rejected, which makes the scanner skip
/// them. Icons are chosen from the file type and extension.
pub struct MetadataResolver {
    icons: Arc<dyn IconLookup>,
    trash_files: Option<PathBuf>,
}

impl MetadataResolver {
    /// Create a resolver using the given icon lookup.
    pub fn new(icons: Arc<dyn IconLookup>) -> Self {
        let trash_files = BaseDirs::new().map(|base| base.data_dir().join("Trash").join("files"));
        MetadataResolver { icons, trash_files }
    }

    fn resolve_virtual(&self, location: VirtualLocation) -> Result<IndexEntry> {
        let mut candidates = Vec::with_capacity(2);
        if location == VirtualLocation::Trash && self.trash_has_items() {
            candidates.push("user-trash-full");
        }
        candidates.push(location.icon_name());

        let icon = resolve_icon(self.icons.as_ref(), &candidates, false, false);
        let entry = IndexEntry::new(EntryKind::Virtual, location.uri(), "", location.title())?
            .with_icon(icon);
        Ok(entry)
    }

    fn trash_has_items(&self) -> bool {
        self.trash_files
            .as_deref()
            .and_then(|dir| fs::read_dir(dir).ok())
            .map_or(false, |mut entries| entries.next().is_some())
    }
}

impl EntryResolver for MetadataResolver {
    fn resolve(&self, path_or_uri: &str) -> Result<IndexEntry> {
        match Target::parse(path_or_uri)? {
            Target::Virtual(location) => self.resolve_virtual(location),
            Target::Path(path) => self.resolve_path(&path),
            Target::Uri(uri) => Err(FindexError::resolve(uri, "unsupported URI scheme")),
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<IndexEntry> {
        let metadata = fs::metadata(path)
            .map_err(|e| FindexError::resolve(path.to_string_lossy(), e.to_string()))?;
        let is_dir = metadata.is_dir();
        let candidates = if is_dir {
            vec!["inode-directory"]
        } else {
            file_icon_candidates(path)
        };

        let icon = resolve_icon(self.icons.as_ref(), &candidates, true, is_dir);
        path_entry(path, is_dir, icon)
    }

    fn name(&self) -> &'static str {
        "metadata"
    }
}

/// Minimal resolver that derives everything from the path string.
///
/// It only checks whether a path is a directory (for the icon and the
/// completion) and otherwise accepts any non-empty input, so a title can
/// always be derived from the basename.
pub struct PathResolver {
    icons: Arc<dyn IconLookup>,
}

impl PathResolver {
    /// Create a resolver using the given icon lookup.
    pub fn new(icons: Arc<dyn IconLookup>) -> Self {
        PathResolver { icons }
    }
}

impl EntryResolver for PathResolver {
    fn resolve(&self, path_or_uri: &str) -> Result<IndexEntry> {
        match Target::parse(path_or_uri)? {
            Target::Virtual(location) => {
                let icon = resolve_icon(self.icons.as_ref(), &[location.icon_name()], false, false);
                Ok(
                    IndexEntry::new(EntryKind::Virtual, location.uri(), "", location.title())?
                        .with_icon(icon),
                )
            }
            Target::Path(path) => self.resolve_path(&path),
            Target::Uri(uri) => {
                let title = uri_title(&uri);
                Ok(IndexEntry::new(EntryKind::Virtual, uri, "", title)?)
            }
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<IndexEntry> {
        if path.as_os_str().is_empty() {
            return Err(FindexError::resolve("", "empty path"));
        }
        let is_dir = path.is_dir();
        let icon = resolve_icon(self.icons.as_ref(), &[], true, is_dir);
        path_entry(path, is_dir, icon)
    }

    fn name(&self) -> &'static str {
        "path"
    }
}

/// What a resolver input refers to.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Virtual(VirtualLocation),
    Path(PathBuf),
    Uri(String),
}

impl Target {
    fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(FindexError::resolve(input, "empty path"));
        }
        if let Some(location) = VirtualLocation::from_uri(input) {
            return Ok(Target::Virtual(location));
        }
        if let Some(encoded) = input.strip_prefix(FILE_SCHEME) {
            let decoded = urlencoding::decode(encoded)
                .map_err(|e| FindexError::resolve(input, e.to_string()))?;
            return Ok(Target::Path(PathBuf::from(decoded.into_owned())));
        }
        if input.contains("://") && !Path::new(input).exists() {
            return Ok(Target::Uri(input.to_string()));
        }
        Ok(Target::Path(PathBuf::from(input)))
    }
}

/// Build a regular entry; only the title and path text are lossy.
fn path_entry(path: &Path, is_dir: bool, icon: Option<IconHandle>) -> Result<IndexEntry> {
    let entry = IndexEntry::new(
        EntryKind::Regular,
        file_uri(path),
        path.to_string_lossy(),
        display_name(path),
    )?
    .with_dir(is_dir)
    .with_icon(icon);
    Ok(entry)
}

/// Try each icon candidate, then fall back to a folder or generic file icon
/// for entries backed by a path.
fn resolve_icon(
    icons: &dyn IconLookup,
    candidates: &[&str],
    has_path: bool,
    is_dir: bool,
) -> Option<IconHandle> {
    if let Some(icon) = candidates
        .iter()
        .filter(|name| !name.is_empty())
        .find_map(|name| icons.lookup(name))
    {
        return Some(icon);
    }
    if !has_path {
        return None;
    }
    let fallback = if is_dir { FOLDER_ICON } else { GENERIC_FILE_ICON };
    debug!(fallback, "No icon candidate resolved");
    icons.lookup(fallback)
}

/// Icon names to try for a regular file, most specific first.
fn file_icon_candidates(path: &Path) -> Vec<&'static str> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let specific = match ext.as_str() {
        "txt" | "md" | "log" => Some("text-plain"),
        "pdf" => Some("application-pdf"),
        "html" | "htm" => Some("text-html"),
        "sh" | "py" | "rb" | "pl" => Some("text-x-script"),
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" => Some("image-x-generic"),
        "mp3" | "ogg" | "flac" | "wav" | "opus" => Some("audio-x-generic"),
        "mp4" | "mkv" | "webm" | "avi" | "mov" => Some("video-x-generic"),
        "zip" | "tar" | "gz" | "xz" | "bz2" | "7z" | "zst" => Some("package-x-generic"),
        "odt" | "doc" | "docx" => Some("x-office-document"),
        "ods" | "xls" | "xlsx" | "csv" => Some("x-office-spreadsheet"),
        _ => None,
    };

    specific.into_iter().chain([GENERIC_FILE_ICON]).collect()
}

/// Build a `file://` URI, percent-encoding every byte of each segment so
/// names that are not UTF-8 survive.
pub fn file_uri(path: &Path) -> String {
    let bytes = path.as_os_str().as_encoded_bytes();
    let encoded: Vec<_> = bytes.split(|b| *b == b'/').map(urlencoding::encode_binary).collect();
    format!("{}{}", FILE_SCHEME, encoded.join("/"))
}

/// Basename of a path, ignoring trailing separators. The root keeps its path.
fn display_name(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.to_string_lossy().into_owned(),
    }
}

/// Title for an unknown URI: its scheme, capitalized.
fn uri_title(uri: &str) -> String {
    let scheme = uri.split("://").next().unwrap_or(uri);
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Icon lookup that only knows a fixed set of names.
    struct KnownIcons(&'static [&'static str]);

    impl IconLookup for KnownIcons {
        fn lookup(&self, name: &str) -> Option<IconHandle> {
            self.0
                .iter()
                .any(|known| *known == name)
                .then(|| IconHandle::new(name))
        }
    }

    fn metadata_resolver(known: &'static [&'static str]) -> MetadataResolver {
        MetadataResolver::new(Arc::new(KnownIcons(known)))
    }

    #[test]
    fn test_file_uri_encoding() {
        assert_eq!(file_uri(Path::new("/home/u/doc.txt")), "file:///home/u/doc.txt");
        assert_eq!(file_uri(Path::new("/home/u/my doc.txt")), "file:///home/u/my%20doc.txt");
        assert_eq!(file_uri(Path::new("/tmp/a#b")), "file:///tmp/a%23b");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/home/u/Documents/")), "Documents");
        assert_eq!(display_name(Path::new("/home/u/a.txt")), "a.txt");
        assert_eq!(display_name(Path::new("/")), "/");
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            Target::parse("trash:///").unwrap(),
            Target::Virtual(VirtualLocation::Trash)
        );
        assert_eq!(
            Target::parse("file:///tmp/my%20doc").unwrap(),
            Target::Path(PathBuf::from("/tmp/my doc"))
        );
        assert_eq!(
            Target::parse("network:///").unwrap(),
            Target::Uri("network:///".to_string())
        );
        assert!(Target::parse("").is_err());
    }

    #[test]
    fn test_metadata_resolver_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();
        let path = file.to_string_lossy().into_owned();

        let resolver = metadata_resolver(&["text-plain"]);
        let entry = resolver.resolve(&path).unwrap();

        assert_eq!(entry.title(), "notes.txt");
        assert_eq!(entry.path(), path);
        assert_eq!(entry.uri(), file_uri(&file));
        assert_eq!(entry.kind(), EntryKind::Regular);
        assert!(!entry.is_dir());
        assert_eq!(entry.icon(), Some(&IconHandle::new("text-plain")));
    }

    #[test]
    fn test_metadata_resolver_dir_falls_back_to_folder_icon() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().into_owned();

        let resolver = metadata_resolver(&["folder"]);
        let entry = resolver.resolve(&path).unwrap();

        assert!(entry.is_dir());
        assert_eq!(entry.icon(), Some(&IconHandle::new("folder")));
    }

    #[test]
    fn test_metadata_resolver_rejects_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.txt");

        let resolver = metadata_resolver(&[]);
        let err = resolver.resolve(&missing.to_string_lossy()).unwrap_err();
        assert!(matches!(err, FindexError::ResolveError { .. }));
    }

    #[test]
    fn test_metadata_resolver_virtual() {
        let resolver = metadata_resolver(&["computer"]);
        let entry = resolver.resolve("computer:///").unwrap();

        assert_eq!(entry.kind(), EntryKind::Virtual);
        assert_eq!(entry.title(), "Computer");
        assert_eq!(entry.path(), "");
        assert_eq!(entry.icon(), Some(&IconHandle::new("computer")));

        // No fallback icon for virtual entries
        let entry = resolver.resolve("recent:///").unwrap();
        assert_eq!(entry.icon(), None);
    }

    #[test]
    fn test_path_resolver_never_fails_on_missing_path() {
        let resolver = PathResolver::new(Arc::new(NamedIconLookup));
        let entry = resolver.resolve("/definitely/not/here/report.pdf").unwrap();

        assert_eq!(entry.title(), "report.pdf");
        assert_eq!(entry.icon(), Some(&IconHandle::new(GENERIC_FILE_ICON)));
    }

    #[test]
    fn test_path_resolver_unknown_uri() {
        let resolver = PathResolver::new(Arc::new(NamedIconLookup));
        let entry = resolver.resolve("network:///").unwrap();

        assert_eq!(entry.title(), "Network");
        assert_eq!(entry.uri(), "network:///");
    }

    #[test]
    fn test_theme_icon_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let icon_dir = temp_dir.path().join("hicolor").join("48x48").join("places");
        fs::create_dir_all(&icon_dir).unwrap();
        fs::write(icon_dir.join("folder.png"), b"").unwrap();

        let lookup = ThemeIconLookup::new(vec![temp_dir.path().to_path_buf()]);
        let icon = lookup.lookup("folder").unwrap();
        assert!(icon.as_str().ends_with("folder.png"));
        assert!(lookup.lookup("user-trash").is_none());
        // Served from the map built on the first lookup
        assert_eq!(lookup.lookup("folder"), Some(icon));
    }

    #[test]
    fn test_theme_icon_lookup_preference() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let apps = first.path().join("hicolor").join("apps");
        fs::create_dir_all(&apps).unwrap();
        fs::write(apps.join("editor.png"), b"").unwrap();
        fs::write(apps.join("editor.svg"), b"").unwrap();
        fs::write(apps.join("editor.txt"), b"").unwrap();
        fs::write(second.path().join("editor.svg"), b"").unwrap();
        fs::write(second.path().join("viewer.xpm"), b"").unwrap();

        let lookup =
            ThemeIconLookup::new(vec![first.path().to_path_buf(), second.path().to_path_buf()]);

        let editor = lookup.lookup("editor").unwrap();
        assert_eq!(editor.as_str(), apps.join("editor.svg").to_string_lossy());
        let viewer = lookup.lookup("viewer").unwrap();
        assert!(viewer.as_str().ends_with("viewer.xpm"));
        assert!(lookup.lookup("").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join(OsStr::from_bytes(b"bad\xffname"));
        fs::write(&file, "").unwrap();

        let entry = metadata_resolver(&[]).resolve_path(&file).unwrap();
        assert_eq!(entry.title(), "bad\u{FFFD}name");
        assert!(entry.uri().ends_with("/bad%FFname"));

        let entry = PathResolver::new(Arc::new(NamedIconLookup))
            .resolve_path(&file)
            .unwrap();
        assert_eq!(entry.title(), "bad\u{FFFD}name");
    }

    #[test]
    fn test_resolver_kind_from_str() {
        assert_eq!("metadata".parse::<ResolverKind>().unwrap(), ResolverKind::Metadata);
        assert_eq!("PATH".parse::<ResolverKind>().unwrap(), ResolverKind::Path);
        assert!("gio".parse::<ResolverKind>().is_err());
    }
}
