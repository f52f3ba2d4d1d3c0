//! Core data models for Paws
//!
//! `ClipboardEntry` is the in-memory record of one clipboard snapshot. It is owned by
//! the `EntryStore`; everything else refers to it through its `EntryId`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use url::Url;

use crate::interface::EntryKind;

/// Store-assigned identity of an entry, never reused within one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntryId {
    fn from(raw: u64) -> Self {
        EntryId(raw)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Icon the file manager rendered when the files were copied
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileIconData {
    /// Encoded icon bitmap
    pub icon: Vec<u8>,
    /// Themed emblem names to draw in the icon's corners
    pub corner_icons: Vec<String>,
}

/// One clipboard snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    /// Assigned on insertion into a store
    pub id: Option<EntryId>,
    pub kind: EntryKind,
    pub text: String,
    /// File references, `file://` URLs or plain paths
    pub urls: Vec<String>,
    /// Encoded image bytes for image snapshots
    pub image: Option<Vec<u8>>,
    /// Per-URL icons supplied by the file manager (empty when not supplied)
    pub icons: Vec<FileIconData>,
    /// MIME type -> raw bytes, passed back verbatim on reborn
    pub formats: BTreeMap<String, Vec<u8>>,
    pub created_at: DateTime<Utc>,
    /// False once the referenced files are known to be gone
    pub enabled: bool,
}

impl ClipboardEntry {
    fn empty(kind: EntryKind) -> Self {
        Self {
            id: None,
            kind,
            text: String::new(),
            urls: Vec::new(),
            image: None,
            icons: Vec::new(),
            formats: BTreeMap::new(),
            created_at: Utc::now(),
            enabled: true,
        }
    }

    /// Create a text entry
    pub fn new_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut entry = Self::empty(EntryKind::Text);
        entry
            .formats
            .insert("text/plain".to_string(), text.as_bytes().to_vec());
        entry.text = text;
        entry
    }

    /// Create an image entry from encoded image bytes
    pub fn new_image(data: Vec<u8>) -> Self {
        let mut entry = Self::empty(EntryKind::Image);
        entry.formats.insert("image/png".to_string(), data.clone());
        entry.image = Some(data);
        entry
    }

    /// Create a file entry from one or more file references
    pub fn new_files<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entry = Self::empty(EntryKind::File);
        entry.urls = urls.into_iter().map(Into::into).collect();
        let uri_list = entry.urls.join("\r\n");
        entry
            .formats
            .insert("text/uri-list".to_string(), uri_list.into_bytes());
        entry
    }

    /// Override the creation time (snapshots carry their own timestamp)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Attach file-manager icons, one per URL
    pub fn with_icons(mut self, icons: Vec<FileIconData>) -> Self {
        self.icons = icons;
        self
    }

    /// Row title shown by the presenter
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Whether the file manager supplied an icon for every file
    pub fn has_supplied_icons(&self) -> bool {
        !self.urls.is_empty() && self.icons.len() == self.urls.len()
    }

    /// Local paths of the referenced files
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.urls.iter().map(|u| url_to_path(u)).collect()
    }

    /// True when at least one referenced file is still on disk
    pub fn any_file_exists(&self) -> bool {
        self.file_paths().iter().any(|p| p.exists())
    }
}

/// Convert a `file://` URL (or a plain path) to a local path
pub fn url_to_path(reference: &str) -> PathBuf {
    if let Ok(url) = Url::parse(reference) {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return path;
            }
        }
    }
    PathBuf::from(reference.strip_prefix("file://").unwrap_or(reference))
}

/// Last path component of a file reference, for captions
pub fn file_name(reference: &str) -> String {
    let path = url_to_path(reference);
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
