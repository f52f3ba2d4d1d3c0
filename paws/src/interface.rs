//! Paws FFI Interface Definition
//!
//! This file defines the public interface exposed to the UI host via UniFFI.
//! It acts as the source of truth for shared types.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Clipboard snapshot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum EntryKind {
    Unknown,
    Text,
    Image,
    File,
}

impl EntryKind {
    /// Row title shown in the presenter header
    pub fn title(&self) -> &'static str {
        match self {
            EntryKind::Text => "Text",
            EntryKind::Image => "Image",
            EntryKind::File => "File",
            EntryKind::Unknown => "",
        }
    }
}

/// Visual theme of the desktop; only thumbnail borders depend on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, uniffi::Enum)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Keys the panel reacts to. Everything else is left to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PanelKey {
    Up,
    Down,
    /// Toggles focus between the row and its close button
    Tab,
    Enter,
    Return,
    Other,
}

/// Where a themed or supplied icon comes from
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum IconSource {
    /// Icon-theme name, resolved by the host
    Themed { name: String },
    /// Encoded bitmap supplied by the file manager
    Bitmap { png: Vec<u8> },
}

/// Row content, already reduced to what the host has to paint
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum ItemContent {
    Text { preview: String },
    Picture { image: RoundedImage },
    Icon { icon: FileIcon },
    Icons { icons: Vec<FileIcon> },
    Empty,
}

/// Structural notifications from the entry store
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum StoreChange {
    Inserted { row: u64 },
    Removed { row: u64 },
    Reset,
    /// Aggregate state changed (count, emptiness)
    DataChanged,
    /// An entry became the live clipboard content again
    Reborn,
}

/// Notifications from the list view and its presenters
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum ViewEvent {
    SelectionChanged { row: Option<u64> },
    InputGrabbed,
    InputReleased,
    RowsShifting { shifts: Vec<RowShift> },
    RowUpdated { view: ItemView },
    RowDestroyed { entry_id: u64 },
    RowClosing { animation: CloseAnimation },
    Scrolled { offset: f64 },
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Axis-aligned rectangle in panel content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, uniffi::Record)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Degenerate rectangle sitting on this one's center point
    pub fn collapsed(&self) -> Rect {
        Rect::new(self.x + self.width / 2.0, self.y + self.height / 2.0, 0.0, 0.0)
    }
}

/// Small icon drawn on top of a file icon (symlink, read-only, ...)
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct IconLayer {
    pub name: String,
    pub rect: Rect,
}

/// File icon with its corner emblems
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FileIcon {
    pub source: IconSource,
    /// Icon width in pixels; multi-file rows order icons by it
    pub size: u32,
    pub emblems: Vec<IconLayer>,
}

/// Scaled, rounded-corner PNG thumbnail
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct RoundedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Everything the host needs to paint one row
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct ItemView {
    pub entry_id: u64,
    pub row: u64,
    /// Top edge in content coordinates
    pub y: f64,
    pub title: String,
    pub time_label: String,
    pub time_visible: bool,
    pub close_visible: bool,
    pub close_focused: bool,
    pub content: ItemContent,
    pub content_enabled: bool,
    pub caption: String,
    pub background_alpha: u8,
    /// Materialized only to slide into view during a removal
    pub transient: bool,
}

/// One row moving up during the removal choreography
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct RowShift {
    pub entry_id: u64,
    pub row: u64,
    pub from_y: f64,
    pub to_y: f64,
    pub duration_ms: u64,
    pub transient: bool,
}

/// Fade and collapse played when a row's close button is used
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct CloseAnimation {
    pub entry_id: u64,
    pub from: Rect,
    pub to: Rect,
    pub from_opacity: f64,
    pub to_opacity: f64,
    pub duration_ms: u64,
}

/// Error type for Paws operations
#[derive(Debug, Error, uniffi::Error)]
pub enum PanelError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Encoding error: {0}")]
    Encode(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// FOREIGN INTERFACES
// ═══════════════════════════════════════════════════════════════════════════════

/// The external clipboard service (the daemon that owns the system clipboard).
#[uniffi::export(with_foreign)]
pub trait ClipboardLoader: Send + Sync {
    /// Whether the channel to the service is up
    fn is_valid(&self) -> bool;

    /// Start forwarding new snapshots to `ClipboardPanel::data_coming`
    fn subscribe(&self);

    /// Make the serialized entry the live clipboard content again
    fn data_reborned(&self, buffer: Vec<u8>);
}

/// Receives panel notifications. Called without any panel lock held, so
/// implementations may call back into the panel.
#[uniffi::export(with_foreign)]
pub trait PanelListener: Send + Sync {
    fn on_store_change(&self, change: StoreChange);

    fn on_view_event(&self, event: ViewEvent);
}

impl From<crate::codec::CodecError> for PanelError {
    fn from(e: crate::codec::CodecError) -> Self {
        PanelError::Encode(e.to_string())
    }
}
