//! Item presenter
//!
//! Per-row view-model. A presenter holds only the `EntryId` of its entry and
//! looks the entry up in the store whenever it renders, so a presenter that
//! outlives its entry renders nothing instead of touching freed state.
//!
//! Rendering is a pure function of the entry and the render context. Calling
//! `render` twice yields the same caption, which keeps the "(file deleted)"
//! suffix from piling up.

use chrono::{DateTime, Local};
use tracing::warn;

use crate::config::PanelConfig;
use crate::interface::{
    CloseAnimation, EntryKind, FileIcon, IconSource, ItemContent, ItemView, Rect, Theme,
};
use crate::models::{file_name, url_to_path, ClipboardEntry, EntryId, FileIconData};
use crate::store::EntryStore;
use crate::thumbnail::{
    emblem_layers, file_emblems, generic_icon_name, image_dimensions, is_image_path,
    round_image, round_image_file, GENERIC_IMAGE_ICON,
};
use crate::time_label::relative_time_label_with_now;

/// Appended to captions of entries whose files are gone
pub const DELETED_SUFFIX: &str = " (file deleted)";

/// Multi-file rows show at most this many icons
const MAX_FILE_ICONS: usize = 3;

const ELLIPSIS: char = '…';

/// What rendering depends on besides the entry itself
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub config: &'a PanelConfig,
    pub theme: Theme,
    /// Reference point for the time label
    pub now: DateTime<Local>,
}

/// Outcome of a double-click or primary activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Hand the entry to `EntryStore::promote`
    Promote(EntryId),
    /// Entry is (now) disabled; caption re-rendered, nothing promoted
    Disabled,
    /// Entry left the store before the activation landed
    Missing,
    /// A removal holds the input grab; the row was not touched
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ItemPresenter {
    id: EntryId,
    row: usize,
    y: f64,
    transient: bool,
    hovered: bool,
    close_focus: bool,
    title: String,
    time_label: String,
    content: ItemContent,
    caption: String,
    content_enabled: bool,
}

impl ItemPresenter {
    pub fn new(entry: &ClipboardEntry, id: EntryId, row: usize, y: f64, ctx: RenderContext<'_>) -> Self {
        let mut presenter = Self {
            id,
            row,
            y,
            transient: false,
            hovered: false,
            close_focus: false,
            title: String::new(),
            time_label: String::new(),
            content: ItemContent::Empty,
            caption: String::new(),
            content_enabled: true,
        };
        presenter.render(entry, ctx);
        presenter
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn close_focused(&self) -> bool {
        self.close_focus
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn content(&self) -> &ItemContent {
        &self.content
    }

    pub fn content_enabled(&self) -> bool {
        self.content_enabled
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    /// Move to a new row slot
    pub fn place(&mut self, row: usize, y: f64) {
        self.row = row;
        self.y = y;
    }

    pub fn set_transient(&mut self, transient: bool) {
        self.transient = transient;
    }

    /// Recompute everything shown for the entry
    pub fn render(&mut self, entry: &ClipboardEntry, ctx: RenderContext<'_>) {
        self.title = entry.title().to_string();
        self.time_label = relative_time_label_with_now(entry.created_at, ctx.now);
        self.content = render_content(entry, ctx);
        self.caption = caption_for(entry, ctx.config);
        self.content_enabled = entry.enabled;
    }

    pub fn refresh_time(&mut self, entry: &ClipboardEntry, now: DateTime<Local>) {
        self.time_label = relative_time_label_with_now(entry.created_at, now);
    }

    /// Thumbnail borders follow the theme; text rows have nothing to redo.
    pub fn on_theme_changed(&mut self, entry: &ClipboardEntry, ctx: RenderContext<'_>) {
        if entry.kind != EntryKind::Text {
            self.content = render_content(entry, ctx);
        }
    }

    /// Hover state. Leaving the row also drops close-button focus.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
        if !hovered {
            self.close_focus = false;
        }
    }

    pub fn toggle_close_focus(&mut self) -> bool {
        self.close_focus = !self.close_focus;
        self.close_focus
    }

    pub fn focus_out(&mut self) {
        self.set_hovered(false);
    }

    /// Double-click or Enter without close focus.
    ///
    /// Files are checked lazily here: an entry whose files are all gone is
    /// disabled in the store instead of promoted.
    pub fn activate(&mut self, store: &mut EntryStore, ctx: RenderContext<'_>) -> Activation {
        let Some(entry) = store.get(self.id) else {
            return Activation::Missing;
        };

        if !entry.enabled {
            let entry = entry.clone();
            self.render(&entry, ctx);
            return Activation::Disabled;
        }

        if entry.kind == EntryKind::File && !entry.any_file_exists() {
            store.set_enabled(self.id, false);
            if let Some(entry) = store.get(self.id) {
                let entry = entry.clone();
                self.render(&entry, ctx);
            }
            return Activation::Disabled;
        }

        Activation::Promote(self.id)
    }

    /// Fade and collapse for the close button, starting from the row's
    /// current geometry.
    pub fn close(&self, config: &PanelConfig) -> CloseAnimation {
        let from = Rect::new(
            f64::from(config.item_margin),
            self.y,
            f64::from(config.item_width),
            f64::from(config.item_height),
        );
        CloseAnimation {
            entry_id: self.id.get(),
            from,
            to: from.collapsed(),
            from_opacity: 1.0,
            to_opacity: 0.0,
            duration_ms: config.animation_ms,
        }
    }

    pub fn view(&self, config: &PanelConfig) -> ItemView {
        ItemView {
            entry_id: self.id.get(),
            row: self.row as u64,
            y: self.y,
            title: self.title.clone(),
            time_label: self.time_label.clone(),
            time_visible: !self.hovered,
            close_visible: self.hovered,
            close_focused: self.close_focus,
            content: self.content.clone(),
            content_enabled: self.content_enabled,
            caption: self.caption.clone(),
            background_alpha: if self.hovered {
                config.hover_alpha
            } else {
                config.idle_alpha
            },
            transient: self.transient,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-specific content for an entry
pub fn render_content(entry: &ClipboardEntry, ctx: RenderContext<'_>) -> ItemContent {
    match entry.kind {
        EntryKind::Text => ItemContent::Text {
            preview: generate_preview(&entry.text, ctx.config.preview_chars as usize),
        },
        EntryKind::Image => match entry.image.as_deref() {
            Some(bytes) => rounded_picture(bytes, ctx).unwrap_or(ItemContent::Empty),
            None => ItemContent::Empty,
        },
        EntryKind::File => match entry.urls.len() {
            0 => ItemContent::Empty,
            1 => render_single_file(entry, ctx),
            _ => render_file_list(entry, ctx),
        },
        EntryKind::Unknown => ItemContent::Empty,
    }
}

fn rounded_picture(bytes: &[u8], ctx: RenderContext<'_>) -> Option<ItemContent> {
    let config = ctx.config;
    match round_image(
        bytes,
        config.pixmap_width,
        config.pixmap_height,
        config.corner_radius,
        ctx.theme,
    ) {
        Ok(image) => Some(ItemContent::Picture { image }),
        Err(e) => {
            warn!("Failed to render thumbnail: {}", e);
            None
        }
    }
}

fn render_single_file(entry: &ClipboardEntry, ctx: RenderContext<'_>) -> ItemContent {
    let config = ctx.config;
    let path = url_to_path(&entry.urls[0]);

    if entry.has_supplied_icons() {
        let data = &entry.icons[0];
        if is_image_path(&path) {
            // Supplied image previews are rounded and carry no emblems
            let stripped = FileIconData {
                icon: data.icon.clone(),
                corner_icons: Vec::new(),
            };
            return rounded_picture(&data.icon, ctx).unwrap_or_else(|| ItemContent::Icon {
                icon: supplied_icon(&stripped, config),
            });
        }
        return ItemContent::Icon {
            icon: supplied_icon(data, config),
        };
    }

    if is_image_path(&path) {
        return match round_image_file(
            &path,
            config.pixmap_width,
            config.pixmap_height,
            config.corner_radius,
            ctx.theme,
        ) {
            Ok(image) => ItemContent::Picture { image },
            Err(e) => {
                warn!("Falling back to generic image icon for {}: {}", path.display(), e);
                ItemContent::Icon {
                    icon: FileIcon {
                        source: IconSource::Themed {
                            name: GENERIC_IMAGE_ICON.to_string(),
                        },
                        size: config.file_icon_size,
                        emblems: Vec::new(),
                    },
                }
            }
        };
    }

    match themed_file_icon(&path, config) {
        Some(icon) => ItemContent::Icon { icon },
        None => ItemContent::Empty,
    }
}

fn render_file_list(entry: &ClipboardEntry, ctx: RenderContext<'_>) -> ItemContent {
    let config = ctx.config;
    let icons: Vec<FileIcon> = if entry.has_supplied_icons() {
        let mut icons: Vec<FileIcon> = entry
            .icons
            .iter()
            .take(MAX_FILE_ICONS)
            .map(|data| supplied_icon(data, config))
            .collect();
        icons.sort_by_key(|icon| icon.size);
        icons
    } else {
        entry
            .file_paths()
            .iter()
            .take(MAX_FILE_ICONS)
            .filter_map(|path| themed_file_icon(path, config))
            .collect()
    };

    if icons.is_empty() {
        ItemContent::Empty
    } else {
        ItemContent::Icons { icons }
    }
}

/// Icon handed over by the file manager, emblems in the corners
fn supplied_icon(data: &FileIconData, config: &PanelConfig) -> FileIcon {
    let size = image_dimensions(&data.icon)
        .map(|(w, _)| w.min(config.file_icon_size))
        .unwrap_or(config.file_icon_size);
    FileIcon {
        source: IconSource::Bitmap {
            png: data.icon.clone(),
        },
        size,
        emblems: emblem_layers(&data.corner_icons, size),
    }
}

/// Generic themed icon for a file still on disk
fn themed_file_icon(path: &std::path::Path, config: &PanelConfig) -> Option<FileIcon> {
    if !path.exists() && std::fs::symlink_metadata(path).is_err() {
        return None;
    }
    let size = config.file_icon_size;
    Some(FileIcon {
        source: IconSource::Themed {
            name: generic_icon_name(path).to_string(),
        },
        size,
        emblems: emblem_layers(&file_emblems(path), size),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// CAPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Caption line under the content, including the deleted-file suffix
pub fn caption_for(entry: &ClipboardEntry, config: &PanelConfig) -> String {
    let budget = config.caption_chars as usize;

    let base = match entry.kind {
        EntryKind::Text => format!("{} characters", entry.text.chars().count()),
        EntryKind::Image => entry
            .image
            .as_deref()
            .and_then(image_dimensions)
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_default(),
        EntryKind::File => match entry.urls.as_slice() {
            [] => String::new(),
            [only] => elide_middle(&file_name(only), budget),
            [first, ..] => elide_middle(
                &format!("{} files ({}...)", entry.urls.len(), file_name(first)),
                budget,
            ),
        },
        EntryKind::Unknown => String::new(),
    };

    if entry.enabled {
        base
    } else {
        let room = budget.saturating_sub(DELETED_SUFFIX.chars().count());
        format!("{}{}", elide_middle(&base, room), DELETED_SUFFIX)
    }
}

/// Shorten `text` to `max_chars` by replacing its middle with an ellipsis
pub fn elide_middle(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let keep = max_chars - 1;
    let tail = keep / 2;
    let head = keep - tail;

    let mut out: String = text.chars().take(head).collect();
    out.push(ELLIPSIS);
    out.extend(text.chars().skip(len - tail));
    out
}

/// Leading snippet with whitespace runs collapsed to single spaces
pub fn generate_preview(content: &str, max_chars: usize) -> String {
    let mut preview = String::with_capacity(max_chars.min(content.len()));
    let mut last_was_space = false;
    let mut count = 0;

    for ch in content.trim_start().chars() {
        let ch = match ch {
            '\n' | '\t' | '\r' => ' ',
            c => c,
        };
        if ch == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }

        if count == max_chars {
            preview.pop();
            preview.push(ELLIPSIS);
            break;
        }
        preview.push(ch);
        count += 1;
    }

    preview
}
