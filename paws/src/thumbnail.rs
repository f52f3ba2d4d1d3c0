//! Thumbnails and file icons
//!
//! Image rows get a scaled, rounded-corner PNG with a one pixel border in the
//! theme's base color. File rows get an icon (themed name or the bitmap the
//! file manager supplied) plus emblems laid out at the base icon's corners.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::interface::{IconLayer, Rect, RoundedImage, Theme};

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("image codec: {0}")]
    Image(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub const EMBLEM_SYMLINK: &str = "emblem-symbolic-link";
pub const EMBLEM_READONLY: &str = "emblem-readonly";
pub const EMBLEM_UNREADABLE: &str = "emblem-unreadable";
pub const GENERIC_IMAGE_ICON: &str = "image-x-generic";

/// Border color drawn around rounded thumbnails
pub fn border_color(theme: Theme) -> Rgba<u8> {
    match theme {
        Theme::Light => Rgba([255, 255, 255, 255]),
        Theme::Dark => Rgba([40, 40, 40, 255]),
    }
}

/// Emblem slots around a base icon, in fill order: bottom-right,
/// bottom-left, top-left, top-right.
///
/// Each slot is centered one eighth of the base width in from its corner,
/// with coordinates floored to whole pixels.
pub fn corner_rects(base: &Rect, corner_width: f64, corner_height: f64) -> [Rect; 4] {
    let offset = (base.width / 8.0).trunc();
    let half_w = corner_width / 2.0;
    let half_h = corner_height / 2.0;

    let right_x = (base.right() - offset - half_w).floor();
    let bottom_y = (base.bottom() - offset - half_h).floor();
    let left_x = (base.left() + offset - half_w).floor();
    let top_y = (base.top() + offset - half_h).floor();

    [
        Rect::new(right_x, bottom_y, corner_width, corner_height),
        Rect::new(left_x, bottom_y, corner_width, corner_height),
        Rect::new(left_x, top_y, corner_width, corner_height),
        Rect::new(right_x, top_y, corner_width, corner_height),
    ]
}

/// Place up to four emblems on a square icon of `base_size` pixels
pub fn emblem_layers<S: AsRef<str>>(names: &[S], base_size: u32) -> Vec<IconLayer> {
    let corner = f64::from(base_size / 4);
    let base = Rect::new(0.0, 0.0, f64::from(base_size), f64::from(base_size));
    corner_rects(&base, corner, corner)
        .into_iter()
        .zip(names)
        .map(|(rect, name)| IconLayer {
            name: name.as_ref().to_string(),
            rect,
        })
        .collect()
}

/// Emblems describing a file's state on disk
pub fn file_emblems(path: &Path) -> Vec<&'static str> {
    let mut emblems = Vec::new();

    if fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
    {
        emblems.push(EMBLEM_SYMLINK);
    }

    match fs::metadata(path) {
        Ok(meta) => {
            if meta.permissions().readonly() {
                emblems.push(EMBLEM_READONLY);
            }
            let readable = if meta.is_dir() {
                fs::read_dir(path).is_ok()
            } else {
                fs::File::open(path).is_ok()
            };
            if !readable {
                emblems.push(EMBLEM_UNREADABLE);
            }
        }
        Err(_) => emblems.push(EMBLEM_UNREADABLE),
    }

    emblems
}

/// Whether the extension names an image format this crate can decode
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|f| f.reading_enabled())
        .unwrap_or(false)
}

/// Themed generic icon for a path, picked from its extension
pub fn generic_icon_name(path: &Path) -> &'static str {
    if path.is_dir() {
        return "folder";
    }
    if ImageFormat::from_path(path).is_ok() {
        return GENERIC_IMAGE_ICON;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" | "ogg" | "flac" | "wav" | "m4a" | "opus" => "audio-x-generic",
        "mp4" | "mkv" | "webm" | "avi" | "mov" => "video-x-generic",
        "zip" | "tar" | "gz" | "xz" | "bz2" | "7z" | "rar" | "zst" => "package-x-generic",
        "pdf" | "doc" | "docx" | "odt" | "rtf" => "x-office-document",
        "xls" | "xlsx" | "ods" | "csv" => "x-office-spreadsheet",
        "ppt" | "pptx" | "odp" => "x-office-presentation",
        "html" | "htm" => "text-html",
        "sh" | "py" | "rb" | "pl" => "text-x-script",
        _ => "text-x-generic",
    }
}

/// Pixel dimensions of an encoded image, if it decodes
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::load_from_memory(bytes).ok().map(|img| img.dimensions())
}

fn is_outside_or_border(x: u32, y: u32, width: u32, height: u32, radius: f64) -> (bool, bool) {
    let px = f64::from(x) + 0.5;
    let py = f64::from(y) + 0.5;
    let w = f64::from(width);
    let h = f64::from(height);

    let cx = if px < radius {
        Some(radius)
    } else if px > w - radius {
        Some(w - radius)
    } else {
        None
    };
    let cy = if py < radius {
        Some(radius)
    } else if py > h - radius {
        Some(h - radius)
    } else {
        None
    };

    if let (Some(cx), Some(cy)) = (cx, cy) {
        let dist = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        return (dist > radius, dist > radius - 1.0);
    }

    let edge = x == 0 || y == 0 || x + 1 == width || y + 1 == height;
    (false, edge)
}

fn apply_rounded_border(img: &mut RgbaImage, radius: f64, border: Rgba<u8>) {
    let (width, height) = img.dimensions();
    let radius = radius.min(f64::from(width.min(height)) / 2.0);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        match is_outside_or_border(x, y, width, height, radius) {
            (true, _) => *pixel = Rgba([0, 0, 0, 0]),
            (false, true) => *pixel = border,
            (false, false) => {}
        }
    }
}

/// Scale an encoded image down to fit `box_width` x `box_height`, round its
/// corners and frame it with the theme border. Small images keep their size.
pub fn round_image(
    bytes: &[u8],
    box_width: u32,
    box_height: u32,
    radius: u32,
    theme: Theme,
) -> Result<RoundedImage, ThumbnailError> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let scaled = if width > box_width || height > box_height {
        decoded.resize(box_width, box_height, FilterType::Triangle)
    } else {
        decoded
    };

    let mut rgba = scaled.to_rgba8();
    apply_rounded_border(&mut rgba, f64::from(radius), border_color(theme));
    let (width, height) = rgba.dimensions();

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(rgba).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(RoundedImage { png, width, height })
}

/// `round_image` for a file on disk
pub fn round_image_file(
    path: &Path,
    box_width: u32,
    box_height: u32,
    radius: u32,
    theme: Theme,
) -> Result<RoundedImage, ThumbnailError> {
    let bytes = fs::read(path)?;
    round_image(&bytes, box_width, box_height, radius, theme)
}
