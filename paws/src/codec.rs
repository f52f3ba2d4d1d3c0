//! Wire format shared with the clipboard service
//!
//! Snapshots arrive as a JSON document with binary fields in base64. The same
//! document shape goes back out on reborn, minus the icon list.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::interface::EntryKind;
use crate::models::{ClipboardEntry, FileIconData};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("timestamp out of range: {0}")]
    Timestamp(i64),
}

/// Byte payload carried as a base64 string
#[derive(Debug, Clone, Default, PartialEq)]
struct Base64Bytes(Vec<u8>);

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Base64Bytes)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireKind {
    Text,
    Image,
    File,
    #[serde(other)]
    Unknown,
}

impl From<WireKind> for EntryKind {
    fn from(kind: WireKind) -> Self {
        match kind {
            WireKind::Text => EntryKind::Text,
            WireKind::Image => EntryKind::Image,
            WireKind::File => EntryKind::File,
            WireKind::Unknown => EntryKind::Unknown,
        }
    }
}

impl From<EntryKind> for WireKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Text => WireKind::Text,
            EntryKind::Image => WireKind::Image,
            EntryKind::File => WireKind::File,
            EntryKind::Unknown => WireKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireIcon {
    icon: Base64Bytes,
    #[serde(default)]
    corner_icons: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_kind() -> WireKind {
    WireKind::Unknown
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireSnapshot {
    #[serde(default)]
    formats: BTreeMap<String, Base64Bytes>,
    #[serde(default = "default_kind")]
    kind: WireKind,
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    image: Option<Base64Bytes>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    text: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    time: Option<i64>,
    #[serde(default)]
    icons: Vec<WireIcon>,
}

/// Decode an inbound snapshot buffer.
///
/// Unrecognized kinds decode successfully as `EntryKind::Unknown`; the store is
/// what refuses them. A missing timestamp means "now".
pub fn decode_snapshot(buffer: &[u8]) -> Result<ClipboardEntry, CodecError> {
    let wire: WireSnapshot = serde_json::from_slice(buffer)?;

    let created_at = match wire.time {
        Some(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(CodecError::Timestamp(millis))?,
        None => Utc::now(),
    };

    Ok(ClipboardEntry {
        id: None,
        kind: wire.kind.into(),
        text: wire.text,
        urls: wire.urls,
        image: wire.image.map(|b| b.0),
        icons: wire
            .icons
            .into_iter()
            .map(|i| FileIconData {
                icon: i.icon.0,
                corner_icons: i.corner_icons,
            })
            .collect(),
        formats: wire.formats.into_iter().map(|(k, v)| (k, v.0)).collect(),
        created_at,
        enabled: wire.enabled,
    })
}

fn to_wire(entry: &ClipboardEntry, icons: Vec<WireIcon>) -> WireSnapshot {
    WireSnapshot {
        formats: entry
            .formats
            .iter()
            .map(|(k, v)| (k.clone(), Base64Bytes(v.clone())))
            .collect(),
        kind: entry.kind.into(),
        urls: entry.urls.clone(),
        image: entry.image.clone().map(Base64Bytes),
        enabled: entry.enabled,
        text: entry.text.clone(),
        time: Some(entry.created_at.timestamp_millis()),
        icons,
    }
}

/// Encode an entry as a full snapshot, icons included
pub fn encode_snapshot(entry: &ClipboardEntry) -> Result<Vec<u8>, CodecError> {
    let icons = entry
        .icons
        .iter()
        .map(|i| WireIcon {
            icon: Base64Bytes(i.icon.clone()),
            corner_icons: i.corner_icons.clone(),
        })
        .collect();
    Ok(serde_json::to_vec(&to_wire(entry, icons))?)
}

/// Encode the buffer handed to `ClipboardLoader::data_reborned`.
///
/// Carries the full payload but an empty icon list; the file manager
/// regenerates icons on the next copy.
pub fn encode_reborn(entry: &ClipboardEntry) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(&to_wire(entry, Vec::new()))?)
}
