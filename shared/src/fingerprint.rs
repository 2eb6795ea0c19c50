use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Serialize, Deserialize};

pub const FINGERPRINT_LENGTH: usize = 64;

/// Client-observable environment signals a device fingerprint is derived from.
///
/// Any signal the client could not read stays at its empty/zero default.
/// Field order is part of the derivation and must not change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceSignals {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    #[serde(rename = "timezone")]
    pub timezone_offset: i32,
    /// Data URL of a fixed string rasterized on a canvas.
    pub canvas: String,
    pub hardware_concurrency: u32,
}

impl DeviceSignals {
    /// Weak pseudo-identifier: base64 of the JSON-encoded signals, cut to
    /// [`FINGERPRINT_LENGTH`] characters. Identical configurations collide and
    /// a browser upgrade changes the value; neither is treated as an error.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut encoded = STANDARD.encode(json);
        encoded.truncate(FINGERPRINT_LENGTH);
        encoded
    }
}
