//! Decoded value records — owned Rust counterparts of the raw ABI records.
//!
//! Each type here is a plain value with an explicit decode constructor from
//! its [`crate::ffi`] counterpart. Decoding copies everything out of native
//! memory eagerly; no decoded value ever borrows from the SDK.

use serde::Serialize;

use crate::ffi;

// ── Device capabilities ──

/// Bit in [`DeviceInfo::caps_mask`] indicating the device supports lighting
/// control (as opposed to being informational only).
pub const CAPS_LIGHTING: i32 = 0x0001;

/// Device kind reported by the SDK.
///
/// Ids the SDK may grow in later revisions decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceType {
    Unknown,
    Mouse,
    Keyboard,
    Headset,
    MouseMat,
}

impl DeviceType {
    /// Decode the SDK's integer device-type id.
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => DeviceType::Mouse,
            2 => DeviceType::Keyboard,
            3 => DeviceType::Headset,
            4 => DeviceType::MouseMat,
            _ => DeviceType::Unknown,
        }
    }
}

// ── Device info ──

/// Decoded device metadata, captured once per query call.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub model: String,
    pub physical_layout: i32,
    pub logical_layout: i32,
    pub caps_mask: i32,
    pub leds_count: i32,
}

impl DeviceInfo {
    /// Decode a raw device-info record, copying the model string out of
    /// SDK-owned memory.
    ///
    /// # Safety
    ///
    /// `raw.model` must be null or point to a valid null-terminated string
    /// that stays alive for the duration of this call.
    pub unsafe fn from_raw(raw: &ffi::CorsairDeviceInfo) -> Self {
        DeviceInfo {
            device_type: DeviceType::from_id(raw.device_type),
            // SAFETY: forwarded from this function's contract.
            model: unsafe { ffi::cstr_lossy(raw.model) },
            physical_layout: raw.physical_layout,
            logical_layout: raw.logical_layout,
            caps_mask: raw.caps_mask,
            leds_count: raw.leds_count,
        }
    }

    /// Whether the device accepts lighting control at all.
    pub fn supports_lighting(&self) -> bool {
        self.caps_mask & CAPS_LIGHTING != 0
    }
}

// ── Protocol details ──

/// Version handshake result, stored on the controller for the session.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolDetails {
    pub sdk_version: String,
    pub server_version: String,
    pub sdk_protocol_version: i32,
    pub server_protocol_version: i32,
    pub breaking_changes: bool,
}

impl ProtocolDetails {
    /// Decode a raw handshake record, copying both version strings.
    ///
    /// Null version strings (CUE service not running) decode to empty
    /// strings; check `server_protocol_version != 0` to tell the cases apart.
    ///
    /// # Safety
    ///
    /// Both string fields of `raw` must be null or point to valid
    /// null-terminated strings alive for the duration of this call.
    pub unsafe fn from_raw(raw: &ffi::CorsairProtocolDetails) -> Self {
        ProtocolDetails {
            // SAFETY: forwarded from this function's contract.
            sdk_version: unsafe { ffi::cstr_lossy(raw.sdk_version) },
            // SAFETY: forwarded from this function's contract.
            server_version: unsafe { ffi::cstr_lossy(raw.server_version) },
            sdk_protocol_version: raw.sdk_protocol_version,
            server_protocol_version: raw.server_protocol_version,
            breaking_changes: raw.breaking_changes,
        }
    }
}

// ── LED color ──

/// One LED id plus its color, component range 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedColor {
    pub led_id: i32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    pub fn new(led_id: i32, r: u8, g: u8, b: u8) -> Self {
        LedColor { led_id, r, g, b }
    }

    /// Decode a raw color record. The SDK types components as `int`; values
    /// outside 0-255 are clamped.
    pub fn from_raw(raw: &ffi::CorsairLedColor) -> Self {
        LedColor {
            led_id: raw.led_id,
            r: raw.r.clamp(0, 255) as u8,
            g: raw.g.clamp(0, 255) as u8,
            b: raw.b.clamp(0, 255) as u8,
        }
    }

    /// Encode for a native set call.
    pub fn to_raw(self) -> ffi::CorsairLedColor {
        ffi::CorsairLedColor {
            led_id: self.led_id,
            r: i32::from(self.r),
            g: i32::from(self.g),
            b: i32::from(self.b),
        }
    }
}

// ── LED position ──

/// Physical layout metadata for one LED (coordinates and size, double
/// precision).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedPosition {
    pub led_id: i32,
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
}

impl From<ffi::CorsairLedPosition> for LedPosition {
    fn from(raw: ffi::CorsairLedPosition) -> Self {
        LedPosition {
            led_id: raw.led_id,
            top: raw.top,
            left: raw.left,
            height: raw.height,
            width: raw.width,
        }
    }
}

/// Decode a copied-out native position array into owned records,
/// **sorted ascending by `led_id`**.
///
/// The SDK makes no ordering promise; the sorted order is part of this
/// crate's contract, not an accident of native iteration order.
pub fn decode_led_positions(raw: &[ffi::CorsairLedPosition]) -> Vec<LedPosition> {
    let mut positions: Vec<LedPosition> = raw.iter().copied().map(LedPosition::from).collect();
    positions.sort_by_key(|p| p.led_id);
    positions
}
