//! Raw ABI layer — `#[repr(C)]` records and entry-point signatures of the
//! CUE SDK.
//!
//! Everything here mirrors the vendor header exactly: fixed-size records,
//! fields in declared order, platform-native alignment. Decoded owned
//! counterparts live in [`crate::types`]; the two views are never conflated.
//!
//! ## Pointer lifetime
//!
//! The SDK owns every pointer it returns and documents no validity window.
//! Callers must copy values out into owned records at the moment of the call
//! and never retain a raw pointer past it. The [`crate::sdk`] layer does this
//! copy-out; nothing above it ever sees one of these pointers.

use std::os::raw::{c_char, c_int};

// ── Records ──

/// `CorsairDeviceInfo` — per-device metadata returned by
/// `CorsairGetDeviceInfo`.
///
/// `model` is a null-terminated byte string owned by the SDK.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CorsairDeviceInfo {
    pub device_type: c_int,
    pub model: *const c_char,
    pub physical_layout: c_int,
    pub logical_layout: c_int,
    pub caps_mask: c_int,
    pub leds_count: c_int,
}

/// `CorsairLedColor` — one LED id plus its color components (0-255 each).
///
/// Used in both directions: seeded with zeroed components as a query request,
/// and fully populated as a set request.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorsairLedColor {
    pub led_id: c_int,
    pub r: c_int,
    pub g: c_int,
    pub b: c_int,
}

/// `CorsairProtocolDetails` — version handshake result, returned by value.
///
/// Either version string may be null; `server_version` is null whenever the
/// CUE service is not running.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CorsairProtocolDetails {
    pub sdk_version: *const c_char,
    pub server_version: *const c_char,
    pub sdk_protocol_version: c_int,
    pub server_protocol_version: c_int,
    pub breaking_changes: bool,
}

/// `CorsairLedPosition` — physical layout metadata for one LED.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorsairLedPosition {
    pub led_id: c_int,
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
}

/// `CorsairLedPositions` — count + pointer pair describing an SDK-owned
/// array of [`CorsairLedPosition`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CorsairLedPositions {
    pub number_of_led: c_int,
    pub led_position: *const CorsairLedPosition,
}

// ── Entry-point signatures ──

pub type PerformProtocolHandshakeFn = unsafe extern "C" fn() -> CorsairProtocolDetails;
/// Shared shape of `CorsairRequestControl` and `CorsairReleaseControl`
/// (access mode in, success out).
pub type AccessControlFn = unsafe extern "C" fn(c_int) -> bool;
pub type GetDeviceCountFn = unsafe extern "C" fn() -> c_int;
/// Returns null for out-of-range indices.
pub type GetDeviceInfoFn = unsafe extern "C" fn(c_int) -> *const CorsairDeviceInfo;
pub type GetLedPositionsFn = unsafe extern "C" fn() -> *const CorsairLedPositions;
pub type GetLedPositionsByDeviceIndexFn =
    unsafe extern "C" fn(c_int) -> *const CorsairLedPositions;
/// `(device_index, size, leds_colors)` — populates the array in place.
pub type GetLedsColorsByDeviceIndexFn =
    unsafe extern "C" fn(c_int, c_int, *mut CorsairLedColor) -> bool;
/// `(device_index, size, leds_colors)` — stages colors without applying them.
pub type SetLedsColorsBufferByDeviceIndexFn =
    unsafe extern "C" fn(c_int, c_int, *const CorsairLedColor) -> bool;
pub type SetLedsColorsFlushBufferFn = unsafe extern "C" fn() -> bool;

// ── String decoding ──

/// Copy a null-terminated SDK string into an owned `String`.
///
/// Null pointers decode to an empty string (the SDK hands back null version
/// strings when its service is not running). Invalid UTF-8 decodes lossily.
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated byte string that
/// stays alive for the duration of this call.
pub unsafe fn cstr_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: caller guarantees `ptr` is a live null-terminated string.
    unsafe { std::ffi::CStr::from_ptr(ptr) }
        .to_string_lossy()
        .into_owned()
}
