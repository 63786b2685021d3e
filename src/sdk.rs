//! SDK boundary — the [`CueApi`] seam, the libloading-backed [`CueSdk`], and
//! an in-memory mock for tests.
//!
//! [`CueApi`] sits at the raw-record level: implementations hand back
//! [`crate::ffi`] values that have already been copied out of SDK-owned
//! memory (the only pointers that survive a call are the null-terminated
//! strings embedded in the records, which the caller must decode before
//! touching the SDK again). Everything typed and sorted happens above this
//! trait, in [`crate::controller`], so it is exercised identically against
//! the real library and the mock.

use std::ffi::OsStr;

use libloading::Library;

use crate::error::{CueError, Result};
use crate::ffi;

/// Default location of the vendor SDK, relative to the working directory.
pub const DEFAULT_LIBRARY_PATH: &str = "./CUESDK_2017.dll";

// ── Trait ──

/// The native entry points this crate depends on, one method per export.
///
/// Methods take `&self`: the SDK is internally stateful but every call is a
/// synchronous, one-shot invocation. Concurrent calls against one
/// implementation are undefined at the vendor level and must be serialized by
/// the caller.
pub trait CueApi {
    /// Version handshake; must be performed before any other call is trusted.
    fn perform_protocol_handshake(&self) -> ffi::CorsairProtocolDetails;
    /// Ask to become the lighting controller. `access_mode` 0 requests
    /// exclusive control; returns false when the SDK refuses.
    fn request_control(&self, access_mode: i32) -> bool;
    /// Give lighting control back to the SDK.
    fn release_control(&self, access_mode: i32) -> bool;
    /// Number of devices the SDK currently enumerates.
    fn device_count(&self) -> i32;
    /// Device metadata, or `None` when the SDK has no device at this index.
    fn device_info(&self, device_index: i32) -> Option<ffi::CorsairDeviceInfo>;
    /// LED position table, copied out of SDK memory in native order.
    /// `None` queries the global table, `Some(i)` one device's table.
    fn led_positions(&self, device_index: Option<i32>) -> Vec<ffi::CorsairLedPosition>;
    /// Bulk color query — populates `colors` in place (ids in, components
    /// out).
    fn leds_colors(&self, device_index: i32, colors: &mut [ffi::CorsairLedColor]) -> bool;
    /// Stage colors in the SDK's buffer without applying them.
    fn set_leds_colors_buffer(&self, device_index: i32, colors: &[ffi::CorsairLedColor]) -> bool;
    /// Apply all previously buffered color sets to the hardware.
    fn flush_buffer(&self) -> bool;
}

/// Borrowed implementations delegate, so tests can keep the mock and hand a
/// reference to the controller.
impl<T: CueApi + ?Sized> CueApi for &T {
    fn perform_protocol_handshake(&self) -> ffi::CorsairProtocolDetails {
        (**self).perform_protocol_handshake()
    }
    fn request_control(&self, access_mode: i32) -> bool {
        (**self).request_control(access_mode)
    }
    fn release_control(&self, access_mode: i32) -> bool {
        (**self).release_control(access_mode)
    }
    fn device_count(&self) -> i32 {
        (**self).device_count()
    }
    fn device_info(&self, device_index: i32) -> Option<ffi::CorsairDeviceInfo> {
        (**self).device_info(device_index)
    }
    fn led_positions(&self, device_index: Option<i32>) -> Vec<ffi::CorsairLedPosition> {
        (**self).led_positions(device_index)
    }
    fn leds_colors(&self, device_index: i32, colors: &mut [ffi::CorsairLedColor]) -> bool {
        (**self).leds_colors(device_index, colors)
    }
    fn set_leds_colors_buffer(&self, device_index: i32, colors: &[ffi::CorsairLedColor]) -> bool {
        (**self).set_leds_colors_buffer(device_index, colors)
    }
    fn flush_buffer(&self) -> bool {
        (**self).flush_buffer()
    }
}

// ── Dynamic library binding ──

/// The real SDK, loaded from a dynamic library.
///
/// Every export is resolved once at load time, so a missing symbol fails
/// construction instead of a later call. The function pointers stay valid
/// because `_library` lives as long as this struct and is dropped last.
#[derive(Debug)]
pub struct CueSdk {
    perform_protocol_handshake: ffi::PerformProtocolHandshakeFn,
    request_control: ffi::AccessControlFn,
    release_control: ffi::AccessControlFn,
    get_device_count: ffi::GetDeviceCountFn,
    get_device_info: ffi::GetDeviceInfoFn,
    get_led_positions: ffi::GetLedPositionsFn,
    get_led_positions_by_device_index: ffi::GetLedPositionsByDeviceIndexFn,
    get_leds_colors_by_device_index: ffi::GetLedsColorsByDeviceIndexFn,
    set_leds_colors_buffer_by_device_index: ffi::SetLedsColorsBufferByDeviceIndexFn,
    set_leds_colors_flush_buffer: ffi::SetLedsColorsFlushBufferFn,
    _library: Library,
}

/// Resolve one export and copy its function pointer out of the [`Library`].
///
/// # Safety
///
/// `T` must be the exact function-pointer type of the exported symbol.
unsafe fn sym<T: Copy>(library: &Library, name: &str) -> Result<T> {
    // SAFETY: forwarded from this function's contract.
    unsafe { library.get::<T>(name.as_bytes()) }
        .map(|symbol| *symbol)
        .map_err(|e| CueError::MissingSymbol(format!("{name}: {e}")))
}

impl CueSdk {
    /// Load the SDK from [`DEFAULT_LIBRARY_PATH`].
    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_LIBRARY_PATH)
    }

    /// Load the SDK from an explicit library path and resolve all exports.
    pub fn load(path: impl AsRef<OsStr>) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: loading a library runs its initializers; the vendor SDK is
        // the whole point of this crate and is trusted to initialize cleanly.
        let library = unsafe { Library::new(path) }
            .map_err(|e| CueError::LibraryLoad(format!("{}: {e}", path.to_string_lossy())))?;
        log::debug!("loaded CUE SDK from {}", path.to_string_lossy());

        // SAFETY: each type parameter matches the export's documented
        // signature (see ffi.rs).
        unsafe {
            Ok(CueSdk {
                perform_protocol_handshake: sym(&library, "CorsairPerformProtocolHandshake")?,
                request_control: sym(&library, "CorsairRequestControl")?,
                release_control: sym(&library, "CorsairReleaseControl")?,
                get_device_count: sym(&library, "CorsairGetDeviceCount")?,
                get_device_info: sym(&library, "CorsairGetDeviceInfo")?,
                get_led_positions: sym(&library, "CorsairGetLedPositions")?,
                get_led_positions_by_device_index: sym(
                    &library,
                    "CorsairGetLedPositionsByDeviceIndex",
                )?,
                get_leds_colors_by_device_index: sym(
                    &library,
                    "CorsairGetLedsColorsByDeviceIndex",
                )?,
                set_leds_colors_buffer_by_device_index: sym(
                    &library,
                    "CorsairSetLedsColorsBufferByDeviceIndex",
                )?,
                set_leds_colors_flush_buffer: sym(&library, "CorsairSetLedsColorsFlushBuffer")?,
                _library: library,
            })
        }
    }
}

impl CueApi for CueSdk {
    fn perform_protocol_handshake(&self) -> ffi::CorsairProtocolDetails {
        // SAFETY: resolved symbol with matching signature; no arguments.
        unsafe { (self.perform_protocol_handshake)() }
    }

    fn request_control(&self, access_mode: i32) -> bool {
        // SAFETY: resolved symbol with matching signature.
        unsafe { (self.request_control)(access_mode) }
    }

    fn release_control(&self, access_mode: i32) -> bool {
        // SAFETY: resolved symbol with matching signature.
        unsafe { (self.release_control)(access_mode) }
    }

    fn device_count(&self) -> i32 {
        // SAFETY: resolved symbol with matching signature.
        unsafe { (self.get_device_count)() }
    }

    fn device_info(&self, device_index: i32) -> Option<ffi::CorsairDeviceInfo> {
        // SAFETY: resolved symbol; the SDK returns null for indices it does
        // not know, which maps to None instead of a dereference.
        let ptr = unsafe { (self.get_device_info)(device_index) };
        if ptr.is_null() {
            return None;
        }
        // SAFETY: non-null SDK pointer to a live record; copied out before
        // any further SDK call can invalidate it.
        Some(unsafe { *ptr })
    }

    fn led_positions(&self, device_index: Option<i32>) -> Vec<ffi::CorsairLedPosition> {
        // SAFETY: resolved symbols with matching signatures.
        let ptr = unsafe {
            match device_index {
                Some(index) => (self.get_led_positions_by_device_index)(index),
                None => (self.get_led_positions)(),
            }
        };
        if ptr.is_null() {
            return Vec::new();
        }
        // SAFETY: non-null SDK pointer to a live count+array record. The
        // array is copied out in full before this call returns; the raw
        // pointers never escape.
        unsafe {
            let positions = &*ptr;
            if positions.led_position.is_null() || positions.number_of_led <= 0 {
                return Vec::new();
            }
            std::slice::from_raw_parts(positions.led_position, positions.number_of_led as usize)
                .to_vec()
        }
    }

    fn leds_colors(&self, device_index: i32, colors: &mut [ffi::CorsairLedColor]) -> bool {
        if colors.is_empty() {
            return true;
        }
        // SAFETY: resolved symbol; `colors` is a live mutable array of
        // exactly the length passed alongside it.
        unsafe {
            (self.get_leds_colors_by_device_index)(
                device_index,
                colors.len() as i32,
                colors.as_mut_ptr(),
            )
        }
    }

    fn set_leds_colors_buffer(&self, device_index: i32, colors: &[ffi::CorsairLedColor]) -> bool {
        if colors.is_empty() {
            return true;
        }
        // SAFETY: resolved symbol; `colors` is a live array of exactly the
        // length passed alongside it. The SDK copies it into its own buffer
        // before returning.
        unsafe {
            (self.set_leds_colors_buffer_by_device_index)(
                device_index,
                colors.len() as i32,
                colors.as_ptr(),
            )
        }
    }

    fn flush_buffer(&self) -> bool {
        // SAFETY: resolved symbol with matching signature; no arguments.
        unsafe { (self.set_leds_colors_flush_buffer)() }
    }
}

// ── Mock SDK for testing ──

/// In-memory stand-in implementing the same entry-point contract as the
/// vendor library.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::ffi::CString;

    struct MockDevice {
        model: CString,
        device_type: i32,
        caps_mask: i32,
        /// Positions in insertion order — deliberately NOT sorted, so tests
        /// can feed unsorted native orderings through the decode path.
        positions: Vec<ffi::CorsairLedPosition>,
    }

    /// Fake SDK backed by plain maps, with separate *buffered* and *applied*
    /// color state so flush semantics are observable from tests.
    pub struct MockSdk {
        devices: Vec<MockDevice>,
        sdk_version: CString,
        server_version: CString,
        /// Response for `request_control` (default: granted).
        pub grant_control: Cell<bool>,
        /// Recorded handshake count.
        pub handshakes: Cell<u32>,
        /// Recorded access modes passed to `request_control`.
        pub control_requests: RefCell<Vec<i32>>,
        /// Recorded access modes passed to `release_control`.
        pub control_releases: RefCell<Vec<i32>>,
        /// Colors staged via the buffer call, keyed by `(device, led_id)`.
        pub buffered: RefCell<HashMap<(i32, i32), (i32, i32, i32)>>,
        /// Colors visible on the "hardware" after a flush.
        pub applied: RefCell<HashMap<(i32, i32), (i32, i32, i32)>>,
        /// Recorded flush count.
        pub flushes: Cell<u32>,
    }

    impl Default for MockSdk {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockSdk {
        pub fn new() -> Self {
            MockSdk {
                devices: Vec::new(),
                sdk_version: CString::new("3.0.301").unwrap(),
                server_version: CString::new("3.10.125").unwrap(),
                grant_control: Cell::new(true),
                handshakes: Cell::new(0),
                control_requests: RefCell::new(Vec::new()),
                control_releases: RefCell::new(Vec::new()),
                buffered: RefCell::new(HashMap::new()),
                applied: RefCell::new(HashMap::new()),
                flushes: Cell::new(0),
            }
        }

        /// Add a fake device whose LED position table lists `led_ids` in the
        /// given (possibly unsorted) order.
        pub fn add_device(&mut self, model: &str, device_type: i32, led_ids: &[i32]) {
            let positions = led_ids
                .iter()
                .map(|&led_id| ffi::CorsairLedPosition {
                    led_id,
                    top: f64::from(led_id) * 10.0,
                    left: f64::from(led_id) * 4.0,
                    height: 6.0,
                    width: 6.0,
                })
                .collect();
            self.devices.push(MockDevice {
                model: CString::new(model).unwrap(),
                device_type,
                caps_mask: crate::types::CAPS_LIGHTING,
                positions,
            });
        }

        /// Applied (post-flush) color for one LED, if any.
        pub fn applied_color(&self, device_index: i32, led_id: i32) -> Option<(i32, i32, i32)> {
            self.applied.borrow().get(&(device_index, led_id)).copied()
        }

        /// Buffered (pre-flush) color for one LED, if any.
        pub fn buffered_color(&self, device_index: i32, led_id: i32) -> Option<(i32, i32, i32)> {
            self.buffered
                .borrow()
                .get(&(device_index, led_id))
                .copied()
        }

        fn device(&self, device_index: i32) -> Option<&MockDevice> {
            usize::try_from(device_index)
                .ok()
                .and_then(|index| self.devices.get(index))
        }
    }

    impl CueApi for MockSdk {
        fn perform_protocol_handshake(&self) -> ffi::CorsairProtocolDetails {
            self.handshakes.set(self.handshakes.get() + 1);
            ffi::CorsairProtocolDetails {
                sdk_version: self.sdk_version.as_ptr(),
                server_version: self.server_version.as_ptr(),
                sdk_protocol_version: 4,
                server_protocol_version: 4,
                breaking_changes: false,
            }
        }

        fn request_control(&self, access_mode: i32) -> bool {
            self.control_requests.borrow_mut().push(access_mode);
            self.grant_control.get()
        }

        fn release_control(&self, access_mode: i32) -> bool {
            self.control_releases.borrow_mut().push(access_mode);
            true
        }

        fn device_count(&self) -> i32 {
            self.devices.len() as i32
        }

        fn device_info(&self, device_index: i32) -> Option<ffi::CorsairDeviceInfo> {
            self.device(device_index).map(|d| ffi::CorsairDeviceInfo {
                device_type: d.device_type,
                model: d.model.as_ptr(),
                physical_layout: 1,
                logical_layout: 1,
                caps_mask: d.caps_mask,
                leds_count: d.positions.len() as i32,
            })
        }

        fn led_positions(&self, device_index: Option<i32>) -> Vec<ffi::CorsairLedPosition> {
            match device_index {
                Some(index) => self
                    .device(index)
                    .map(|d| d.positions.clone())
                    .unwrap_or_default(),
                // Global table: every device's LEDs, native order.
                None => self
                    .devices
                    .iter()
                    .flat_map(|d| d.positions.iter().copied())
                    .collect(),
            }
        }

        fn leds_colors(&self, device_index: i32, colors: &mut [ffi::CorsairLedColor]) -> bool {
            let applied = self.applied.borrow();
            for color in colors.iter_mut() {
                let (r, g, b) = applied
                    .get(&(device_index, color.led_id))
                    .copied()
                    .unwrap_or((0, 0, 0));
                color.r = r;
                color.g = g;
                color.b = b;
            }
            true
        }

        fn set_leds_colors_buffer(
            &self,
            device_index: i32,
            colors: &[ffi::CorsairLedColor],
        ) -> bool {
            let mut buffered = self.buffered.borrow_mut();
            for color in colors {
                buffered.insert((device_index, color.led_id), (color.r, color.g, color.b));
            }
            true
        }

        fn flush_buffer(&self) -> bool {
            self.flushes.set(self.flushes.get() + 1);
            let mut buffered = self.buffered.borrow_mut();
            self.applied.borrow_mut().extend(buffered.drain());
            true
        }
    }
}
