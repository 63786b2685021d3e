//! Controller — handshake, control acquisition, and typed query/set
//! operations over a [`CueApi`] implementation.
//!
//! Construction sequences the SDK's startup contract: load → protocol
//! handshake → control request. Every operation afterwards is a direct,
//! synchronous, one-shot native call.
//!
//! ## Concurrency contract
//!
//! The vendor library keeps process-global state and documents no thread
//! safety. Use one `Controller` per process and serialize access externally;
//! concurrent calls against the same instance are undefined at the vendor
//! level.

use std::collections::BTreeMap;
use std::ffi::OsStr;

use crate::error::Result;
use crate::ffi;
use crate::sdk::{CueApi, CueSdk};
use crate::types::{DeviceInfo, LedColor, LedPosition, ProtocolDetails, decode_led_positions};

/// Stateful handle over the CUE SDK.
///
/// Holds the handshake result for the lifetime of the session and releases
/// lighting control deterministically on drop.
pub struct Controller<A: CueApi = CueSdk> {
    api: A,
    protocol: ProtocolDetails,
    access_mode: i32,
    has_control: bool,
}

impl Controller<CueSdk> {
    /// Load the SDK from its default path, perform the handshake and request
    /// lighting control.
    ///
    /// `priority` is forwarded verbatim as the SDK's access-mode argument
    /// (`false` → 0, exclusive control), matching the vendor calling
    /// convention.
    ///
    /// Fails only when the library or one of its exports is missing; a
    /// refused control request is non-fatal and observable via
    /// [`has_control`](Controller::has_control).
    pub fn new(priority: bool) -> Result<Self> {
        Self::start(CueSdk::load_default()?, priority)
    }

    /// Same as [`new`](Controller::new) with an explicit library path.
    pub fn with_library(path: impl AsRef<OsStr>, priority: bool) -> Result<Self> {
        Self::start(CueSdk::load(path)?, priority)
    }
}

impl<A: CueApi> Controller<A> {
    /// Run the startup sequence over any [`CueApi`] implementation.
    pub fn start(api: A, priority: bool) -> Result<Self> {
        let raw = api.perform_protocol_handshake();
        // SAFETY: the record was just returned by the handshake call; its
        // string pointers are still live and are copied out here, before any
        // further SDK call.
        let protocol = unsafe { ProtocolDetails::from_raw(&raw) };
        log::debug!(
            "CUE handshake: sdk {} (protocol {}), server {} (protocol {})",
            protocol.sdk_version,
            protocol.sdk_protocol_version,
            protocol.server_version,
            protocol.server_protocol_version,
        );
        if protocol.breaking_changes {
            log::warn!(
                "CUE SDK and server protocols have breaking changes ({} vs {})",
                protocol.sdk_protocol_version,
                protocol.server_protocol_version,
            );
        }

        let access_mode = i32::from(priority);
        let has_control = api.request_control(access_mode);
        if !has_control {
            log::warn!("CUE SDK refused lighting control (access mode {access_mode})");
        }

        Ok(Controller {
            api,
            protocol,
            access_mode,
            has_control,
        })
    }

    /// Handshake result captured at construction.
    pub fn protocol_details(&self) -> &ProtocolDetails {
        &self.protocol
    }

    /// Whether the SDK granted lighting control at construction.
    ///
    /// Set operations against a controller without control are forwarded
    /// anyway; the SDK decides what they do.
    pub fn has_control(&self) -> bool {
        self.has_control
    }

    // ── Device queries ──

    /// Number of devices the SDK currently enumerates.
    pub fn device_count(&self) -> i32 {
        self.api.device_count()
    }

    /// Decoded metadata for one device, or `None` when no device exists at
    /// this index (out of range or negative).
    pub fn device_info(&self, device_index: i32) -> Option<DeviceInfo> {
        let raw = self.api.device_info(device_index)?;
        // SAFETY: the record was just copied out of the SDK; its model
        // pointer is still live and is decoded here, before any further SDK
        // call.
        Some(unsafe { DeviceInfo::from_raw(&raw) })
    }

    /// Model name for one device.
    pub fn device_model(&self, device_index: i32) -> Option<String> {
        self.device_info(device_index).map(|info| info.model)
    }

    /// Model names for every enumerated device, keyed by device index.
    pub fn device_models(&self) -> BTreeMap<i32, String> {
        (0..self.device_count())
            .filter_map(|index| Some((index, self.device_model(index)?)))
            .collect()
    }

    // ── LED queries ──

    /// LED position table, sorted ascending by `led_id`.
    ///
    /// `None` queries the global table, `Some(i)` one device's table.
    pub fn led_positions(&self, device_index: Option<i32>) -> Vec<LedPosition> {
        decode_led_positions(&self.api.led_positions(device_index))
    }

    /// LED ids, the `led_id` projection of [`led_positions`]
    /// (same sorted order).
    ///
    /// [`led_positions`]: Controller::led_positions
    pub fn led_ids(&self, device_index: Option<i32>) -> Vec<i32> {
        self.led_positions(device_index)
            .iter()
            .map(|p| p.led_id)
            .collect()
    }

    /// Number of LEDs in the global or per-device position table.
    pub fn led_count(&self, device_index: Option<i32>) -> usize {
        self.led_positions(device_index).len()
    }

    /// Current colors of the given LEDs, in input order.
    ///
    /// Builds a request array seeded with the ids and zeroed components and
    /// hands it to the SDK's bulk query to populate.
    pub fn led_colors(&self, device_index: i32, led_ids: &[i32]) -> Vec<LedColor> {
        let mut raw: Vec<ffi::CorsairLedColor> = led_ids
            .iter()
            .map(|&led_id| ffi::CorsairLedColor {
                led_id,
                r: 0,
                g: 0,
                b: 0,
            })
            .collect();
        if !self.api.leds_colors(device_index, &mut raw) {
            log::debug!("CUE SDK color query failed for device {device_index}");
        }
        raw.iter().map(LedColor::from_raw).collect()
    }

    /// Current color of a single LED.
    pub fn led_color(&self, device_index: i32, led_id: i32) -> Option<LedColor> {
        self.led_colors(device_index, &[led_id]).into_iter().next()
    }

    // ── LED updates ──

    /// Buffer a single LED color. Takes effect after [`flush`].
    ///
    /// [`flush`]: Controller::flush
    pub fn set_led(&self, device_index: i32, led_id: i32, (r, g, b): (u8, u8, u8)) -> bool {
        self.update_leds(device_index, &[LedColor::new(led_id, r, g, b)])
    }

    /// Buffer a batch of LED colors without applying them. Returns the SDK's
    /// own success flag, untouched.
    pub fn update_leds(&self, device_index: i32, colors: &[LedColor]) -> bool {
        let raw: Vec<ffi::CorsairLedColor> = colors.iter().map(|c| c.to_raw()).collect();
        self.api.set_leds_colors_buffer(device_index, &raw)
    }

    /// Apply all buffered color updates to the hardware. A no-op when
    /// nothing is buffered.
    pub fn flush(&self) -> bool {
        self.api.flush_buffer()
    }
}

impl<A: CueApi> Drop for Controller<A> {
    /// Give lighting control back to the SDK when the session ends.
    fn drop(&mut self) {
        if self.has_control {
            let released = self.api.release_control(self.access_mode);
            log::debug!("released CUE lighting control (accepted: {released})");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::mock::MockSdk;

    fn sdk_with_keyboard() -> MockSdk {
        let mut sdk = MockSdk::new();
        sdk.add_device("K70 RGB", 2, &[3, 1, 2]);
        sdk
    }

    // ── Startup sequence ──

    #[test]
    fn start_performs_handshake_once_and_stores_details() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        assert_eq!(sdk.handshakes.get(), 1);
        let details = controller.protocol_details();
        assert_eq!(details.sdk_version, "3.0.301");
        assert_eq!(details.server_version, "3.10.125");
        assert_eq!(details.sdk_protocol_version, 4);
        assert!(!details.breaking_changes);
    }

    #[test]
    fn start_requests_control_with_priority_flag() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, true).unwrap();
        assert!(controller.has_control());
        assert_eq!(*sdk.control_requests.borrow(), vec![1]);
    }

    #[test]
    fn start_without_priority_requests_mode_zero() {
        let sdk = sdk_with_keyboard();
        let _controller = Controller::start(&sdk, false).unwrap();
        assert_eq!(*sdk.control_requests.borrow(), vec![0]);
    }

    #[test]
    fn refused_control_is_observable_not_fatal() {
        let sdk = sdk_with_keyboard();
        sdk.grant_control.set(false);
        let controller = Controller::start(&sdk, false).unwrap();
        assert!(!controller.has_control());
        // Queries still work without control.
        assert_eq!(controller.device_count(), 1);
    }

    // ── Teardown ──

    #[test]
    fn drop_releases_control_with_same_access_mode() {
        let sdk = sdk_with_keyboard();
        {
            let _controller = Controller::start(&sdk, true).unwrap();
            assert!(sdk.control_releases.borrow().is_empty());
        }
        assert_eq!(*sdk.control_releases.borrow(), vec![1]);
    }

    #[test]
    fn drop_without_control_does_not_release() {
        let sdk = sdk_with_keyboard();
        sdk.grant_control.set(false);
        {
            let _controller = Controller::start(&sdk, false).unwrap();
        }
        assert!(sdk.control_releases.borrow().is_empty());
    }

    // ── Device queries ──

    #[test]
    fn device_info_decodes_model_and_count() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        let info = controller.device_info(0).expect("device 0 exists");
        assert_eq!(info.model, "K70 RGB");
        assert_eq!(info.leds_count, 3);
        assert!(info.supports_lighting());
    }

    #[test]
    fn device_info_absent_for_bad_index() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        assert!(controller.device_info(1).is_none());
        assert!(controller.device_info(-1).is_none());
    }

    // ── LED queries ──

    #[test]
    fn led_positions_sorted_even_when_native_order_is_not() {
        let sdk = sdk_with_keyboard(); // native order [3, 1, 2]
        let controller = Controller::start(&sdk, false).unwrap();
        let ids: Vec<i32> = controller
            .led_positions(Some(0))
            .iter()
            .map(|p| p.led_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn led_positions_global_table_when_no_device_given() {
        let mut sdk = MockSdk::new();
        sdk.add_device("K70 RGB", 2, &[2, 1]);
        sdk.add_device("M65 PRO", 1, &[4, 3]);
        let controller = Controller::start(&sdk, false).unwrap();
        assert_eq!(controller.led_ids(None), vec![1, 2, 3, 4]);
        assert_eq!(controller.led_count(None), 4);
    }

    #[test]
    fn led_positions_empty_for_unknown_device() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        assert!(controller.led_positions(Some(7)).is_empty());
        assert_eq!(controller.led_count(Some(7)), 0);
    }

    // ── LED colors ──

    #[test]
    fn led_colors_preserve_input_order() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        let colors = controller.led_colors(0, &[3, 1]);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0].led_id, 3);
        assert_eq!(colors[1].led_id, 1);
    }

    #[test]
    fn led_color_single_id() {
        let sdk = sdk_with_keyboard();
        let controller = Controller::start(&sdk, false).unwrap();
        let color = controller.led_color(0, 2).expect("query returns one entry");
        assert_eq!(color.led_id, 2);
        assert_eq!((color.r, color.g, color.b), (0, 0, 0));
    }
}
