//! End-to-end tests of the controller against the mock SDK, exercising the
//! same entry-point contract the vendor library exposes.

use cuelink::Controller;
use cuelink::sdk::mock::MockSdk;

fn two_device_sdk() -> MockSdk {
    let mut sdk = MockSdk::new();
    sdk.add_device("K95 RGB PLATINUM", 2, &[3, 1, 2]);
    sdk.add_device("M65 PRO RGB", 1, &[11, 10]);
    sdk
}

// ── Device enumeration ──

#[test]
fn every_valid_device_has_nonnegative_led_count() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();
    for index in 0..controller.device_count() {
        let info = controller
            .device_info(index)
            .expect("valid index yields info");
        assert!(info.leds_count >= 0);
    }
}

#[test]
fn out_of_range_indices_yield_absent() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();
    let count = controller.device_count();
    assert!(controller.device_info(count).is_none());
    assert!(controller.device_info(count + 5).is_none());
    assert!(controller.device_info(-1).is_none());
}

#[test]
fn device_models_maps_every_index_to_its_model() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();

    let models = controller.device_models();
    let keys: Vec<i32> = models.keys().copied().collect();
    assert_eq!(keys, vec![0, 1], "keys are exactly 0..device_count");

    for (index, model) in &models {
        let info = controller.device_info(*index).unwrap();
        assert_eq!(*model, info.model);
    }
    assert_eq!(models[&0], "K95 RGB PLATINUM");
    assert_eq!(models[&1], "M65 PRO RGB");
}

// ── LED position invariants ──

#[test]
fn led_positions_sorted_ascending_for_unsorted_native_input() {
    let sdk = two_device_sdk(); // keyboard table is [3, 1, 2] natively
    let controller = Controller::start(&sdk, false).unwrap();
    let positions = controller.led_positions(Some(0));
    let ids: Vec<i32> = positions.iter().map(|p| p.led_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn led_ids_equal_position_projection_in_same_order() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();
    for device in [Some(0), Some(1), None] {
        let projected: Vec<i32> = controller
            .led_positions(device)
            .iter()
            .map(|p| p.led_id)
            .collect();
        assert_eq!(controller.led_ids(device), projected);
    }
}

#[test]
fn led_count_equals_position_table_length() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();
    assert_eq!(controller.led_count(Some(0)), 3);
    assert_eq!(controller.led_count(Some(1)), 2);
    assert_eq!(
        controller.led_count(None),
        controller.led_positions(None).len()
    );
}

// ── Buffered set / flush ──

#[test]
fn set_led_buffers_until_flush() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();

    assert!(controller.set_led(0, 1, (255, 0, 0)));

    // Staged but not yet visible on the hardware.
    assert_eq!(sdk.buffered_color(0, 1), Some((255, 0, 0)));
    assert_eq!(sdk.applied_color(0, 1), None);

    assert!(controller.flush());
    assert_eq!(sdk.buffered_color(0, 1), None);
    assert_eq!(sdk.applied_color(0, 1), Some((255, 0, 0)));
}

#[test]
fn update_leds_batches_whole_array() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();

    let batch = [
        cuelink::LedColor::new(1, 10, 20, 30),
        cuelink::LedColor::new(2, 40, 50, 60),
        cuelink::LedColor::new(3, 70, 80, 90),
    ];
    assert!(controller.update_leds(0, &batch));
    assert_eq!(sdk.buffered.borrow().len(), 3);

    controller.flush();
    assert_eq!(sdk.applied_color(0, 2), Some((40, 50, 60)));
}

#[test]
fn flush_with_nothing_buffered_is_a_noop() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();
    assert!(controller.flush());
    assert_eq!(sdk.flushes.get(), 1);
    assert!(sdk.applied.borrow().is_empty());
}

// ── Color queries ──

#[test]
fn led_colors_read_back_applied_state_in_input_order() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();

    controller.set_led(0, 1, (255, 0, 0));
    controller.set_led(0, 2, (0, 255, 0));
    controller.flush();

    let colors = controller.led_colors(0, &[2, 1]);
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0].led_id, 2);
    assert_eq!((colors[0].r, colors[0].g, colors[0].b), (0, 255, 0));
    assert_eq!(colors[1].led_id, 1);
    assert_eq!((colors[1].r, colors[1].g, colors[1].b), (255, 0, 0));
}

#[test]
fn unflushed_updates_do_not_show_in_color_queries() {
    let sdk = two_device_sdk();
    let controller = Controller::start(&sdk, false).unwrap();

    controller.set_led(0, 3, (1, 2, 3));
    let before = controller.led_color(0, 3).unwrap();
    assert_eq!((before.r, before.g, before.b), (0, 0, 0));

    controller.flush();
    let after = controller.led_color(0, 3).unwrap();
    assert_eq!((after.r, after.g, after.b), (1, 2, 3));
}

// ── Session lifecycle ──

#[test]
fn control_is_released_exactly_once_on_drop() {
    let sdk = two_device_sdk();
    {
        let controller = Controller::start(&sdk, false).unwrap();
        assert!(controller.has_control());
    }
    assert_eq!(sdk.control_releases.borrow().len(), 1);
}
