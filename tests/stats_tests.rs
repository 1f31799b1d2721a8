// Rate derivation: first tick, counter-reset clamp, steady-state rates

mod common;

use natsmon::models::{SampleHistory, derive_stats};

#[test]
fn test_first_tick_has_zero_delta_and_zero_rates() {
    let current = common::varz_at("2024-05-01T12:00:00Z");
    let stats = derive_stats(None, &current).unwrap();

    assert_eq!(stats.time_delta_ms, 0);
    assert_eq!(stats.in_msgs_rate.value, "0");
    assert_eq!(stats.out_msgs_rate.value, "0");
    assert_eq!(stats.in_bytes_rate.display, "0 B");
    assert_eq!(stats.out_bytes_rate.display, "0 B");
}

#[test]
fn test_msgs_rate_from_consecutive_snapshots() {
    let mut previous = common::varz_at("2024-05-01T12:00:00Z");
    previous.in_msgs = 1000;
    let mut current = common::varz_at("2024-05-01T12:00:01Z");
    current.in_msgs = 3000;

    let stats = derive_stats(Some(&previous), &current).unwrap();
    assert_eq!(stats.time_delta_ms, 1000);
    assert_eq!(stats.in_msgs_rate.display, "2 K");
}

#[test]
fn test_counter_reset_clamps_rate_to_zero() {
    let mut previous = common::varz_at("2024-05-01T12:00:00Z");
    previous.in_msgs = 100;
    let mut current = common::varz_at("2024-05-01T12:00:10Z");
    current.in_msgs = 50;

    let stats = derive_stats(Some(&previous), &current).unwrap();
    assert_eq!(stats.in_msgs_rate.value, "0");
    assert!(!stats.in_msgs_rate.display.contains('-'));
}

#[test]
fn test_bytes_rate_uses_binary_units() {
    let mut previous = common::varz_at("2024-05-01T12:00:00Z");
    previous.out_bytes = 0;
    let mut current = common::varz_at("2024-05-01T12:00:02Z");
    current.out_bytes = 4096;

    let stats = derive_stats(Some(&previous), &current).unwrap();
    assert_eq!(stats.out_bytes_rate.display, "2 KiB");
}

#[test]
fn test_irregular_interval_scales_rate() {
    let mut previous = common::varz_at("2024-05-01T12:00:00Z");
    previous.in_msgs = 0;
    let mut current = common::varz_at("2024-05-01T12:00:00.500Z");
    current.in_msgs = 500;

    // 500 msgs over half a second
    let stats = derive_stats(Some(&previous), &current).unwrap();
    assert_eq!(stats.time_delta_ms, 500);
    assert_eq!(stats.in_msgs_rate.display, "1 K");
}

#[test]
fn test_non_positive_time_delta_yields_zero_rates() {
    let mut previous = common::varz_at("2024-05-01T12:00:05Z");
    previous.in_msgs = 0;
    let mut current = common::varz_at("2024-05-01T12:00:00Z");
    current.in_msgs = 10_000;

    let stats = derive_stats(Some(&previous), &current).unwrap();
    assert_eq!(stats.time_delta_ms, -5000);
    assert_eq!(stats.in_msgs_rate.value, "0");
}

#[test]
fn test_absolute_gauges_are_formatted() {
    let mut current = common::varz_at("2024-05-01T12:00:00Z");
    current.mem = 1536;
    current.connections = 1500;
    current.in_msgs = 2_000_000;

    let stats = derive_stats(None, &current).unwrap();
    assert_eq!(stats.memory.display, "1.5 KiB");
    assert_eq!(stats.conns.display, "1.5 K");
    assert_eq!(stats.in_msgs.display, "2 M");
    assert_eq!(stats.uptime, "2d 3h");
    assert_eq!(stats.server_name, "test-server");
}

#[test]
fn test_bad_server_timestamp_is_an_error() {
    let previous = common::varz_at("not-a-timestamp");
    let current = common::varz_at("2024-05-01T12:00:00Z");
    assert!(derive_stats(Some(&previous), &current).is_err());
}

#[test]
fn test_sample_history_advances_pairwise() {
    let mut history = SampleHistory::default();
    assert!(history.current().is_none());
    assert!(history.previous().is_none());

    let a = common::varz_at("2024-05-01T12:00:00Z");
    let b = common::varz_at("2024-05-01T12:00:01Z");

    history.advance(a);
    assert!(history.previous().is_none());
    assert_eq!(history.current().unwrap().now, "2024-05-01T12:00:00Z");

    history.advance(b);
    assert_eq!(history.previous().unwrap().now, "2024-05-01T12:00:00Z");
    assert_eq!(history.current().unwrap().now, "2024-05-01T12:00:01Z");
}
