// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;
use thermobridge_core::{AlarmWindow, BridgeError, ControlCommand, SystemState};
use thermobridge_test_utils::{feed_readings, BridgeHarness};

#[tokio::test]
async fn test_normal_reading_is_forwarded_without_publish() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();

    // Act
    let transition = harness.gateway.on_message(b" 24.9\n").await?;

    // Assert
    assert_eq!(transition.current, SystemState::Normal);
    assert_eq!(harness.actuator.expect_line(100).await, "24.9");
    assert!(harness.sink.published().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_hot_reading_publishes_new_frequency() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();

    // Act
    let transition = harness.gateway.on_message(b"27.0").await?;

    // Assert
    assert_eq!(transition.current, SystemState::Hot);
    assert_eq!(harness.actuator.expect_line(100).await, "27.0");
    assert_eq!(harness.sink.published_millis(), vec![2000]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_payload_is_discarded() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();
    harness.gateway.on_message(b"27.0").await?;
    harness.actuator.expect_line(100).await;
    let before = harness.coordinator.snapshot();

    // Act
    let garbage = harness.gateway.on_message(b"warm").await;
    let not_finite = harness.gateway.on_message(b"NaN").await;
    let not_utf8 = harness.gateway.on_message(&[0xff, 0xfe]).await;

    // Assert
    assert!(matches!(garbage, Err(BridgeError::InvalidReading { .. })));
    assert!(matches!(not_finite, Err(BridgeError::InvalidReading { .. })));
    assert!(matches!(not_utf8, Err(BridgeError::InvalidReading { .. })));
    assert_eq!(harness.coordinator.snapshot(), before);
    harness.actuator.assert_no_line_within(50).await;
    assert_eq!(harness.sink.published_millis(), vec![2000]);
    Ok(())
}

#[tokio::test]
async fn test_sustained_heat_raises_alarm_once() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();

    // Act
    let transitions = feed_readings(
        &harness.gateway,
        &harness.clock,
        &[24.0, 27.0, 31.0, 32.0, 33.0, 34.0, 35.0],
        1_000,
    )
    .await;

    // Assert
    let states: Vec<_> = transitions.iter().map(|t| t.current).collect();
    assert_eq!(
        states,
        vec![
            SystemState::Normal,
            SystemState::Hot,
            SystemState::TooHot,
            SystemState::TooHot,
            SystemState::TooHot,
            SystemState::Alarm,
            SystemState::Alarm,
        ]
    );
    assert_eq!(transitions.iter().filter(|t| t.alarm_triggered).count(), 1);
    assert_eq!(
        harness.actuator.drain_lines(100).await,
        vec!["24", "27", "31", "32", "33", "1001"]
    );
    assert_eq!(harness.sink.published_millis(), vec![2000, 1000, 500]);
    assert!(harness.coordinator.is_alarm_latched());
    Ok(())
}

#[tokio::test]
async fn test_latched_alarm_ignores_readings_until_reset() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();
    harness.gateway.on_message(b"36.0").await?;
    assert_eq!(harness.actuator.expect_line(100).await, "1001");

    // Act
    harness.clock.advance(1_000);
    let while_latched = harness.gateway.on_message(b"20.0").await?;
    harness.dispatcher.execute(ControlCommand::ResetAlarm).await;
    harness.clock.advance(1_000);
    let after_reset = harness.gateway.on_message(b"20.0").await?;

    // Assert
    assert_eq!(while_latched.current, SystemState::Alarm);
    assert!(while_latched.latched);
    assert_eq!(after_reset.current, SystemState::Normal);
    assert_eq!(
        harness.actuator.drain_lines(100).await,
        vec!["1002", "20.0"]
    );
    assert_eq!(harness.sink.published_millis(), vec![500, 5000]);
    Ok(())
}

#[tokio::test]
async fn test_single_hot_reading_with_cool_neighbour_is_too_hot() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();
    harness.gateway.on_message(b"22.0").await?;
    harness.clock.advance(500);

    // Act
    let transition = harness.gateway.on_message(b"31.0").await?;

    // Assert
    assert_eq!(transition.current, SystemState::TooHot);
    assert!(!transition.alarm_triggered);
    assert_eq!(harness.actuator.drain_lines(100).await, vec!["22.0", "31.0"]);
    Ok(())
}

#[tokio::test]
async fn test_min_samples_delays_alarm() -> anyhow::Result<()> {
    // Arrange
    let harness = BridgeHarness::with_window(AlarmWindow::default().with_min_samples(3));

    // Act
    let transitions = feed_readings(
        &harness.gateway,
        &harness.clock,
        &[31.0, 31.0, 31.0],
        500,
    )
    .await;

    // Assert
    let triggered: Vec<_> = transitions.iter().map(|t| t.alarm_triggered).collect();
    assert_eq!(triggered, vec![false, false, true]);
    Ok(())
}

#[tokio::test]
async fn test_feedback_and_ingest_share_the_domain() -> anyhow::Result<()> {
    // Arrange
    let mut harness = BridgeHarness::new();

    // Act
    harness.actuator.write_line("30").await;
    harness.gateway.on_message(b"26.5").await?;

    // Assert
    thermobridge_test_utils::wait_until(500, || harness.coordinator.window_tilt() == 30).await;
    let snapshot = harness.coordinator.snapshot();
    assert_eq!(snapshot.system_state, SystemState::Hot);
    assert_eq!(snapshot.history_len, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_alarm_code_order_matches_latch_under_concurrent_reset() -> anyhow::Result<()> {
    for _ in 0..32 {
        // Arrange
        let mut harness = BridgeHarness::new();
        let dispatcher = Arc::clone(&harness.dispatcher);

        // Act
        let reset =
            tokio::spawn(async move { dispatcher.execute(ControlCommand::ResetAlarm).await });
        harness.gateway.on_message(b"36.0").await?;
        reset.await?;

        // Assert
        let first = harness.actuator.expect_line(100).await;
        let last = harness.actuator.expect_line(100).await;
        let mut codes = vec![first.as_str(), last.as_str()];
        codes.sort_unstable();
        assert_eq!(codes, vec!["1001", "1002"]);
        assert_eq!(harness.coordinator.is_alarm_latched(), last == "1001");
    }
    Ok(())
}
