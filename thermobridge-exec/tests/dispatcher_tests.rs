// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thermobridge_core::{ActuatorCommand, BridgeError, ControlCommand, Reading, SystemState};
use thermobridge_exec::{CommandDispatcher, Coordinator};
use thermobridge_test_utils::{serial_link, FailingWriter, StallingWriter, StutteringWriter};

#[tokio::test]
async fn test_send_writes_code_line() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), link.host_writer);

    // Act
    let sent = dispatcher.send(ActuatorCommand::AlarmTrigger).await;

    // Assert
    assert!(sent);
    assert_eq!(link.actuator.expect_line(100).await, "1001");
    Ok(())
}

#[tokio::test]
async fn test_forward_writes_raw_value() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), link.host_writer);

    // Act
    dispatcher.forward("23.75").await;

    // Assert
    assert_eq!(link.actuator.expect_line(100).await, "23.75");
    Ok(())
}

#[tokio::test]
async fn test_reset_alarm_clears_latch_and_sends_reset() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    coordinator.record_reading(Reading::new(1_000, 40.0));
    let dispatcher = CommandDispatcher::new(Arc::clone(&coordinator), link.host_writer);

    // Act
    let command = dispatcher.execute_named("RESET_ALARM").await?;

    // Assert
    assert_eq!(command, ControlCommand::ResetAlarm);
    assert!(!coordinator.is_alarm_latched());
    assert_eq!(link.actuator.expect_line(100).await, "1002");
    Ok(())
}

#[tokio::test]
async fn test_mode_commands_only_dispatch() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    coordinator.record_reading(Reading::new(1_000, 27.0));
    let before = coordinator.snapshot();
    let dispatcher = CommandDispatcher::new(Arc::clone(&coordinator), link.host_writer);

    // Act
    dispatcher.execute(ControlCommand::AutoMode).await;
    dispatcher.execute(ControlCommand::ManualMode).await;

    // Assert
    assert_eq!(link.actuator.expect_line(100).await, "1003");
    assert_eq!(link.actuator.expect_line(100).await, "1004");
    assert_eq!(coordinator.snapshot(), before);
    Ok(())
}

#[tokio::test]
async fn test_unknown_command_is_rejected_without_side_effects() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    coordinator.record_reading(Reading::new(1_000, 33.0));
    let dispatcher = CommandDispatcher::new(Arc::clone(&coordinator), link.host_writer);

    // Act
    let result = dispatcher.execute_named("UNKNOWN").await;

    // Assert
    assert!(matches!(result, Err(BridgeError::UnknownCommand { ref command }) if command == "UNKNOWN"));
    assert!(coordinator.is_alarm_latched());
    link.actuator.assert_no_line_within(50).await;
    Ok(())
}

#[tokio::test]
async fn test_io_failure_closes_channel() {
    // Arrange
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), FailingWriter);

    // Act
    let first = dispatcher.try_write_line("21.0").await;
    let second = dispatcher.try_write_line("21.0").await;

    // Assert
    assert!(matches!(first, Err(BridgeError::SerialIo { .. })));
    assert!(matches!(second, Err(BridgeError::SerialUnavailable)));
    assert!(!dispatcher.is_open().await);
    assert!(!dispatcher.send(ActuatorCommand::Reset).await);
}

#[tokio::test]
async fn test_stalled_write_times_out_and_keeps_channel() {
    // Arrange
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), StallingWriter)
        .with_write_timeout(Duration::from_millis(30));

    // Act
    let result = dispatcher.try_write_line("1001").await;

    // Assert
    assert!(matches!(result, Err(BridgeError::Timeout { .. })));
    assert!(dispatcher.is_open().await);
    assert!(!dispatcher.send(ActuatorCommand::AlarmTrigger).await);
}

#[tokio::test]
async fn test_line_cut_off_by_timeout_is_completed_before_next_line() {
    // Arrange
    let writer = StutteringWriter::new(2);
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), writer.clone())
        .with_write_timeout(Duration::from_millis(30));
    let cut_off = dispatcher.send(ActuatorCommand::AlarmTrigger).await;
    assert_eq!(writer.wire(), "10");

    // Act
    writer.release();
    let sent = dispatcher.send(ActuatorCommand::Reset).await;

    // Assert
    assert!(!cut_off);
    assert!(sent);
    assert_eq!(writer.wire(), "1001\n1002\n");
    assert!(dispatcher.is_open().await);
}

#[tokio::test]
async fn test_line_timed_out_before_first_byte_is_dropped() {
    // Arrange
    let writer = StutteringWriter::new(0);
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), writer.clone())
        .with_write_timeout(Duration::from_millis(30));
    let timed_out = dispatcher.try_write_line("1001").await;

    // Act
    writer.release();
    let sent = dispatcher.send(ActuatorCommand::Reset).await;

    // Assert
    assert!(matches!(timed_out, Err(BridgeError::Timeout { .. })));
    assert!(sent);
    assert_eq!(writer.wire(), "1002\n");
}

#[tokio::test]
async fn test_reset_waits_for_an_open_session() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    coordinator.record_reading(Reading::new(1_000, 40.0));
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(&coordinator),
        link.host_writer,
    ));
    let mut session = dispatcher.session().await;

    // Act
    let reset = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.execute(ControlCommand::ResetAlarm).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let latched_during_session = coordinator.is_alarm_latched();
    assert!(session.send(ActuatorCommand::AlarmTrigger).await);
    drop(session);
    let reset_sent = reset.await?;

    // Assert
    assert!(latched_during_session);
    assert!(reset_sent);
    assert!(!coordinator.is_alarm_latched());
    assert_eq!(link.actuator.drain_lines(100).await, vec!["1001", "1002"]);
    Ok(())
}

#[tokio::test]
async fn test_disconnected_dispatcher_still_runs_commands() {
    // Arrange
    let coordinator = Arc::new(Coordinator::default());
    coordinator.record_reading(Reading::new(1_000, 31.0));
    let dispatcher = CommandDispatcher::disconnected(Arc::clone(&coordinator));

    // Act
    let sent = dispatcher.execute(ControlCommand::ResetAlarm).await;

    // Assert
    assert!(!sent);
    assert!(!dispatcher.is_open().await);
    assert!(!coordinator.is_alarm_latched());
    assert_eq!(coordinator.system_state(), SystemState::Alarm);
}

#[tokio::test]
async fn test_close_ends_the_actuator_stream() {
    // Arrange
    let mut link = serial_link();
    let dispatcher = CommandDispatcher::new(Arc::new(Coordinator::default()), link.host_writer);
    dispatcher.forward("22.0").await;

    // Act
    dispatcher.close().await;

    // Assert
    assert_eq!(link.actuator.expect_line(100).await, "22.0");
    assert_eq!(link.actuator.read_line(100).await, None);
    assert!(!dispatcher.is_open().await);
    assert!(!dispatcher.forward("22.5").await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_interleave() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::new(Coordinator::default()),
        link.host_writer,
    ));
    let expected: HashSet<String> = (0..32).map(|i| format!("{}.{i:02}", 20 + i)).collect();

    // Act
    let writers: Vec<_> = expected
        .iter()
        .cloned()
        .map(|line| {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.forward(&line).await })
        })
        .collect();
    for writer in writers {
        assert!(writer.await?);
    }

    // Assert
    let received: HashSet<String> = link.actuator.drain_lines(100).await.into_iter().collect();
    assert_eq!(received, expected);
    Ok(())
}
