// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;
use std::time::Duration;
use thermobridge_exec::{CancellationToken, Coordinator, FeedbackListener, ListenerExit};
use thermobridge_test_utils::{serial_link, wait_until};

#[tokio::test]
async fn test_integer_line_sets_tilt() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    let listener = FeedbackListener::spawn(link.host_reader, Arc::clone(&coordinator));

    // Act
    link.actuator.write_line("12").await;

    // Assert
    wait_until(500, || coordinator.window_tilt() == 12).await;
    assert!(matches!(listener.stop().await, Some(ListenerExit::Cancelled)));
    Ok(())
}

#[tokio::test]
async fn test_diagnostic_line_leaves_tilt_unchanged() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    let listener = FeedbackListener::spawn(link.host_reader, Arc::clone(&coordinator));
    link.actuator.write_line("12").await;
    wait_until(500, || coordinator.window_tilt() == 12).await;

    // Act
    link.actuator.write_line("door open").await;
    link.actuator.write_line("").await;
    link.actuator.write_line("-4").await;

    // Assert
    wait_until(500, || coordinator.window_tilt() == -4).await;
    listener.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_carriage_return_is_ignored() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    let _listener = FeedbackListener::spawn(link.host_reader, Arc::clone(&coordinator));

    // Act
    link.actuator.write_raw(b"45\r\n").await;

    // Assert
    wait_until(500, || coordinator.window_tilt() == 45).await;
    Ok(())
}

#[tokio::test]
async fn test_end_of_stream_terminates_listener() -> anyhow::Result<()> {
    // Arrange
    let mut link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    let listener = FeedbackListener::spawn(link.host_reader, Arc::clone(&coordinator));

    // Act
    link.actuator.write_raw(b"7").await;
    link.actuator.hang_up().await;

    // Assert
    let exit = tokio::time::timeout(Duration::from_millis(500), listener.join()).await?;
    assert!(matches!(exit, Some(ListenerExit::Closed)));
    assert_eq!(coordinator.window_tilt(), 7);
    Ok(())
}

#[tokio::test]
async fn test_run_returns_when_token_fires() -> anyhow::Result<()> {
    // Arrange
    let link = serial_link();
    let coordinator = Arc::new(Coordinator::default());
    let cancel = CancellationToken::new();
    let run = tokio::spawn(FeedbackListener::run(
        link.host_reader,
        coordinator,
        cancel.clone(),
    ));

    // Act
    cancel.cancel();

    // Assert
    let exit = tokio::time::timeout(Duration::from_millis(500), run).await??;
    assert!(matches!(exit, ListenerExit::Cancelled));
    Ok(())
}
