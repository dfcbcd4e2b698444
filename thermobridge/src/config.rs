// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Command-line and environment configuration.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thermobridge_core::AlarmWindow;
use thermobridge_error::{BridgeError, Result};

/// Every option can also be set through the environment variable named next to it.
#[derive(Debug, Clone, Parser)]
#[command(name = "thermobridge", version, about = "Sensor/actuator bridge for a smart window")]
pub struct BridgeConfig {
    /// MQTT broker host
    #[arg(long, env = "THERMOBRIDGE_BROKER_HOST", default_value = "broker.mqtt-dashboard.com")]
    pub broker_host: String,

    /// MQTT broker port
    #[arg(long, env = "THERMOBRIDGE_BROKER_PORT", default_value_t = 1883)]
    pub broker_port: u16,

    /// MQTT client id; a random one is generated when omitted
    #[arg(long, env = "THERMOBRIDGE_CLIENT_ID")]
    pub client_id: Option<String>,

    /// MQTT keep-alive interval in seconds
    #[arg(long, env = "THERMOBRIDGE_KEEP_ALIVE_SECS", default_value_t = 30)]
    pub keep_alive_secs: u64,

    /// Topic the sensor publishes temperatures on
    #[arg(long, env = "THERMOBRIDGE_TEMPERATURE_TOPIC", default_value = "ESP32_temperature")]
    pub temperature_topic: String,

    /// Topic the sampling frequency is published on
    #[arg(long, env = "THERMOBRIDGE_FREQUENCY_TOPIC", default_value = "ESP32_samplingFrequency")]
    pub frequency_topic: String,

    /// Serial device of the actuator
    #[arg(long, env = "THERMOBRIDGE_SERIAL_PORT", default_value = "/dev/ttyUSB0")]
    pub serial_port: String,

    #[arg(long, env = "THERMOBRIDGE_BAUD_RATE", default_value_t = 9600)]
    pub baud_rate: u32,

    /// Upper bound for one serial write, in milliseconds
    #[arg(long, env = "THERMOBRIDGE_WRITE_TIMEOUT_MS", default_value_t = 500)]
    pub write_timeout_ms: u64,

    /// HTTP listen address
    #[arg(long, env = "THERMOBRIDGE_HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,

    /// Directory with the dashboard's static files
    #[arg(long, env = "THERMOBRIDGE_WEB_ROOT")]
    pub web_root: Option<PathBuf>,

    /// Length of the sustained-heat window in milliseconds
    #[arg(long, env = "THERMOBRIDGE_ALARM_WINDOW_MS", default_value_t = 3000)]
    pub alarm_window_ms: i64,

    /// Temperature every reading in the window must reach
    #[arg(long, env = "THERMOBRIDGE_ALARM_THRESHOLD", default_value_t = 30.0)]
    pub alarm_threshold: f64,

    /// Readings required in the window before the alarm may fire
    #[arg(long, env = "THERMOBRIDGE_ALARM_MIN_SAMPLES", default_value_t = 1)]
    pub alarm_min_samples: usize,

    /// tracing filter directive; RUST_LOG wins when set
    #[arg(long, env = "THERMOBRIDGE_LOG_FILTER", default_value = "info")]
    pub log_filter: String,
}

impl BridgeConfig {
    /// Rejects settings the bridge cannot run with.
    ///
    /// # Errors
    /// Returns [`BridgeError::Config`] naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        if self.broker_host.trim().is_empty() {
            return Err(BridgeError::config("broker host must not be empty"));
        }
        for (name, topic) in [
            ("temperature topic", &self.temperature_topic),
            ("frequency topic", &self.frequency_topic),
        ] {
            if topic.is_empty() {
                return Err(BridgeError::config(format!("{name} must not be empty")));
            }
        }
        if self.frequency_topic.contains(['#', '+']) {
            return Err(BridgeError::config(
                "frequency topic must not contain wildcards",
            ));
        }
        if self.baud_rate == 0 {
            return Err(BridgeError::config("baud rate must be positive"));
        }
        if self.write_timeout_ms == 0 {
            return Err(BridgeError::config("serial write timeout must be positive"));
        }
        if self.keep_alive_secs < 5 {
            return Err(BridgeError::config("keep-alive must be at least 5 seconds"));
        }
        if self.alarm_window_ms <= 0 {
            return Err(BridgeError::config("alarm window must be positive"));
        }
        if !self.alarm_threshold.is_finite() {
            return Err(BridgeError::config("alarm threshold must be a finite number"));
        }
        if self.alarm_min_samples == 0 {
            return Err(BridgeError::config("alarm minimum samples must be at least 1"));
        }
        Ok(())
    }

    pub fn alarm_window(&self) -> AlarmWindow {
        AlarmWindow::new(self.alarm_window_ms, self.alarm_threshold)
            .with_min_samples(self.alarm_min_samples)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// The configured client id, or `thermobridge-` plus eight random hex digits.
    pub fn client_id(&self) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| format!("thermobridge-{:08x}", fastrand::u32(..)))
    }
}
