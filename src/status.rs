use std::{path::PathBuf, time::Duration};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    Passed,
    Failed,
}

impl TestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::InProgress => "In Progress",
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: TestStatus,
    pub test_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerEvent {
    pub event_type: String,
    pub event_time: NaiveDateTime,
    #[serde(with = "crate::iso_duration")]
    pub duration: Duration,
}

/// One reading of the "Current UPS status" section.
///
/// Fields are declared in name order, which is also the order changes are
/// reported in by [`crate::diff`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UPSStatus {
    pub battery_capacity_percent: f64,
    pub last_power_event: Option<PowerEvent>,
    pub line_interaction: String,
    pub load_percent: f64,
    pub load_watts: f64,
    pub output_voltage_volts: f64,
    pub power_supply_by: String,
    #[serde(with = "crate::iso_duration")]
    pub remaining_runtime: Duration,
    pub state: String,
    pub test_result: Option<TestResult>,
    pub utility_voltage_volts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UPSProperties {
    pub model_name: String,
    pub firmware_number: String,
    pub rating_voltage_volts: f64,
    pub rating_power_watts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerFailureAction {
    #[serde(with = "crate::iso_duration")]
    pub delay_time_since_power_failure: Duration,
    pub script_command_enabled: bool,
    pub script_command_path: PathBuf,
    #[serde(with = "crate::iso_duration")]
    pub script_command_duration: Duration,
    pub system_shutdown_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowBatteryAction {
    #[serde(with = "crate::iso_duration")]
    pub remaining_runtime_threshold: Duration,
    pub battery_capacity_threshold_percent: f64,
    pub script_command_enabled: bool,
    pub script_command_path: PathBuf,
    #[serde(with = "crate::iso_duration")]
    pub script_command_duration: Duration,
    pub system_shutdown_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfiguration {
    pub alarm_enabled: bool,
    pub hibernate_enabled: bool,
    pub cloud_enabled: bool,
    pub power_failure_action: PowerFailureAction,
    pub low_battery_action: LowBatteryAction,
}

// Partial updates for the daemon actions. Unset fields are left as configured.

#[derive(Debug, Clone, Default)]
pub struct PowerFailureActionUpdate {
    pub script_command_enabled: Option<bool>,
    pub delay_time_since_power_failure: Option<Duration>,
    pub script_command_duration: Option<Duration>,
    pub script_command_path: Option<PathBuf>,
    pub system_shutdown_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LowBatteryActionUpdate {
    pub script_command_enabled: Option<bool>,
    pub remaining_runtime_threshold: Option<Duration>,
    /// Between 0.0 (0%) and 1.0 (100%).
    pub battery_capacity_threshold_percent: Option<f64>,
    pub script_command_duration: Option<Duration>,
    pub script_command_path: Option<PathBuf>,
    pub system_shutdown_enabled: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CloudUpdate {
    pub enabled: Option<bool>,
    pub account: Option<String>,
    pub password: Option<String>,
}
