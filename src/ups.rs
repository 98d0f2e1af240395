use std::{
    path::Path,
    thread,
    time::{Duration, Instant},
};

use crate::{
    error::UPSError,
    monitor::Monitor,
    parse::{self, PropertyBag, Sections},
    reader::Reader,
    status::{
        CloudUpdate, DaemonConfiguration, LowBatteryAction, LowBatteryActionUpdate,
        PowerFailureAction, PowerFailureActionUpdate, TestResult, TestStatus, UPSProperties,
        UPSStatus,
    },
};

// Section names printed by `pwrstat -status` and `pwrstat -config`.
const STATUS_SECTION: &str = "Current UPS status";
const PROPERTIES_SECTION: &str = "Properties";
const DAEMON_SECTION: &str = "Daemon Configuration";
const POWER_FAILURE_SECTION: &str = "Action for Power Failure";
const LOW_BATTERY_SECTION: &str = "Action for Battery Low";

const LOST_COMMUNICATION: &str = "Lost Communication";
const SETUP_SUCCESSFUL: &str = "Setup configuration successful";
const TEST_INITIATED: &str = "The UPS test is initiated";
const VERIFY_FAILED: &str = "Verify failed";

const DEFAULT_TEST_POLL_EVERY: Duration = Duration::from_secs(1);

/// Anything that can take a snapshot of the UPS status.
pub trait SnapshotProvider {
    /// Fails with [`UPSError::Unreachable`] when the UPS does not answer.
    fn fetch(&self) -> Result<UPSStatus, UPSError>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for &P {
    fn fetch(&self) -> Result<UPSStatus, UPSError> {
        (**self).fetch()
    }
}

#[derive(Debug, Clone)]
pub struct TestOptions {
    /// Wait for the test to settle. Otherwise return straight after starting it.
    pub poll_result: bool,
    pub timeout: Option<Duration>,
    pub poll_every: Option<Duration>,
}

impl Default for TestOptions {
    fn default() -> Self {
        TestOptions {
            poll_result: true,
            timeout: None,
            poll_every: None,
        }
    }
}

fn section<'a>(sections: &'a Sections, name: &str) -> Result<&'a PropertyBag, UPSError> {
    sections
        .get(name)
        .ok_or_else(|| UPSError::UnexpectedResponse(format!("missing section '{}'", name)))
}

fn is_reachable(status: &PropertyBag) -> bool {
    status.get("State").map(String::as_str) != Some(LOST_COMMUNICATION)
}

fn check_setup(output: String) -> Result<(), UPSError> {
    if output.starts_with(SETUP_SUCCESSFUL) {
        Ok(())
    } else {
        Err(UPSError::SetupFailed(output))
    }
}

fn parse_power_failure_action(data: &PropertyBag) -> Result<PowerFailureAction, UPSError> {
    Ok(PowerFailureAction {
        delay_time_since_power_failure: parse::leading_seconds(parse::get(
            data,
            "Delay time since Power failure",
        )?)?,
        script_command_enabled: parse::on_off(parse::get(data, "Run script command")?)?,
        script_command_path: parse::get(data, "Path of script command")?.into(),
        script_command_duration: parse::leading_seconds(parse::get(
            data,
            "Duration of command running",
        )?)?,
        system_shutdown_enabled: parse::on_off(parse::get(data, "Enable shutdown system")?)?,
    })
}

fn parse_low_battery_action(data: &PropertyBag) -> Result<LowBatteryAction, UPSError> {
    Ok(LowBatteryAction {
        remaining_runtime_threshold: parse::leading_seconds(parse::get(
            data,
            "Remaining runtime threshold",
        )?)?,
        battery_capacity_threshold_percent: parse::number(parse::get(
            data,
            "Battery capacity threshold",
        )?)? / 100.0,
        script_command_enabled: parse::on_off(parse::get(data, "Run script command")?)?,
        script_command_path: parse::get(data, "Path of command")?.into(),
        script_command_duration: parse::leading_seconds(parse::get(
            data,
            "Duration of command running",
        )?)?,
        system_shutdown_enabled: parse::on_off(parse::get(data, "Enable shutdown system")?)?,
    })
}

/// Client for a UPS managed by the PowerPanel daemon, driven through `pwrstat`.
pub struct UPS<R: Reader> {
    reader: R,
}

impl<R: Reader> UPS<R> {
    pub fn new(reader: R) -> UPS<R> {
        UPS { reader }
    }

    pub fn is_reachable(&self) -> Result<bool, UPSError> {
        let sections = self.raw_complete_ups_status(false)?;
        Ok(is_reachable(section(&sections, STATUS_SECTION)?))
    }

    /// Version of the `pwrstat` binary, as printed by `pwrstat -version`.
    pub fn pwrstat_version(&self) -> Result<Option<String>, UPSError> {
        let output = self.reader.read(&["-version"])?;
        Ok(output.lines().find_map(|line| {
            let version = line.trim().strip_prefix("pwrstat version ")?;
            let is_version = version.split('.').count() == 3
                && version
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            is_version.then(|| version.to_string())
        }))
    }

    pub fn raw_daemon_configuration(&self) -> Result<Sections, UPSError> {
        Ok(parse::parse_sections(&self.reader.read(&["-config"])?))
    }

    pub fn daemon_configuration(&self) -> Result<DaemonConfiguration, UPSError> {
        let data = self.raw_daemon_configuration()?;
        let daemon = section(&data, DAEMON_SECTION)?;
        Ok(DaemonConfiguration {
            alarm_enabled: parse::on_off(parse::get(daemon, "Alarm")?)?,
            hibernate_enabled: parse::on_off(parse::get(daemon, "Hibernate")?)?,
            cloud_enabled: parse::on_off(parse::get(daemon, "Cloud")?)?,
            power_failure_action: parse_power_failure_action(section(
                &data,
                POWER_FAILURE_SECTION,
            )?)?,
            low_battery_action: parse_low_battery_action(section(&data, LOW_BATTERY_SECTION)?)?,
        })
    }

    pub fn power_failure_action(&self) -> Result<PowerFailureAction, UPSError> {
        Ok(self.daemon_configuration()?.power_failure_action)
    }

    pub fn low_battery_action(&self) -> Result<LowBatteryAction, UPSError> {
        Ok(self.daemon_configuration()?.low_battery_action)
    }

    pub fn raw_complete_ups_status(&self, check_reachable: bool) -> Result<Sections, UPSError> {
        let sections = parse::parse_sections(&self.reader.read(&["-status"])?);
        if check_reachable && !is_reachable(section(&sections, STATUS_SECTION)?) {
            return Err(UPSError::Unreachable);
        }
        Ok(sections)
    }

    pub fn raw_ups_status(&self, check_reachable: bool) -> Result<PropertyBag, UPSError> {
        let mut sections = self.raw_complete_ups_status(check_reachable)?;
        sections.remove(STATUS_SECTION).ok_or_else(|| {
            UPSError::UnexpectedResponse(format!("missing section '{}'", STATUS_SECTION))
        })
    }

    pub fn raw_ups_properties(&self, check_reachable: bool) -> Result<PropertyBag, UPSError> {
        let mut sections = self.raw_complete_ups_status(check_reachable)?;
        sections.remove(PROPERTIES_SECTION).ok_or_else(|| {
            UPSError::UnexpectedResponse(format!("missing section '{}'", PROPERTIES_SECTION))
        })
    }

    pub fn ups_status(&self) -> Result<UPSStatus, UPSError> {
        let data = self.raw_ups_status(true)?;
        let load = parse::get(&data, "Load")?;
        Ok(UPSStatus {
            battery_capacity_percent: parse::number(parse::get(&data, "Battery Capacity")?)?
                / 100.0,
            last_power_event: parse::power_event(parse::get(&data, "Last Power Event")?),
            line_interaction: parse::get(&data, "Line Interaction")?.to_string(),
            load_percent: parse::load_percent(load)?,
            load_watts: parse::number(load)?,
            output_voltage_volts: parse::number(parse::get(&data, "Output Voltage")?)?,
            power_supply_by: parse::get(&data, "Power Supply by")?.to_string(),
            remaining_runtime: parse::leading_minutes(parse::get(&data, "Remaining Runtime")?)?,
            state: parse::get(&data, "State")?.to_string(),
            test_result: parse::test_result(parse::get(&data, "Test Result")?),
            utility_voltage_volts: parse::number(parse::get(&data, "Utility Voltage")?)?,
        })
    }

    pub fn ups_properties(&self) -> Result<UPSProperties, UPSError> {
        let data = self.raw_ups_properties(true)?;
        Ok(UPSProperties {
            model_name: parse::get(&data, "Model Name")?.to_string(),
            firmware_number: parse::get(&data, "Firmware Number")?.to_string(),
            rating_voltage_volts: parse::number(parse::get(&data, "Rating Voltage")?)?,
            rating_power_watts: parse::number(parse::get(&data, "Rating Power")?)?,
        })
    }

    /// Watch the UPS status, yielding an event for every change seen between
    /// two polls `poll_every` apart.
    pub fn monitor(&self, poll_every: Duration) -> Monitor<&Self> {
        Monitor::new(self, poll_every)
    }

    /// Run the UPS self test (`pwrstat -test`), optionally waiting for its result.
    pub fn test_ups(&self, options: TestOptions) -> Result<Option<TestResult>, UPSError> {
        let previous = self.ups_status()?.test_result;
        if matches!(&previous, Some(r) if r.status == TestStatus::InProgress) {
            return Err(UPSError::NotReady("A test is already in progress".to_string()));
        }

        let output = self.reader.read(&["-test"])?;
        if !output.contains(TEST_INITIATED) {
            return Err(UPSError::CommandFailed(output));
        }
        log::info!("UPS test started.");

        if !options.poll_result {
            return Ok(None);
        }

        let poll_every = options.poll_every.unwrap_or(DEFAULT_TEST_POLL_EVERY);
        let start = Instant::now();
        loop {
            let last = self.ups_status()?.test_result;
            if last != previous {
                if let Some(result) = last.as_ref().filter(|r| r.status != TestStatus::InProgress) {
                    return Ok(Some(result.clone()));
                }
            }

            let elapsed = start.elapsed();
            if matches!(options.timeout, Some(timeout) if elapsed > timeout) {
                return Err(UPSError::Timeout { elapsed, last });
            }
            log::debug!("Waiting for test results, last was {:?}.", last);
            thread::sleep(poll_every);
        }
    }

    pub fn reset_daemon_configuration(&self) -> Result<(), UPSError> {
        self.reader.read(&["-reset"])?;
        Ok(())
    }

    pub fn hibernation_enabled(&self) -> Result<bool, UPSError> {
        Ok(self.daemon_configuration()?.hibernate_enabled)
    }

    pub fn set_hibernation_enabled(&self, enabled: bool) -> Result<(), UPSError> {
        check_setup(self.reader.read(&["-hibernate", parse::on_off_arg(enabled)])?)
    }

    pub fn alarm_enabled(&self) -> Result<bool, UPSError> {
        Ok(self.daemon_configuration()?.alarm_enabled)
    }

    pub fn set_alarm_enabled(&self, enabled: bool) -> Result<(), UPSError> {
        check_setup(self.reader.read(&["-alarm", parse::on_off_arg(enabled)])?)
    }

    /// Temporarily mute the alarm while it is enabled.
    pub fn mute(&self) -> Result<(), UPSError> {
        check_setup(self.reader.read(&["-mute"])?)
    }

    pub fn configure_power_failure_action(
        &self,
        update: &PowerFailureActionUpdate,
    ) -> Result<(), UPSError> {
        self.configure_action(ActionArgs {
            action: "-pwrfail",
            delay: update.delay_time_since_power_failure,
            runtime: None,
            capacity: None,
            active: update.script_command_enabled,
            cmd: update.script_command_path.as_deref(),
            duration: update.script_command_duration,
            shutdown: update.system_shutdown_enabled,
        })
    }

    pub fn configure_low_battery_action(
        &self,
        update: &LowBatteryActionUpdate,
    ) -> Result<(), UPSError> {
        self.configure_action(ActionArgs {
            action: "-lowbatt",
            delay: None,
            runtime: update.remaining_runtime_threshold,
            capacity: update.battery_capacity_threshold_percent,
            active: update.script_command_enabled,
            cmd: update.script_command_path.as_deref(),
            duration: update.script_command_duration,
            shutdown: update.system_shutdown_enabled,
        })
    }

    pub fn configure_cloud(&self, update: &CloudUpdate) -> Result<(), UPSError> {
        let mut args: Vec<String> = vec!["-cloud".to_string()];
        if let Some(enabled) = update.enabled {
            args.extend(["-active".to_string(), parse::on_off_arg(enabled).to_string()]);
        }
        if let Some(account) = &update.account {
            args.extend(["-account".to_string(), account.clone()]);
        }
        if let Some(password) = &update.password {
            args.extend(["-password".to_string(), password.clone()]);
        }
        self.read_setup(&args)
    }

    /// Check PowerPanel can log in to the cloud server.
    pub fn verify_cloud_configuration(&self) -> Result<bool, UPSError> {
        Ok(!self.reader.read(&["-verify"])?.contains(VERIFY_FAILED))
    }

    fn configure_action(&self, action: ActionArgs) -> Result<(), UPSError> {
        let mut args: Vec<String> = vec![action.action.to_string()];
        if let Some(delay) = action.delay {
            args.extend(["-delay".to_string(), delay.as_secs().to_string()]);
        }
        if let Some(runtime) = action.runtime {
            args.extend(["-runtime".to_string(), runtime.as_secs().to_string()]);
        }
        if let Some(capacity) = action.capacity {
            let percent = (parse::check_percent(capacity)? * 100.0).round() as u8;
            args.extend(["-capacity".to_string(), percent.to_string()]);
        }
        if let Some(active) = action.active {
            args.extend(["-active".to_string(), parse::on_off_arg(active).to_string()]);
        }
        if let Some(cmd) = action.cmd {
            args.extend(["-cmd".to_string(), cmd.display().to_string()]);
        }
        if let Some(duration) = action.duration {
            args.extend(["-duration".to_string(), duration.as_secs().to_string()]);
        }
        if let Some(shutdown) = action.shutdown {
            args.extend(["-shutdown".to_string(), parse::on_off_arg(shutdown).to_string()]);
        }
        self.read_setup(&args)
    }

    fn read_setup(&self, args: &[String]) -> Result<(), UPSError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        check_setup(self.reader.read(&args)?)
    }
}

impl<R: Reader> SnapshotProvider for UPS<R> {
    fn fetch(&self) -> Result<UPSStatus, UPSError> {
        self.ups_status()
    }
}

struct ActionArgs<'a> {
    action: &'static str,
    delay: Option<Duration>,
    runtime: Option<Duration>,
    capacity: Option<f64>,
    active: Option<bool>,
    cmd: Option<&'a Path>,
    duration: Option<Duration>,
    shutdown: Option<bool>,
}
