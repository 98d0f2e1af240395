use std::{
    error::Error,
    path::{Path, PathBuf},
    process::exit,
    time::Duration,
};

use clap::{Parser, Subcommand};
use env_logger::Env;
use figment::{
    providers::{Env as EnvProvider, Format, Serialized, Toml},
    Figment,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use upstat::{
    mailer::{Mailer, MailerSettings},
    reader::DEFAULT_PWRSTAT_PATH,
    CloudUpdate, LowBatteryActionUpdate, PowerFailureActionUpdate, PwrstatReader, TestOptions,
    UPS,
};

// The following define polling behaviour.
const POLL_EVERY: f64 = 5.0; // Seconds to wait between monitor polls.
const TEST_POLL_EVERY: f64 = 1.0; // Seconds to wait between polls for test results.

#[derive(Deserialize, Serialize, Debug)]
struct Settings {
    pwrstat_path: PathBuf,
    sudo: bool,
    poll_every: f64,
    test_poll_every: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pwrstat_path: PathBuf::from(DEFAULT_PWRSTAT_PATH),
            sudo: false,
            poll_every: POLL_EVERY,
            test_poll_every: TEST_POLL_EVERY,
        }
    }
}

#[derive(Parser)]
#[clap(name = "upstat", version, about = "Query and monitor a UPS through pwrstat")]
struct Cli {
    /// Path to the configuration file.
    #[clap(short, long, default_value = "upstat.toml")]
    config: PathBuf,

    /// Path to the mailer configuration file, events are mailed when present.
    #[clap(long, default_value = "mailer.toml")]
    mailer_config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current UPS status.
    Status,
    /// Print the UPS properties (model, firmware, ratings).
    Properties,
    /// Print the pwrstat daemon configuration.
    Config,
    /// Print the pwrstat version.
    Version,
    /// Print whether the UPS is reachable.
    Reachable,
    /// Print UPS status changes as they happen, one JSON object per line.
    Monitor {
        /// Seconds between polls.
        #[clap(long)]
        poll_every: Option<f64>,
    },
    /// Run the UPS self test.
    Test {
        /// Return as soon as the test is started.
        #[clap(long)]
        no_wait: bool,
        /// Give up waiting after this many seconds.
        #[clap(long)]
        timeout: Option<f64>,
        /// Seconds between polls for the result.
        #[clap(long)]
        poll_every: Option<f64>,
    },
    /// Reset the daemon configuration to its defaults.
    Reset,
    /// Enable or disable the UPS alarm.
    Alarm {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Enable or disable hibernation instead of shutdown.
    Hibernate {
        #[clap(value_enum)]
        state: Toggle,
    },
    /// Temporarily mute the alarm.
    Mute,
    /// Configure the power failure action.
    PowerFailure {
        #[clap(long)]
        delay: Option<u64>,
        #[clap(long, value_enum)]
        active: Option<Toggle>,
        #[clap(long)]
        cmd: Option<PathBuf>,
        #[clap(long)]
        duration: Option<u64>,
        #[clap(long, value_enum)]
        shutdown: Option<Toggle>,
    },
    /// Configure the low battery action.
    LowBattery {
        #[clap(long)]
        runtime: Option<u64>,
        /// Battery capacity threshold, between 0.0 and 1.0.
        #[clap(long)]
        capacity: Option<f64>,
        #[clap(long, value_enum)]
        active: Option<Toggle>,
        #[clap(long)]
        cmd: Option<PathBuf>,
        #[clap(long)]
        duration: Option<u64>,
        #[clap(long, value_enum)]
        shutdown: Option<Toggle>,
    },
    /// Configure the cloud service.
    Cloud {
        #[clap(long, value_enum)]
        active: Option<Toggle>,
        #[clap(long)]
        account: Option<String>,
        #[clap(long)]
        password: Option<String>,
    },
    /// Check the daemon can log in to the cloud service.
    Verify,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(t: Toggle) -> bool {
        matches!(t, Toggle::On)
    }
}

fn seconds(secs: f64) -> Result<Duration, Box<dyn Error>> {
    Ok(Duration::try_from_secs_f64(secs)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn load_mailer(path: &Path) -> Option<Mailer> {
    if !path.exists() {
        debug!("No mailer configuration at {}.", path.display());
        return None;
    }
    let settings: MailerSettings = match Figment::new().merge(Toml::file(path)).extract() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to read mailer config, not sending emails: {}", e);
            return None;
        }
    };
    match Mailer::new(settings) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            warn!("Failed to set up mailer, not sending emails: {}", e);
            None
        }
    }
}

fn monitor(
    ups: &UPS<PwrstatReader>,
    poll_every: Duration,
    mailer: Option<Mailer>,
) -> Result<(), Box<dyn Error>> {
    info!("UPS monitor running, polling every {:?}.", poll_every);
    for event in ups.monitor(poll_every) {
        let event = event?;
        info!("{}", event.event_metadata);
        println!("{}", serde_json::to_string(&event)?);

        if let Some(mailer) = &mailer {
            if let Err(e) = mailer.notify(&event) {
                error!("Failed to send email: {}", e);
            }
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
        .merge(Toml::file(&cli.config))
        .merge(EnvProvider::prefixed("UPSTAT_"))
        .extract()?;
    debug!("{:#?}", settings);

    let ups = UPS::new(PwrstatReader::new(&settings.pwrstat_path, settings.sudo)?);

    match cli.command {
        Command::Status => print_json(&ups.ups_status()?)?,
        Command::Properties => print_json(&ups.ups_properties()?)?,
        Command::Config => print_json(&ups.daemon_configuration()?)?,
        Command::Version => print_json(&ups.pwrstat_version()?)?,
        Command::Reachable => print_json(&ups.is_reachable()?)?,
        Command::Monitor { poll_every } => {
            let poll_every = seconds(poll_every.unwrap_or(settings.poll_every))?;
            monitor(&ups, poll_every, load_mailer(&cli.mailer_config))?
        }
        Command::Test {
            no_wait,
            timeout,
            poll_every,
        } => {
            let options = TestOptions {
                poll_result: !no_wait,
                timeout: timeout.map(seconds).transpose()?,
                poll_every: Some(seconds(poll_every.unwrap_or(settings.test_poll_every))?),
            };
            print_json(&ups.test_ups(options)?)?
        }
        Command::Reset => ups.reset_daemon_configuration()?,
        Command::Alarm { state } => ups.set_alarm_enabled(state.into())?,
        Command::Hibernate { state } => ups.set_hibernation_enabled(state.into())?,
        Command::Mute => ups.mute()?,
        Command::PowerFailure {
            delay,
            active,
            cmd,
            duration,
            shutdown,
        } => ups.configure_power_failure_action(&PowerFailureActionUpdate {
            script_command_enabled: active.map(bool::from),
            delay_time_since_power_failure: delay.map(Duration::from_secs),
            script_command_duration: duration.map(Duration::from_secs),
            script_command_path: cmd,
            system_shutdown_enabled: shutdown.map(bool::from),
        })?,
        Command::LowBattery {
            runtime,
            capacity,
            active,
            cmd,
            duration,
            shutdown,
        } => ups.configure_low_battery_action(&LowBatteryActionUpdate {
            script_command_enabled: active.map(bool::from),
            remaining_runtime_threshold: runtime.map(Duration::from_secs),
            battery_capacity_threshold_percent: capacity,
            script_command_duration: duration.map(Duration::from_secs),
            script_command_path: cmd,
            system_shutdown_enabled: shutdown.map(bool::from),
        })?,
        Command::Cloud {
            active,
            account,
            password,
        } => ups.configure_cloud(&CloudUpdate {
            enabled: active.map(bool::from),
            account,
            password,
        })?,
        Command::Verify => print_json(&ups.verify_cloud_configuration()?)?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{}", e);
        exit(1)
    }
}
