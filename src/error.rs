use std::{
    io,
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
    time::Duration,
};

use crate::status::TestResult;

#[derive(Debug, thiserror::Error)]
pub enum UPSError {
    #[error("pwrstat is not installed at '{}'", .0.display())]
    MissingBinary(PathBuf),
    #[error("UPS is not reachable")]
    Unreachable,
    #[error("{0}")]
    NotReady(String),
    #[error("{0}")]
    CommandFailed(String),
    #[error("setup failed, full pwrstat output: {0}")]
    SetupFailed(String),
    #[error(
        "timed out waiting for test results after {}s, last status was '{}'",
        .elapsed.as_secs_f64(),
        last_status(.last)
    )]
    Timeout {
        elapsed: Duration,
        last: Option<TestResult>,
    },
    #[error("unexpected pwrstat output: {0}")]
    UnexpectedResponse(String),
    #[error("percent should be a value between 0.0 and 1.0 (inclusive), not '{0}'")]
    InvalidPercent(f64),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
}

impl UPSError {
    /// Unreachable is the only kind the monitor folds into its event stream.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, UPSError::Unreachable)
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, UPSError::NotReady(_) | UPSError::Unreachable)
    }

    pub fn is_command_failed(&self) -> bool {
        matches!(self, UPSError::CommandFailed(_) | UPSError::SetupFailed(_))
    }
}

fn last_status(last: &Option<TestResult>) -> &'static str {
    last.as_ref().map_or("unknown", |r| r.status.label())
}
