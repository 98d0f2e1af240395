use std::{path::PathBuf, process::Command};

use crate::error::UPSError;

pub const DEFAULT_PWRSTAT_PATH: &str = "/usr/sbin/pwrstat";

/// Runs `pwrstat` with the given arguments and hands back what it printed.
pub trait Reader {
    fn read(&self, args: &[&str]) -> Result<String, UPSError>;
}

pub struct PwrstatReader {
    pwrstat_path: PathBuf,
    sudo: bool,
}

impl PwrstatReader {
    pub fn new(pwrstat_path: impl Into<PathBuf>, sudo: bool) -> Result<PwrstatReader, UPSError> {
        let pwrstat_path = pwrstat_path.into();
        if !pwrstat_path.is_file() {
            return Err(UPSError::MissingBinary(pwrstat_path));
        }
        Ok(PwrstatReader { pwrstat_path, sudo })
    }

    fn command(&self) -> Command {
        if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.pwrstat_path);
            cmd
        } else {
            Command::new(&self.pwrstat_path)
        }
    }
}

impl Reader for PwrstatReader {
    fn read(&self, args: &[&str]) -> Result<String, UPSError> {
        log::debug!("Running {} {:?}", self.pwrstat_path.display(), args);

        let output = self.command().args(args).output()?;
        let full_output = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout).trim(),
            String::from_utf8_lossy(&output.stderr).trim()
        );

        if !output.status.success() {
            return Err(UPSError::CommandFailed(format!(
                "Failed to run {} {:?} ({}). Full pwrstat output: {}",
                self.pwrstat_path.display(),
                args,
                output.status,
                full_output
            )));
        }

        Ok(full_output)
    }
}

impl<R: Reader + ?Sized> Reader for &R {
    fn read(&self, args: &[&str]) -> Result<String, UPSError> {
        (**self).read(args)
    }
}
