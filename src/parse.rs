//! Parsing of the text reports printed by `pwrstat`.
//!
//! The reports are made of section headers (`Current UPS status:`) followed by
//! dotted property lines (`State........................ Normal`).

use std::{collections::BTreeMap, str::FromStr, time::Duration};

use chrono::NaiveDateTime;

use crate::{
    error::UPSError,
    status::{PowerEvent, TestResult, TestStatus},
};

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub type PropertyBag = BTreeMap<String, String>;
pub type Sections = BTreeMap<String, PropertyBag>;

pub fn parse_sections(output: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;

    for line in output.lines() {
        if let Some(name) = section_header(line) {
            current = Some(name.to_string());
            sections.entry(name.to_string()).or_default();
            continue;
        }
        if let Some((key, value)) = property(line) {
            match &current {
                Some(section) => {
                    sections
                        .entry(section.clone())
                        .or_default()
                        .insert(key.to_string(), value.to_string());
                }
                None => log::debug!("Skipping property outside of a section: {:?}", line),
            }
        }
    }

    sections
}

fn section_header(line: &str) -> Option<&str> {
    let name = line.trim_start().strip_suffix(':')?;
    if name.is_empty() || name.contains(':') {
        return None;
    }
    Some(name)
}

fn property(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    let dot = line.find('.')?;
    let key = line[..dot].trim();
    let rest = line[dot..].trim_start_matches('.');
    // At least one whitespace must separate the dots from the value.
    if key.is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let value = rest.trim();
    if value.is_empty() {
        return None;
    }
    Some((key, value))
}

pub fn get<'a>(bag: &'a PropertyBag, key: &str) -> Result<&'a str, UPSError> {
    bag.get(key)
        .map(String::as_str)
        .ok_or_else(|| UPSError::UnexpectedResponse(format!("missing property '{}'", key)))
}

/// Parse the first whitespace separated token, e.g. `230` out of `230 V`.
pub fn leading<T>(raw: &str) -> Result<T, UPSError>
where
    T: FromStr,
    UPSError: From<T::Err>,
{
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| UPSError::UnexpectedResponse(format!("empty value '{}'", raw)))?;
    Ok(token.parse()?)
}

/// Like [`leading`] for readings, which must be finite.
pub fn number(raw: &str) -> Result<f64, UPSError> {
    let value: f64 = leading(raw)?;
    if !value.is_finite() {
        return Err(UPSError::UnexpectedResponse(format!(
            "expected a number, got '{}'",
            raw
        )));
    }
    Ok(value)
}

pub fn leading_seconds(raw: &str) -> Result<Duration, UPSError> {
    Ok(Duration::from_secs(leading(raw)?))
}

pub fn leading_minutes(raw: &str) -> Result<Duration, UPSError> {
    Ok(Duration::from_secs(leading::<u64>(raw)? * 60))
}

/// `27 Watt(3 %)` gives 0.03.
pub fn load_percent(raw: &str) -> Result<f64, UPSError> {
    let unexpected =
        || UPSError::UnexpectedResponse(format!("could not parse load (%) from '{}'", raw));
    let (_, percent) = raw.split_once("Watt(").ok_or_else(unexpected)?;
    let percent = percent
        .strip_suffix(')')
        .and_then(|p| p.trim().strip_suffix('%'))
        .ok_or_else(unexpected)?
        .trim();
    let percent: u32 = percent.parse().map_err(|_| unexpected())?;
    Ok(f64::from(percent) / 100.0)
}

fn timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIME_FORMAT).ok()
}

pub fn test_result(raw: &str) -> Option<TestResult> {
    let raw = raw.trim();
    if raw == "None" {
        return None;
    }
    if raw == "In progress" {
        return Some(TestResult {
            status: TestStatus::InProgress,
            test_time: None,
        });
    }
    let (word, time) = raw.split_once(" at ")?;
    let status = if word.trim() == "Passed" {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    };
    Some(TestResult {
        status,
        test_time: Some(timestamp(time)?),
    })
}

/// `Blackout at 2022/07/21 15:10:43 for 24 sec.`
pub fn power_event(raw: &str) -> Option<PowerEvent> {
    let raw = raw.trim().strip_suffix(" sec.")?;
    let (head, seconds) = raw.rsplit_once(" for ")?;
    let (event_type, time) = head.rsplit_once(" at ")?;
    let event_type = event_type.trim();
    if event_type.is_empty() {
        return None;
    }
    Some(PowerEvent {
        event_type: event_type.to_string(),
        event_time: timestamp(time)?,
        duration: Duration::from_secs(seconds.trim().parse().ok()?),
    })
}

pub fn on_off(raw: &str) -> Result<bool, UPSError> {
    match raw.trim().to_lowercase().as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(UPSError::UnexpectedResponse(format!(
            "expected 'on' or 'off', got '{}'",
            raw
        ))),
    }
}

pub fn on_off_arg(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn check_percent(value: f64) -> Result<f64, UPSError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(UPSError::InvalidPercent(value))
    }
}
