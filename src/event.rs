use std::{fmt, time::Duration};

use serde::Serialize;

use crate::status::{PowerEvent, TestResult, UPSStatus};

/// The value of a single `UPSStatus` field, as carried by a change event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Duration(#[serde(with = "crate::iso_duration")] Duration),
    TestResult(Option<TestResult>),
    PowerEvent(Option<PowerEvent>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Duration(d) => write!(f, "{}s", d.as_secs()),
            FieldValue::TestResult(None) | FieldValue::PowerEvent(None) => write!(f, "None"),
            FieldValue::TestResult(Some(r)) => match r.test_time {
                Some(t) => write!(f, "{} at {}", r.status.label(), t),
                None => write!(f, "{}", r.status.label()),
            },
            FieldValue::PowerEvent(Some(e)) => write!(
                f,
                "{} at {} for {} sec.",
                e.event_type,
                e.event_time,
                e.duration.as_secs()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventMetadata {
    ValueChanged {
        field_name: &'static str,
        previous_value: FieldValue,
        new_value: FieldValue,
    },
    ReachabilityChanged {
        reachable: bool,
    },
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventMetadata::ValueChanged {
                field_name,
                previous_value,
                new_value,
            } => write!(
                f,
                "{} changed from {} to {}",
                field_name, previous_value, new_value
            ),
            EventMetadata::ReachabilityChanged { reachable: true } => {
                write!(f, "UPS is reachable")
            }
            EventMetadata::ReachabilityChanged { reachable: false } => {
                write!(f, "UPS is not reachable")
            }
        }
    }
}

/// A single detected change between two consecutive polls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_metadata: EventMetadata,
    pub previous_state: Option<UPSStatus>,
    pub new_state: Option<UPSStatus>,
}

impl Event {
    pub fn value_changed(
        field_name: &'static str,
        previous_value: FieldValue,
        new_value: FieldValue,
        previous_state: &UPSStatus,
        new_state: &UPSStatus,
    ) -> Event {
        Event {
            event_metadata: EventMetadata::ValueChanged {
                field_name,
                previous_value,
                new_value,
            },
            previous_state: Some(previous_state.clone()),
            new_state: Some(new_state.clone()),
        }
    }

    pub fn reachable(new_state: &UPSStatus) -> Event {
        Event {
            event_metadata: EventMetadata::ReachabilityChanged { reachable: true },
            previous_state: None,
            new_state: Some(new_state.clone()),
        }
    }

    pub fn unreachable(previous_state: &UPSStatus) -> Event {
        Event {
            event_metadata: EventMetadata::ReachabilityChanged { reachable: false },
            previous_state: Some(previous_state.clone()),
            new_state: None,
        }
    }
}
