use crate::{
    event::{Event, FieldValue},
    status::UPSStatus,
};

type Accessor = fn(&UPSStatus) -> FieldValue;

/// Compared fields, in the order their changes are reported.
/// Test results and power events are compared as whole values.
const FIELDS: [(&str, Accessor); 11] = [
    ("battery_capacity_percent", |s| {
        FieldValue::Number(s.battery_capacity_percent)
    }),
    ("last_power_event", |s| {
        FieldValue::PowerEvent(s.last_power_event.clone())
    }),
    ("line_interaction", |s| {
        FieldValue::Text(s.line_interaction.clone())
    }),
    ("load_percent", |s| FieldValue::Number(s.load_percent)),
    ("load_watts", |s| FieldValue::Number(s.load_watts)),
    ("output_voltage_volts", |s| {
        FieldValue::Number(s.output_voltage_volts)
    }),
    ("power_supply_by", |s| FieldValue::Text(s.power_supply_by.clone())),
    ("remaining_runtime", |s| FieldValue::Duration(s.remaining_runtime)),
    ("state", |s| FieldValue::Text(s.state.clone())),
    ("test_result", |s| FieldValue::TestResult(s.test_result.clone())),
    ("utility_voltage_volts", |s| {
        FieldValue::Number(s.utility_voltage_volts)
    }),
];

/// Work out the events explaining the move from `previous` to `current`.
/// `None` on either side means the UPS could not be reached.
pub fn diff(previous: Option<&UPSStatus>, current: Option<&UPSStatus>) -> Vec<Event> {
    match (previous, current) {
        (None, None) => Vec::new(),
        (None, Some(current)) => vec![Event::reachable(current)],
        (Some(previous), None) => vec![Event::unreachable(previous)],
        (Some(previous), Some(current)) => FIELDS
            .iter()
            .filter_map(|(name, get)| {
                let (before, after) = (get(previous), get(current));
                if before == after {
                    None
                } else {
                    Some(Event::value_changed(*name, before, after, previous, current))
                }
            })
            .collect(),
    }
}
