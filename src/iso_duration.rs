//! ISO 8601 text for durations, e.g. `PT2H9M`, for use with
//! `#[serde(with = "crate::iso_duration")]`.

use std::{fmt::Write, time::Duration};

use serde::{de, Deserialize, Deserializer, Serializer};

const DAY: u64 = 86_400;

pub fn format(duration: &Duration) -> String {
    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    let (days, rem) = (secs / DAY, secs % DAY);
    let (hours, minutes, seconds) = (rem / 3600, rem % 3600 / 60, rem % 60);

    let mut out = String::from("P");
    if days > 0 {
        let _ = write!(out, "{}D", days);
    }
    if rem == 0 && nanos == 0 && days > 0 {
        return out;
    }
    out.push('T');
    if hours > 0 {
        let _ = write!(out, "{}H", hours);
    }
    if minutes > 0 {
        let _ = write!(out, "{}M", minutes);
    }
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        let _ = write!(out, "{}.{}S", seconds, fraction.trim_end_matches('0'));
    } else if seconds > 0 || out.ends_with('T') {
        let _ = write!(out, "{}S", seconds);
    }
    out
}

pub fn parse(text: &str) -> Option<Duration> {
    let rest = text.strip_prefix('P')?;
    let (date, time) = match rest.split_once('T') {
        Some((_, "")) => return None,
        Some((date, time)) => (date, time),
        None if rest.is_empty() => return None,
        None => (rest, ""),
    };
    let secs = components(date, &[('W', 7 * DAY), ('D', DAY)])?
        + components(time, &[('H', 3600), ('M', 60), ('S', 1)])?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Sum `<number><designator>` pairs, designators in the given order.
fn components(mut part: &str, units: &[(char, u64)]) -> Option<f64> {
    let mut units = units.iter();
    let mut total = 0.0;
    while !part.is_empty() {
        let end = part.find(|c: char| c.is_ascii_alphabetic())?;
        let value: f64 = part[..end].parse().ok()?;
        let designator = part[end..].chars().next()?;
        let (_, scale) = units.find(|(unit, _)| *unit == designator)?;
        total += value * *scale as f64;
        part = &part[end + 1..];
    }
    Some(total)
}

pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(duration))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse(&text)
        .ok_or_else(|| de::Error::custom(format!("invalid ISO 8601 duration '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_iso_8601() {
        assert_eq!(format(&Duration::ZERO), "PT0S");
        assert_eq!(format(&Duration::from_secs(24)), "PT24S");
        assert_eq!(format(&Duration::from_secs(129 * 60)), "PT2H9M");
        assert_eq!(format(&Duration::from_secs(3661)), "PT1H1M1S");
        assert_eq!(format(&Duration::from_secs(DAY)), "P1D");
        assert_eq!(format(&Duration::from_secs(DAY + 600)), "P1DT10M");
        assert_eq!(format(&Duration::from_millis(1500)), "PT1.5S");
    }

    #[test]
    fn parses_what_it_formats() {
        for secs in [0, 24, 7740, 3661, DAY, DAY + 600] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse(&format(&d)), Some(d));
        }
        assert_eq!(parse("PT1.5S"), Some(Duration::from_millis(1500)));
        assert_eq!(parse("P1W"), Some(Duration::from_secs(7 * DAY)));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in ["", "P", "PT", "2H", "PT2X", "PT9M2H", "PT-1S", "P1H", "PTS"] {
            assert_eq!(parse(bad), None, "{:?}", bad);
        }
    }
}
