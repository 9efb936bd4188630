use chrono::{FixedOffset, NaiveDate, NaiveDateTime};

/// Extended-format patterns for the local part, after the separator has
/// been normalised to `T` and any zone designator split off.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A timestamp as written: its wall-clock time and UTC offset, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

/// Parse an ISO 8601 timestamp into the wall-clock time it names.
///
/// A UTC offset, when present, is validated and reported but not applied to
/// `local`, so `2025-01-31T23:30:00-05:00` stays on January 31st. Bare
/// dates parse as midnight. Returns `None` for empty or unrecognised input.
///
/// Accepts extended (`2025-01-05T10:00:00`) and basic (`20250105T100000`)
/// forms, a `T`, `t` or space separator, hour, minute or second precision,
/// fractions with `.` or `,`, and offsets written as `Z`, `±HH`, `±HHMM`
/// or `±HH:MM`.
pub fn parse_timestamp(s: &str) -> Option<ParsedTimestamp> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let text = expand_basic_format(&s.to_ascii_uppercase().replace(',', "."));
    if !text.is_char_boundary(10) {
        return None;
    }
    let (date, rest) = text.split_at(10);

    if rest.is_empty() {
        let local = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?;
        return Some(ParsedTimestamp {
            local,
            offset: None,
        });
    }

    let time = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;
    let (clock, offset) = split_offset(time)?;
    // Hour precision: chrono needs at least minutes.
    let clock = if clock.len() == 2 {
        format!("{clock}:00")
    } else {
        clock.to_string()
    };

    let candidate = format!("{date}T{clock}");
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&candidate, fmt).ok())
        .map(|local| ParsedTimestamp { local, offset })
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Rewrite `YYYYMMDD[THH[MM[SS]]...]` into the extended form. Anything else
/// is returned unchanged.
fn expand_basic_format(s: &str) -> String {
    let bytes = s.as_bytes();
    let basic_date = bytes.len() >= 8
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && (bytes.len() == 8 || bytes[8] == b'T');
    if !basic_date {
        return s.to_string();
    }

    let date = format!("{}-{}-{}", &s[..4], &s[4..6], &s[6..8]);
    let Some(time) = s[8..].strip_prefix('T') else {
        return date;
    };

    let digits = time.bytes().take_while(u8::is_ascii_digit).count();
    let clock = match digits {
        2 => time[..2].to_string(),
        4 => format!("{}:{}", &time[..2], &time[2..4]),
        6 => format!("{}:{}:{}", &time[..2], &time[2..4], &time[4..6]),
        _ => return s.to_string(),
    };
    format!("{date}T{clock}{}", &time[digits..])
}

/// Split a trailing zone designator off the time of day.
///
/// Returns `None` when a designator is present but invalid.
fn split_offset(time: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = time.strip_suffix('Z') {
        return Some((clock, FixedOffset::east_opt(0)));
    }
    match time.rfind(|c: char| c == '+' || c == '-') {
        Some(pos) => {
            let offset = parse_offset(&time[pos..])?;
            Some((&time[..pos], Some(offset)))
        }
        None => Some((time, None)),
    }
}

/// Parse `±HH`, `±HHMM` or `±HH:MM`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let sign = match s.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = s[1..].chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes): (i32, i32) = match digits.len() {
        2 => (digits.parse().ok()?, 0),
        4 => (digits[..2].parse().ok()?, digits[2..].parse().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
