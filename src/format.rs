// Human-readable units: binary byte sizes, count suffixes, uptime strings.

use crate::models::{ByteValue, CountValue};

const BYTE_FACTOR: f64 = 1024.0;
const BYTE_PREFIXES: [&str; 6] = ["K", "M", "G", "T", "P", "E"];

const COUNT_FACTOR: f64 = 1000.0;
const COUNT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Scale a byte quantity to the largest binary unit that keeps the value
/// under 1024. Values under 1024 stay in plain `B`; values past EiB stay
/// in EiB. Total for non-negative finite input.
pub fn format_bytes(bytes: f64) -> ByteValue {
    if bytes < BYTE_FACTOR {
        let value = trim_fixed(bytes);
        let display = format!("{value} B");
        return ByteValue {
            value,
            unit: "B".into(),
            display,
        };
    }

    let mut div = BYTE_FACTOR;
    let mut exp = 0usize;
    while bytes / div >= BYTE_FACTOR && exp < BYTE_PREFIXES.len() - 1 {
        div *= BYTE_FACTOR;
        exp += 1;
    }

    let value = trim_fixed(bytes / div);
    let unit = format!("{}iB", BYTE_PREFIXES[exp]);
    let display = format!("{value} {unit}");
    ByteValue {
        value,
        unit,
        display,
    }
}

/// Abbreviate a count with the largest K/M/B/T suffix that keeps the value
/// under 1000; values past T stay in T. Unscaled counts get an empty unit,
/// so `display` ends with a trailing space.
pub fn abbreviate_num(n: f64) -> CountValue {
    let mut n = n;
    let mut suffix = 0usize;
    while n >= COUNT_FACTOR && suffix < COUNT_SUFFIXES.len() - 1 {
        n /= COUNT_FACTOR;
        suffix += 1;
    }

    let value = trim_fixed(n);
    let unit = COUNT_SUFFIXES[suffix].to_string();
    let display = format!("{value} {unit}");
    CountValue {
        value,
        unit,
        display,
    }
}

/// Round to two decimals, then drop trailing fractional zeros (and a bare
/// dot): "2.00" -> "2", "2.50" -> "2.5".
fn trim_fixed(v: f64) -> String {
    format!("{v:.2}")
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Split a compact uptime string like "2d3h40m" into its `<digits><letters>`
/// tokens and join them with spaces. Unmatched input (including a trailing
/// digit run with no letters) is dropped; no tokens yields an empty string.
pub fn format_uptime(uptime: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut it = uptime.char_indices().peekable();

    loop {
        while it.peek().is_some_and(|&(_, c)| !c.is_ascii_digit()) {
            it.next();
        }
        let Some(&(start, _)) = it.peek() else { break };
        while it.peek().is_some_and(|&(_, c)| c.is_ascii_digit()) {
            it.next();
        }
        if it.peek().is_none() {
            break;
        }
        while it.peek().is_some_and(|&(_, c)| !c.is_ascii_digit()) {
            it.next();
        }
        let end = it.peek().map_or(uptime.len(), |&(i, _)| i);
        parts.push(&uptime[start..end]);
    }

    parts.join(" ")
}

/// Difference `a - b` in milliseconds between two RFC 3339 timestamps;
/// negative when `a` precedes `b`.
pub fn ms_time_diff(a: &str, b: &str) -> chrono::ParseResult<i64> {
    let a = chrono::DateTime::parse_from_rfc3339(a)?;
    let b = chrono::DateTime::parse_from_rfc3339(b)?;
    Ok(a.signed_duration_since(b).num_milliseconds())
}
