use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const SECS_PER_MINUTE: u128 = 60;
const SECS_PER_HOUR: u128 = 3_600;

/// Renders a latency in compact unit notation: `0s`, `850ns`, `1.5µs`,
/// `123.456ms`, `2.5s`, `1m2.5s`, `1h0m0s`. Fractions keep full precision
/// with trailing zeros removed.
#[must_use]
pub fn format_latency(latency: Duration) -> String {
    let nanos = latency.as_nanos();
    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", scaled(nanos, NANOS_PER_MICRO, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", scaled(nanos, NANOS_PER_MILLI, 6));
    }

    let total_secs = nanos.checked_div(NANOS_PER_SEC).unwrap_or(0);
    let sub_nanos = nanos.checked_rem(NANOS_PER_SEC).unwrap_or(0);
    let hours = total_secs.checked_div(SECS_PER_HOUR).unwrap_or(0);
    let minutes = total_secs
        .checked_rem(SECS_PER_HOUR)
        .and_then(|rest| rest.checked_div(SECS_PER_MINUTE))
        .unwrap_or(0);
    let secs = total_secs.checked_rem(SECS_PER_MINUTE).unwrap_or(0);
    let seconds = with_fraction(secs, sub_nanos, 9);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn scaled(nanos: u128, unit: u128, digits: usize) -> String {
    let whole = nanos.checked_div(unit).unwrap_or(0);
    let fraction = nanos.checked_rem(unit).unwrap_or(0);
    with_fraction(whole, fraction, digits)
}

fn with_fraction(whole: u128, fraction: u128, digits: usize) -> String {
    if fraction == 0 {
        return whole.to_string();
    }
    let padded = format!("{:0width$}", fraction, width = digits);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}
