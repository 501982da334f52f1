// Time formatting helpers shared by the stream pages and the ranking table.

use crate::state::Elapsed;

/// Packed-total weight of the top clock field (60 * 100 centiseconds).
pub const TOP_UNIT: u64 = 6000;
/// Packed-total weight of the middle clock field.
pub const MID_UNIT: u64 = 100;

/// Left-pads `value` with zeros up to `width`. Longer values are kept as-is.
pub fn pad0(value: u64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Formats an accumulator triple as `AA:BB:CC`. No carry is applied here,
/// the last field is only floored.
pub fn format_clock(t: &Elapsed) -> String {
    format!(
        "{}:{}:{}",
        pad0(t.minutes, 2),
        pad0(t.seconds, 2),
        pad0(t.centiseconds.max(0.0).floor() as u64, 2)
    )
}

/// Coarsest non-zero `day/hour/min/sec` rendering of a millisecond count,
/// without any field padding.
pub fn format_duration(total_ms: u64) -> String {
    let mut t = total_ms / 1000;
    let sec = t % 60;
    t /= 60;
    if t == 0 {
        return format!("{}", sec);
    }
    let min = t % 60;
    t /= 60;
    if t == 0 {
        return format!("{}:{}", min, sec);
    }
    let hour = t % 24;
    let day = t / 24;
    if day == 0 {
        return format!("{}:{}:{}", hour, min, sec);
    }
    format!("{}days  {}:{}:{}", day, hour, min, sec)
}

/// Packs a clock triple into the integer sent to the ranking service.
pub fn pack_total(minutes: u64, seconds: u64, centiseconds: f64) -> u64 {
    let packed = (minutes * TOP_UNIT + seconds * MID_UNIT) as f64 + centiseconds.max(0.0);
    packed.floor() as u64
}

/// Inverse of [`pack_total`]: `(mm, ss, cc)`.
pub fn decode_total(packed: u64) -> (u64, u64, u64) {
    let mm = packed / TOP_UNIT;
    let rest = packed % TOP_UNIT;
    (mm, rest / MID_UNIT, rest % MID_UNIT)
}

/// `MM:SS:CC` rendering of a packed total, as shown in the ranking table.
pub fn format_packed(packed: u64) -> String {
    let (mm, ss, cc) = decode_total(packed);
    format!("{}:{}:{}", pad0(mm, 2), pad0(ss, 2), pad0(cc, 2))
}

/// Shorthand for debug output that should not survive into release consoles.
pub fn clog(msg: &str) {
    log::debug!("{}", msg);
}

pub fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// `location.replace(url)`; leaves no history entry.
pub fn replace_location(url: &str) {
    if let Some(win) = web_sys::window() {
        if win.location().replace(url).is_err() {
            log::warn!("could not navigate to {}", url);
        }
    }
}

pub fn reload_page() {
    if let Some(win) = web_sys::window() {
        let _ = win.location().reload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(minutes: u64, seconds: u64, centiseconds: f64) -> Elapsed {
        Elapsed {
            minutes,
            seconds,
            centiseconds,
        }
    }

    #[test]
    fn test_pad0() {
        assert_eq!(pad0(0, 2), "00");
        assert_eq!(pad0(7, 2), "07");
        assert_eq!(pad0(123, 2), "123");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(&clock(0, 0, 0.0)), "00:00:00");
        assert_eq!(format_clock(&clock(1, 2, 65.4)), "01:02:65");
        assert_eq!(format_clock(&clock(120, 59, 99.99)), "120:59:99");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0");
        assert_eq!(format_duration(999), "0");
        assert_eq!(format_duration(59_000), "59");
        assert_eq!(format_duration(60_000), "1:0");
        assert_eq!(format_duration(61_500), "1:1");
        assert_eq!(format_duration(3_600_000), "1:0:0");
        assert_eq!(format_duration(86_399_000), "23:59:59");
        assert_eq!(format_duration(90_000_000), "1days  1:0:0");
    }

    #[test]
    fn test_pack_decode() {
        assert_eq!(pack_total(0, 0, 0.0), 0);
        assert_eq!(pack_total(1, 2, 3.9), 6203);
        assert_eq!(decode_total(6203), (1, 2, 3));
        for (m, s, c) in [(0, 0, 0.0), (3, 59, 99.5), (61, 7, 12.0), (0, 1, 0.25)] {
            assert_eq!(decode_total(pack_total(m, s, c)), (m, s, c.floor() as u64));
        }
    }

    #[test]
    fn test_format_packed() {
        assert_eq!(format_packed(0), "00:00:00");
        assert_eq!(format_packed(6203), "01:02:03");
        assert_eq!(format_packed(600_000), "100:00:00");
    }
}
