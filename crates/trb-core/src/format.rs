//! Human-readable rendering of byte counts and durations.

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Renders a byte count as `B`, `KiB`, `MiB`, or `GiB` (powers of 1024,
/// two decimals for the non-byte units).
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.2} KiB", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    }
}

/// Renders a duration in seconds as `{s}s`, `{m}m {s}s`, or `{h}h {m}m {s}s`.
///
/// Whole units are truncated, not rounded. Zero, negative, or non-finite
/// input renders as `0s` (ETA math can produce all three).
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0s".to_string();
    }
    let total = seconds as u64;
    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_bytes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn size_units() {
        assert_eq!(format_size(1536), "1.50 KiB");
        assert_eq!(format_size(1024 * 1024), "1.00 MiB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GiB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 / 2), "2.50 GiB");
    }

    #[test]
    fn duration_magnitudes() {
        assert_eq!(format_duration(45.0), "45s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn duration_truncates() {
        assert_eq!(format_duration(59.9), "59s");
        assert_eq!(format_duration(119.9), "1m 59s");
    }

    #[test]
    fn duration_degenerate_inputs() {
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(-3.0), "0s");
        assert_eq!(format_duration(f64::NAN), "0s");
        assert_eq!(format_duration(f64::INFINITY), "0s");
    }
}
