const SI_UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
const IEC_UNITS: [&str; 8] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];

/// Render a byte count for display, e.g. `1.5 kB` or `1.0 KiB`.
///
/// `si` selects powers of 1000 over 1024; `dp` is the number of decimals.
pub fn human_file_size(bytes: u64, si: bool, dp: usize) -> String {
    let thresh = if si { 1000.0 } else { 1024.0 };
    let units = if si { &SI_UNITS } else { &IEC_UNITS };

    let mut value = bytes as f64;
    if value < thresh {
        return format!("{} B", bytes);
    }

    let r = 10f64.powi(dp as i32);
    let mut u = 0;
    value /= thresh;
    while (value * r).round() / r >= thresh && u < units.len() - 1 {
        value /= thresh;
        u += 1;
    }

    format!("{:.*} {}", dp, value, units[u])
}

/// Render an optional metric, `-` when unknown.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_in_bytes() {
        assert_eq!(human_file_size(0, true, 1), "0 B");
        assert_eq!(human_file_size(999, true, 1), "999 B");
        assert_eq!(human_file_size(1023, false, 1), "1023 B");
    }

    #[test]
    fn test_si_units() {
        assert_eq!(human_file_size(1500, true, 1), "1.5 kB");
        assert_eq!(human_file_size(2_000_000, true, 1), "2.0 MB");
    }

    #[test]
    fn test_iec_units() {
        assert_eq!(human_file_size(1024, false, 1), "1.0 KiB");
        assert_eq!(human_file_size(1024 * 1024, false, 2), "1.00 MiB");
    }

    #[test]
    fn test_rounding_promotes_unit() {
        // 999_960 rounds to 1000.0 kB at 1 dp, so it is shown as MB
        assert_eq!(human_file_size(999_960, true, 1), "1.0 MB");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(or_dash::<u64>(None), "-");
    }
}
