const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with base-1024 units and two decimals.
///
/// Steps up a unit whenever the value would otherwise reach 1024; values
/// beyond TB stay in TB.
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_exact_units() {
        assert_eq!(human_size(0), "0.00 B");
        assert_eq!(human_size(1024), "1.00 KB");
        assert_eq!(human_size(1024 * 1024), "1.00 MB");
        assert_eq!(human_size(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn formats_fractional_values() {
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(10_485_760), "10.00 MB");
    }

    #[test]
    fn stays_below_unit_boundary() {
        assert_eq!(human_size(1023), "1023.00 B");
    }

    #[test]
    fn caps_at_terabytes() {
        let five_pb = 5 * 1024u64.pow(5);
        assert_eq!(human_size(five_pb), "5120.00 TB");
    }
}
