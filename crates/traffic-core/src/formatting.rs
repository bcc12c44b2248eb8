const BYTE_UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Format a byte count with binary units, from `B` up to `TiB`.
///
/// The value is divided by 1024 while it is strictly greater than 1024, so
/// exactly 1024 bytes stays `"1024 B"`. Plain bytes are printed as an
/// integer; larger units use `precision` decimal places.
///
/// # Examples
///
/// ```
/// use traffic_core::formatting::format_bytes;
///
/// assert_eq!(format_bytes(0, 1), "0 B");
/// assert_eq!(format_bytes(1023, 1), "1023 B");
/// assert_eq!(format_bytes(1536, 1), "1.5 KiB");
/// assert_eq!(format_bytes(5 * 1024 * 1024 * 1024, 2), "5.00 GiB");
/// ```
pub fn format_bytes(bytes: u64, precision: usize) -> String {
    if bytes == 0 {
        return format!("0 {}", BYTE_UNITS[0]);
    }

    let mut value = bytes as f64;
    let mut index = 0;
    while value > 1024.0 && index < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    if index == 0 {
        format!("{} {}", bytes, BYTE_UNITS[0])
    } else {
        format!("{:.prec$} {}", value, BYTE_UNITS[index], prec = precision)
    }
}

/// Convert a byte count to mebibytes, the unit used for plotted series.
///
/// # Examples
///
/// ```
/// use traffic_core::formatting::bytes_to_mib;
///
/// assert_eq!(bytes_to_mib(1_048_576), 1.0);
/// assert_eq!(bytes_to_mib(524_288), 0.5);
/// ```
pub fn bytes_to_mib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}

/// Format an integer count with thousands separators.
///
/// # Examples
///
/// ```
/// use traffic_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1_234_567), "1,234,567");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let remainder = s.len() % 3;
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
