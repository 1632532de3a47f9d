pub struct FileSizeUtils;

impl FileSizeUtils {
    /// Human readable size in base 1024, at most two decimals and no trailing zeros.
    pub fn format_size(size: u64) -> String {
        const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
        if size == 0 {
            return "0 Bytes".to_string();
        }

        let mut value = size as f64;
        let mut unit_index = 0;

        while value >= 1024.0 && unit_index < UNITS.len() - 1 {
            value /= 1024.0;
            unit_index += 1;
        }

        let rounded = format!("{:.2}", value);
        let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
        format!("{} {}", trimmed, UNITS[unit_index])
    }

    pub fn total_size<I>(sizes: I) -> u64
    where
        I: IntoIterator<Item = u64>,
    {
        sizes.into_iter().fold(0u64, |acc, size| acc.saturating_add(size))
    }
}
