//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a point as `(x, y, z)` with three decimals
pub fn format_point(point: [f32; 3]) -> String {
    format!("({:.3}, {:.3}, {:.3})", point[0], point[1], point[2])
}

/// Format a count together with its share of a total
pub fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        count.to_string()
    } else {
        format!("{count} ({:.1}%)", count as f64 / total as f64 * 100.0)
    }
}
