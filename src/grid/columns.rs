//! Column sizing and horizontal layout

use super::cell;
use unicode_width::UnicodeWidthStr;

/// Gap drawn between adjacent columns
pub const COLUMN_SEPARATOR: u16 = 1;

/// Bounds on how much of the data is inspected when sizing columns
#[derive(Debug, Clone, Copy)]
pub struct WidthLimits {
    pub min: u16,
    pub max: u16,
    pub sample_rows: usize,
    pub sample_bytes: usize,
}

/// Width per column: the wider of the header and the widest sampled cell,
/// clamped to `[min, max]`
pub fn compute_widths(columns: &[String], rows: &[Vec<String>], limits: WidthLimits) -> Vec<u16> {
    let min = limits.min.min(limits.max);
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();

    for row in rows.iter().take(limits.sample_rows) {
        for (i, value) in row.iter().enumerate().take(widths.len()) {
            let w = cell::measure(value, limits.sample_bytes);
            if w > widths[i] {
                widths[i] = w;
            }
        }
    }

    widths
        .into_iter()
        .map(|w| (w.min(u16::MAX as usize) as u16).clamp(min, limits.max))
        .collect()
}

/// How many columns starting at `left` fit into `available` cells.
/// Always at least one while any column remains.
pub fn visible_count(widths: &[u16], left: usize, available: u16) -> usize {
    if left >= widths.len() {
        return 0;
    }
    let mut used: u32 = 0;
    let mut count = 0;
    for (i, w) in widths[left..].iter().enumerate() {
        let needed = *w as u32 + if i > 0 { COLUMN_SEPARATOR as u32 } else { 0 };
        if count > 0 && used + needed > available as u32 {
            break;
        }
        used += needed;
        count += 1;
    }
    count
}

/// Smallest left offset that still shows column `target` as the rightmost
pub fn left_for_rightmost(widths: &[u16], target: usize, available: u16) -> usize {
    let Some(w) = widths.get(target) else {
        return 0;
    };
    let mut used = *w as u32;
    let mut left = target;
    while left > 0 {
        let next = widths[left - 1] as u32 + COLUMN_SEPARATOR as u32;
        if used + next > available as u32 {
            break;
        }
        used += next;
        left -= 1;
    }
    left
}
