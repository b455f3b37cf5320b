use crate::Millis;

/// `part / total` as a whole percentage, rounded half-up. Zero when `total` is zero.
pub fn percent(part: u32, total: u32) -> u32 {
    match total {
        0 => 0,
        total => {
            let (part, total) = (u64::from(part), u64::from(total));
            ((part * 200 + total) / (total * 2)) as u32
        }
    }
}

/// Whole milliseconds for display.
pub fn round_ms(ms: Millis) -> i64 {
    ms.round() as i64
}
