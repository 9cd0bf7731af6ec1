mod clock;
mod rest;
mod source;
mod ticker;

pub use clock::ElapsedClock;
pub use rest::{RestState, RestTimer};
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource, TokioTimeSource};
pub use ticker::Ticker;

/// Render seconds as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_clock(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let s = secs % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{s:02}")
    } else {
        format!("{mins:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::format_clock;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(95), "01:35");
        assert_eq!(format_clock(3600 + 61), "1:01:01");
    }
}
