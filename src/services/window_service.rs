use crate::models::AxisWindow;

/// Width of the trailing time window shown on the chart
pub const WINDOW_SPAN_MS: i64 = 10 * 60 * 1000;

/// Trailing ten-minute window ending at `now_ms`, widened by `padding_ms` on both sides.
///
/// Must be recomputed on every refresh since `now` moves.
pub fn axis_window(now_ms: i64, padding_ms: i64) -> AxisWindow {
    let start = now_ms.saturating_sub(WINDOW_SPAN_MS);
    AxisWindow {
        min: start.saturating_sub(padding_ms),
        max: now_ms.saturating_add(padding_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_without_padding() {
        for now in [0, 600_000, 1_655_407_200_000, -5] {
            let window = axis_window(now, 0);
            assert_eq!(window.min, now - 600_000);
            assert_eq!(window.max, now);
        }
    }

    #[test]
    fn test_window_with_padding() {
        let window = axis_window(1_000_000, 60_000);
        assert_eq!(window.min, 1_000_000 - 600_000 - 60_000);
        assert_eq!(window.max, 1_060_000);
    }

    #[test]
    fn test_window_follows_now() {
        let first = axis_window(10_000_000, 0);
        let later = axis_window(10_005_000, 0);
        assert_eq!(later.min - first.min, 5_000);
        assert_eq!(later.max - first.max, 5_000);
    }
}
