use chrono::Duration;

/// The fixed auto-grouping window: a question is a grouping candidate parent
/// if it's strictly older than the new question and within this window.
pub fn grouping_window() -> Duration {
    Duration::minutes(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_five_minutes() {
        assert_eq!(grouping_window(), Duration::minutes(5));
    }
}
