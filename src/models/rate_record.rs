use serde::{Deserialize, Serialize};

/// Requests admitted for one identity in the current fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    pub count: u32,
    /// End of the window in epoch milliseconds
    pub expires: i64,
}

impl RateRecord {
    /// A record opening a new window with its first request
    pub fn open(now_ms: i64, window_seconds: u64) -> Self {
        Self {
            count: 1,
            expires: now_ms + (window_seconds as i64) * 1000,
        }
    }

    /// Whether the window is still running at `now_ms`
    pub fn is_open(&self, now_ms: i64) -> bool {
        self.expires > now_ms
    }

    /// Whole seconds until the window ends, rounded up
    pub fn seconds_remaining(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.expires.saturating_sub(now_ms).max(0) as u64;
        remaining_ms.div_ceil(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_record() {
        let record = RateRecord::open(10_000, 60);
        assert_eq!(record.count, 1);
        assert_eq!(record.expires, 70_000);
        assert!(record.is_open(69_999));
        assert!(!record.is_open(70_000));
    }

    #[test]
    fn test_seconds_remaining_rounds_up() {
        let record = RateRecord {
            count: 3,
            expires: 10_000,
        };
        assert_eq!(record.seconds_remaining(0), 10);
        assert_eq!(record.seconds_remaining(1), 10);
        assert_eq!(record.seconds_remaining(9_001), 1);
        assert_eq!(record.seconds_remaining(10_000), 0);
        assert_eq!(record.seconds_remaining(20_000), 0);
    }

    #[test]
    fn test_seconds_remaining_with_extreme_expiry() {
        let corrupt = RateRecord {
            count: 1,
            expires: i64::MIN,
        };
        assert_eq!(corrupt.seconds_remaining(1_700_000_000_000), 0);

        let far = RateRecord {
            count: 1,
            expires: i64::MAX,
        };
        assert_eq!(far.seconds_remaining(-1_000), (i64::MAX as u64).div_ceil(1000));
    }

    #[test]
    fn test_wire_format() {
        let record: RateRecord = serde_json::from_str(r#"{"count":4,"expires":123}"#).unwrap();
        assert_eq!(record, RateRecord { count: 4, expires: 123 });
    }
}
