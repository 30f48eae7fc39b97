use chrono::{DateTime, Duration, Utc};

use crate::error::ServiceError;

/// `now + ttl_secs`, or `Internal` when the result does not fit a timestamp
pub fn deadline(now: DateTime<Utc>, ttl_secs: u64) -> Result<DateTime<Utc>, ServiceError> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ServiceError::Internal(format!("lifetime of {}s overflows", ttl_secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_adds_seconds() {
        let now = Utc::now();
        assert_eq!(deadline(now, 600).unwrap(), now + Duration::minutes(10));
        assert_eq!(deadline(now, 0).unwrap(), now);
    }

    #[test]
    fn test_deadline_overflow_is_an_error() {
        let now = Utc::now();
        for ttl in [10_000_000_000_000, u64::MAX / 2, u64::MAX] {
            assert!(matches!(deadline(now, ttl), Err(ServiceError::Internal(_))), "{ttl}");
        }
    }
}
