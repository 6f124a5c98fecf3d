//! Access-token usability policy.

use chrono::{DateTime, Duration, Utc};

use crate::identity::TokenSet;

/// Decides whether a cached access token is still worth handing out.
///
/// A token close to expiry is treated as unusable so a caller does not
/// present it moments before the provider stops accepting it; refreshing
/// slightly early costs one round-trip, a rejected send costs the whole
/// operation.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    buffer: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            buffer: Duration::seconds(60),
        }
    }
}

impl TokenPolicy {
    /// Creates a policy with a custom safety buffer.
    #[must_use]
    pub const fn new(buffer: Duration) -> Self {
        Self { buffer }
    }

    /// True iff the access token expires strictly later than `now` plus the
    /// safety buffer. Pure function of its inputs.
    #[must_use]
    pub fn is_usable(&self, tokens: &TokenSet, now: DateTime<Utc>) -> bool {
        tokens.expires_at - self.buffer > now
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn tokens_expiring_at(expires_at: DateTime<Utc>) -> TokenSet {
        TokenSet::new("AT1", "RT1", expires_at)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn usable_when_expiry_clears_the_buffer() {
        let now = fixed_now();
        let policy = TokenPolicy::default();
        assert!(policy.is_usable(&tokens_expiring_at(now + Duration::hours(1)), now));
        assert!(policy.is_usable(&tokens_expiring_at(now + Duration::seconds(61)), now));
    }

    #[test]
    fn unusable_when_expired_or_inside_the_buffer() {
        let now = fixed_now();
        let policy = TokenPolicy::default();
        assert!(!policy.is_usable(&tokens_expiring_at(now - Duration::seconds(1)), now));
        assert!(!policy.is_usable(&tokens_expiring_at(now + Duration::seconds(30)), now));
    }

    #[test]
    fn boundary_is_not_usable() {
        // expires_at - buffer == now must refresh, not reuse
        let now = fixed_now();
        let policy = TokenPolicy::default();
        assert!(!policy.is_usable(&tokens_expiring_at(now + Duration::seconds(60)), now));
    }

    proptest! {
        #[test]
        fn matches_the_buffer_arithmetic(offset_secs in -86_400i64..86_400i64) {
            let now = fixed_now();
            let expires_at = now + Duration::seconds(offset_secs);
            let expected = expires_at - Duration::seconds(60) > now;

            let policy = TokenPolicy::default();
            prop_assert_eq!(policy.is_usable(&tokens_expiring_at(expires_at), now), expected);
        }
    }
}
