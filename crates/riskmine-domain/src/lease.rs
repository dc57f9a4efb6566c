//! Lease module - explicit visibility for units taken off the work queue

use std::fmt;

/// Token stamped on every row handed out by one `lease` call
///
/// Backed by a UUIDv7, so tokens sort by the time the lease was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeaseToken(u128);

impl LeaseToken {
    /// Generate a fresh UUIDv7-based token
    ///
    /// # Examples
    ///
    /// ```
    /// use riskmine_domain::LeaseToken;
    ///
    /// let token = LeaseToken::new();
    /// assert!(token.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a token from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a token from its hyphenated string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid lease token: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since the Unix epoch at which the lease was taken
    pub fn timestamp_ms(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for LeaseToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// A batch of units leased together
#[derive(Debug, Clone)]
pub struct Lease<U> {
    /// Token shared by every unit of the batch
    pub token: LeaseToken,

    /// Leased units, oldest first
    pub units: Vec<U>,
}

impl<U> Lease<U> {
    /// Wrap leased units
    pub fn new(token: LeaseToken, units: Vec<U>) -> Self {
        Self { token, units }
    }

    /// Number of leased units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// No unit was available
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_chronological() {
        let t1 = LeaseToken::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let t2 = LeaseToken::new();

        assert!(t1 < t2);
        assert!(t1.timestamp_ms() <= t2.timestamp_ms());
    }

    #[test]
    fn test_token_display_and_parse() {
        let token = LeaseToken::new();
        let s = token.to_string();
        assert_eq!(s.len(), 36);
        assert_eq!(LeaseToken::from_string(&s).unwrap(), token);
        assert!(LeaseToken::from_string("not-a-token").is_err());
    }

    #[test]
    fn test_empty_lease() {
        let lease: Lease<u32> = Lease::new(LeaseToken::new(), Vec::new());
        assert!(lease.is_empty());
        assert_eq!(lease.len(), 0);
    }
}
