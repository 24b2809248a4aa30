//! Retry configuration.

use std::time::Duration;

/// How many attempts to make and how much slack to give the clock.
///
/// # Examples
///
/// ```rust
/// use slackwater::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::new(5).with_tolerance(Duration::from_millis(10));
///
/// assert_eq!(config.max_attempts(), 5);
/// assert_eq!(config.tolerance(), Some(Duration::from_millis(10)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryConfig {
    max_attempts: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    tolerance: Option<Duration>,
}

impl RetryConfig {
    /// Make at most `max_attempts` attempts (the first one included).
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is zero.
    pub fn new(max_attempts: u32) -> Self {
        assert!(max_attempts >= 1, "Retry must have at least one attempt");
        Self {
            max_attempts,
            tolerance: None,
        }
    }

    /// Allow each backoff sleep to wake up to `tolerance` late.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Get the maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the sleep tolerance.
    pub fn tolerance(&self) -> Option<Duration> {
        self.tolerance
    }

    /// Validate a configuration that was built without [`RetryConfig::new`],
    /// such as one loaded through serde.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_attempts == 0 {
            Err("Retry must have at least one attempt")
        } else {
            Ok(())
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.tolerance(), None);
    }

    #[test]
    #[should_panic(expected = "Retry must have at least one attempt")]
    fn test_zero_attempts_panics() {
        let _ = RetryConfig::new(0);
    }

    #[test]
    fn test_single_attempt_is_valid() {
        assert!(RetryConfig::new(1).validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let config = RetryConfig::new(4).with_tolerance(Duration::from_millis(5));
        let json = serde_json::to_string(&config).unwrap();
        let back: RetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialized_zero_attempts_fails_validation() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_attempts":0}"#).unwrap();
        assert_eq!(
            config.validate(),
            Err("Retry must have at least one attempt")
        );
    }
}
