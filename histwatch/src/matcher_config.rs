use std::time::Duration;

/// Wait configuration for an [`ExpectationMatcher`](crate::ExpectationMatcher).
///
/// An expectation polls the log at most `max_wait` times, sleeping
/// `poll_interval` between checks, so the worst-case wait per call is
/// [`wait_budget`](Self::wait_budget).
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use histwatch::MatcherConfig;
///
/// let config = MatcherConfig::default()
///     .with_max_wait(50)                              // up to 50 polls
///     .with_poll_interval(Duration::from_millis(100)); // every 100ms
///
/// assert_eq!(config.wait_budget(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatcherConfig {
    /// Maximum number of polling iterations before an expectation gives up.
    /// Always at least 1.
    /// Default: 20
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_max_wait"))]
    max_wait: usize,

    /// Sleep between two checks of the log length.
    /// Default: 200ms
    poll_interval: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            max_wait: Self::DEFAULT_MAX_WAIT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }
}

impl MatcherConfig {
    pub const DEFAULT_MAX_WAIT: usize = 20;
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

    /// Set the maximum number of polling iterations. Zero is raised to one.
    pub fn with_max_wait(mut self, max_wait: usize) -> Self {
        self.max_wait = max_wait.max(1);
        self
    }

    /// Returns the maximum number of polling iterations.
    pub fn max_wait(&self) -> usize {
        self.max_wait
    }

    /// Set the sleep between two polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Returns the sleep between two polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Upper bound on how long a single expectation waits for entries.
    pub fn wait_budget(&self) -> Duration {
        self.poll_interval
            .saturating_mul(u32::try_from(self.max_wait).unwrap_or(u32::MAX))
    }
}

#[cfg(feature = "serde")]
fn deserialize_max_wait<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let max_wait = <usize as serde::Deserialize>::deserialize(deserializer)?;
    Ok(max_wait.max(1))
}
