use crate::{EventLog, Expectation, MatcherConfig, Result};

/// Asserts that an [`EventLog`] receives an ordered sequence of events.
///
/// Every operation waits up to [`MatcherConfig::wait_budget`] for the log to
/// hold enough entries, then consumes the matched entries from the front.
/// Calls are independent of each other except for what they leave in the log.
///
/// | Method | Passes when |
/// |--------|-------------|
/// | [`resolve`](Self::resolve) | the sequence is a prefix of the history |
/// | [`resolve_complete`](Self::resolve_complete) | the sequence is the entire remaining history |
/// | [`reject`](Self::reject) / [`reject_complete`](Self::reject_complete) | the corresponding match fails |
/// | [`resolve_all`](Self::resolve_all) | always; drains repeated occurrences of the sequence |
///
/// Only one expectation should run against a log at a time; interleaved
/// consumers see indeterminate results.
///
/// # Example
///
/// ```ignore
/// let log = EventLog::new();
/// let matcher = ExpectationMatcher::new(log.clone());
///
/// client.on_event(move |e| log.push_one(e));
/// client.transfer(100).await?;
///
/// matcher.resolve(["debit", "credit"]).await?;
/// matcher.reject(["credit"]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ExpectationMatcher {
    log: EventLog,
    config: MatcherConfig,
}

impl ExpectationMatcher {
    /// Create a matcher over `log` with the default 20 polls of 200ms.
    pub fn new(log: EventLog) -> Self {
        Self::with_config(log, MatcherConfig::default())
    }

    pub fn with_config(log: EventLog, config: MatcherConfig) -> Self {
        Self { log, config }
    }

    /// Create a matcher polling at most `max_wait` times.
    pub fn with_max_wait(log: EventLog, max_wait: usize) -> Self {
        Self::with_config(log, MatcherConfig::default().with_max_wait(max_wait))
    }

    /// The log this matcher consumes from.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Build an expectation for `desired`, to be customized and awaited.
    pub fn expect<I>(&self, desired: I) -> Expectation<'_>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let desired = desired.into_iter().map(Into::into).collect();
        Expectation::new(&self.log, self.config, desired)
    }

    /// Succeeds if the history starts with `desired`. Extra trailing
    /// entries are left in the log.
    pub async fn resolve<I>(&self, desired: I) -> Result
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expect(desired).await
    }

    /// Succeeds if `desired` is exactly the remaining history.
    pub async fn resolve_complete<I>(&self, desired: I) -> Result
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expect(desired).complete().await
    }

    /// Succeeds if the history does NOT start with `desired`.
    ///
    /// Waits the full budget when too few entries arrive, since that is the
    /// only way to tell they never will.
    pub async fn reject<I>(&self, desired: I) -> Result
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expect(desired).negated().await
    }

    /// Succeeds if `desired` is NOT exactly the remaining history.
    pub async fn reject_complete<I>(&self, desired: I) -> Result
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expect(desired).negated().complete().await
    }

    /// Match `desired` over and over until an attempt fails, returning how
    /// many attempts matched.
    ///
    /// The terminating failure is logged at `trace` and discarded. A return
    /// of zero is not an error, and a non-zero count does not prove the log
    /// holds nothing else. The last attempt waits out the full budget.
    ///
    /// An empty `desired` returns 0 right away.
    pub async fn resolve_all<I>(&self, desired: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let desired: Vec<String> = desired.into_iter().map(Into::into).collect();
        if desired.is_empty() {
            return 0;
        }

        let mut drained = 0;
        loop {
            match self.expect(desired.iter().cloned()).silent().await {
                Ok(()) => drained += 1,
                Err(e) => {
                    tracing::trace!(error = %e, drained, "resolve_all stopped");
                    return drained;
                }
            }
        }
    }
}
