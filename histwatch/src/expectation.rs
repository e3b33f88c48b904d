use std::{fmt, future::IntoFuture, pin::Pin};

use crate::{Error, EventLog, MatcherConfig, Result, error::Mismatch};

/// A single attempt to match a sequence against an [`EventLog`].
///
/// Created by [`ExpectationMatcher::expect`](crate::ExpectationMatcher::expect).
/// Awaiting it waits (bounded by the matcher's [`MatcherConfig`]) until the log
/// holds at least as many entries as the sequence, then consumes entries from
/// the front, comparing each with the next wanted identifier.
///
/// Entries consumed before a mismatch stay consumed.
///
/// # Example
///
/// ```ignore
/// // Sequence must be the whole remaining history
/// matcher.expect(["genesis", "mint"]).complete().await?;
///
/// // Passes only if the sequence does NOT match
/// matcher.expect(["double-spend"]).negated().within_polls(2).await?;
/// ```
pub struct Expectation<'a> {
    log: &'a EventLog,
    config: MatcherConfig,
    desired: Vec<String>,
    succeed: bool,
    complete: bool,
    silent: bool,
}

impl<'a> Expectation<'a> {
    pub(crate) fn new(log: &'a EventLog, config: MatcherConfig, desired: Vec<String>) -> Self {
        Self {
            log,
            config,
            desired,
            succeed: true,
            complete: false,
            silent: false,
        }
    }

    /// Require the log to be empty once the sequence matched.
    pub fn complete(mut self) -> Self {
        self.complete = true;
        self
    }

    /// Suppress waiting, history and failure logs.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Expect the match to fail. The expectation then resolves `Ok` exactly
    /// when the sequence does not match, and errors with
    /// [`Error::UnexpectedMatch`] when it does.
    pub fn negated(mut self) -> Self {
        self.succeed = false;
        self
    }

    /// Override the matcher's polling budget for this attempt only.
    pub fn within_polls(mut self, max_wait: usize) -> Self {
        self.config = self.config.with_max_wait(max_wait);
        self
    }

    async fn run(self) -> Result {
        match (self.succeed, self.attempt().await) {
            (true, Ok(())) => Ok(()),
            (true, Err(mismatch)) => {
                if !self.silent {
                    tracing::error!(
                        wanted = ?self.desired,
                        error = %mismatch,
                        "expectation failed"
                    );
                }
                Err(Error::Expectation(mismatch))
            }
            (false, Err(mismatch)) => {
                if !self.silent {
                    tracing::debug!(error = %mismatch, "history failed to match as expected");
                }
                Ok(())
            }
            (false, Ok(())) => Err(Error::UnexpectedMatch(self.desired)),
        }
    }

    async fn attempt(&self) -> std::result::Result<(), Mismatch> {
        let wanted = self.desired.len();

        let mut iteration = 0;
        while iteration < self.config.max_wait() && self.log.len() < wanted {
            if !self.silent {
                tracing::trace!(
                    iteration,
                    available = self.log.len(),
                    wanted,
                    "waiting for entries"
                );
            }
            tokio::time::sleep(self.config.poll_interval()).await;
            iteration += 1;
        }

        if !self.silent {
            let history = self.log.snapshot();
            if self.succeed {
                tracing::debug!(?history, wanted = ?self.desired, "matching history");
            } else {
                tracing::debug!(?history, fail_with = ?self.desired, "expecting history to fail");
            }
        }

        let available = self.log.len();
        if available < wanted {
            return Err(Mismatch::NotEnoughEntries { available, wanted });
        }

        for (position, expected) in self.desired.iter().enumerate() {
            match self.log.pop_front() {
                Some(got) if got == *expected => {}
                Some(got) => {
                    return Err(Mismatch::Unexpected {
                        got,
                        expected: expected.clone(),
                        position,
                    });
                }
                // Someone else drained the log since the length check
                None => {
                    return Err(Mismatch::NotEnoughEntries {
                        available: position,
                        wanted,
                    });
                }
            }
        }

        if self.complete {
            let rest = self.log.snapshot();
            if !rest.is_empty() {
                return Err(Mismatch::Leftover(rest));
            }
        }

        Ok(())
    }
}

impl<'a> IntoFuture for Expectation<'a> {
    type Output = Result;
    type IntoFuture = Pin<Box<dyn std::future::Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl fmt::Debug for Expectation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("desired", &self.desired)
            .field("succeed", &self.succeed)
            .field("complete", &self.complete)
            .field("silent", &self.silent)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
