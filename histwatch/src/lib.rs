#![cfg_attr(docsrs, feature(doc_cfg))]
//! # histwatch
//!
//! Async expectations over an ordered history of events.
//!
//! Integration tests against a live backend often need to assert "these
//! events happened, in this order" without a point at which everything is
//! known to have arrived. histwatch records events as the system under test
//! reports them and lets the test wait, with a bounded budget, for the
//! sequence it expects.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use histwatch::*;
//!
//! #[tokio::main]
//! async fn main() -> Result {
//!     let log = EventLog::new();
//!     let matcher = ExpectationMatcher::new(log.clone());
//!
//!     // Producer side: usually a callback or a task watching the backend
//!     let producer = log.clone();
//!     tokio::spawn(async move {
//!         producer.push(["genesis", "spawn"]);
//!         producer.push_one("transfer");
//!     });
//!
//!     matcher.resolve(["genesis"]).await?;
//!     matcher.resolve_complete(["spawn", "transfer"]).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventLog`] | Shared FIFO of event identifiers, pushed by producers |
//! | [`ExpectationMatcher`] | Waits for and consumes expected sequences from a log |
//! | [`Expectation`] | A single configurable match attempt (`complete`, `negated`, `silent`) |
//! | [`MatcherConfig`] | Polling budget: number of polls and interval |
//! | [`Fixture`] | Once-initialized shared test context built by a [`Provisioner`] |
//!
//! ## Matching
//!
//! Each expectation polls the log every [`MatcherConfig::poll_interval`] until
//! it holds at least as many entries as the wanted sequence, giving up after
//! [`MatcherConfig::max_wait`] polls. It then removes entries from the front,
//! one per wanted identifier, failing on the first difference. Removed
//! entries are never put back, even when the match fails.
//!
//! ## Features
//!
//! - **`serde`** - `Serialize`/`Deserialize` for [`MatcherConfig`]

mod error;
mod event_log;
mod expectation;
mod expectation_matcher;
mod fixture;
mod matcher_config;

pub use error::{Error, Mismatch};
pub use event_log::EventLog;
pub use expectation::Expectation;
pub use expectation_matcher::ExpectationMatcher;
pub use fixture::{Fixture, FixtureContext, Provisioner};
pub use matcher_config::MatcherConfig;

/// Convenience alias for `Result<T, histwatch::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
