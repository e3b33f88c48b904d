use std::{
    fmt,
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::OnceCell;

use crate::{EventLog, ExpectationMatcher, MatcherConfig, Result};

/// Brings up the backend a test suite talks to and hands out a client for it.
///
/// Implementations decide how nodes are started and stopped; [`Fixture`]
/// decides *whether* to start them, based on [`probe`](Self::probe).
///
/// Methods can be implemented as `async fn` directly.
pub trait Provisioner: Send + Sync + 'static {
    type Client: Send + Sync + 'static;

    /// Returns `true` if a usable backend is already running.
    fn probe(&self) -> impl Future<Output = bool> + Send;

    /// Start fresh backend processes.
    fn start(&self) -> impl Future<Output = Result> + Send;

    /// Produce a ready-to-use client for the running backend.
    ///
    /// `log` is the context's [`EventLog`]; wire the client's event reports
    /// into it (e.g. with [`EventLog::feed`]) so the context's matcher sees them.
    fn connect(&self, log: &EventLog) -> impl Future<Output = Result<Self::Client>> + Send;

    /// Stop processes previously started by [`start`](Self::start).
    fn stop(&self) -> impl Future<Output = Result> + Send;
}

/// Everything a test needs once the backend is up.
pub struct FixtureContext<C> {
    client: C,
    log: EventLog,
    matcher: ExpectationMatcher,
    provisioned: bool,
}

impl<C> FixtureContext<C> {
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Log that producers in the test push observed events into.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Matcher bound to [`log`](Self::log).
    pub fn matcher(&self) -> &ExpectationMatcher {
        &self.matcher
    }

    /// Whether backend processes were started for this context, as opposed
    /// to reusing nodes that were already running.
    pub fn provisioned(&self) -> bool {
        self.provisioned
    }
}

impl<C> fmt::Debug for FixtureContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixtureContext")
            .field("log", &self.log)
            .field("provisioned", &self.provisioned)
            .finish_non_exhaustive()
    }
}

/// Shared, lazily initialized test context.
///
/// Create one `Fixture` per suite and pass it to the tests that need it
/// (e.g. behind an `Arc` or a `static` `LazyLock`). The first call to
/// [`context`](Self::context) provisions the backend; every later call,
/// including concurrent ones, gets the same [`FixtureContext`]. Call
/// [`shutdown`](Self::shutdown) from the suite teardown.
///
/// # Example
///
/// ```ignore
/// let fixture = Fixture::new(Conodes::local(4));
///
/// let ctx = fixture.context().await?;
/// ctx.client().spawn_coin().await?;
/// ctx.matcher().resolve(["spawned"]).await?;
///
/// fixture.shutdown().await?;
/// ```
pub struct Fixture<P: Provisioner> {
    provisioner: P,
    config: MatcherConfig,
    context: OnceCell<FixtureContext<P::Client>>,
    stopped: AtomicBool,
}

impl<P: Provisioner> Fixture<P> {
    pub fn new(provisioner: P) -> Self {
        Self::with_config(provisioner, MatcherConfig::default())
    }

    /// Use `config` for the context's matcher.
    pub fn with_config(provisioner: P, config: MatcherConfig) -> Self {
        Self {
            provisioner,
            config,
            context: OnceCell::new(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    /// Returns the shared context, provisioning the backend on first use.
    ///
    /// If initialization fails, the error is returned and the next call
    /// tries again.
    pub async fn context(&self) -> Result<&FixtureContext<P::Client>> {
        self.context.get_or_try_init(|| self.init()).await
    }

    async fn init(&self) -> Result<FixtureContext<P::Client>> {
        let provisioned = if self.provisioner.probe().await {
            tracing::warn!("using already running nodes for test");
            false
        } else {
            tracing::info!("no running nodes found, starting backend");
            self.provisioner.start().await?;
            true
        };

        let log = EventLog::new();
        let client = self.provisioner.connect(&log).await?;
        let matcher = ExpectationMatcher::with_config(log.clone(), self.config);
        tracing::debug!(provisioned, "fixture ready");

        Ok(FixtureContext {
            client,
            log,
            matcher,
            provisioned,
        })
    }

    /// Stop the backend if this fixture started it.
    ///
    /// Does nothing when the context was never created, when it reused
    /// running nodes, or on a second call.
    pub async fn shutdown(&self) -> Result {
        let Some(ctx) = self.context.get() else {
            return Ok(());
        };
        if !ctx.provisioned || self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::info!("stopping backend");
        self.provisioner.stop().await
    }
}

impl<P: Provisioner> fmt::Debug for Fixture<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("config", &self.config)
            .field("context", &self.context.get())
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::Error;

    #[derive(Default)]
    struct Counters {
        probes: AtomicUsize,
        starts: AtomicUsize,
        connects: AtomicUsize,
        stops: AtomicUsize,
    }

    struct MockBackend {
        running: bool,
        fail_start: AtomicBool,
        counters: Arc<Counters>,
    }

    impl MockBackend {
        fn new(running: bool) -> (Self, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let backend = MockBackend {
                running,
                fail_start: AtomicBool::new(false),
                counters: counters.clone(),
            };
            (backend, counters)
        }
    }

    impl Provisioner for MockBackend {
        type Client = &'static str;

        async fn probe(&self) -> bool {
            self.counters.probes.fetch_add(1, Ordering::SeqCst);
            self.running
        }

        async fn start(&self) -> Result {
            if self.fail_start.swap(false, Ordering::SeqCst) {
                return Err(Error::external(std::io::Error::other("docker not found")));
            }
            tokio::task::yield_now().await;
            self.counters.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn connect(&self, log: &EventLog) -> Result<Self::Client> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            log.push_one("connected");
            Ok("client")
        }

        async fn stop(&self) -> Result {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn provisions_once_for_concurrent_callers() {
        let (backend, counters) = MockBackend::new(false);
        let fixture = Fixture::new(backend);

        let (a, b) = tokio::join!(fixture.context(), fixture.context());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(std::ptr::eq(a, b));
        assert!(a.provisioned());
        assert_eq!(*a.client(), "client");
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reuses_running_nodes() {
        let (backend, counters) = MockBackend::new(true);
        let fixture = Fixture::new(backend);

        let ctx = fixture.context().await.unwrap();
        assert!(!ctx.provisioned());
        assert_eq!(counters.starts.load(Ordering::SeqCst), 0);

        fixture.shutdown().await.unwrap();
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_stops_only_once() {
        let (backend, counters) = MockBackend::new(false);
        let fixture = Fixture::new(backend);

        fixture.context().await.unwrap();
        fixture.shutdown().await.unwrap();
        fixture.shutdown().await.unwrap();
        assert_eq!(counters.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_without_context_is_noop() {
        let (backend, counters) = MockBackend::new(false);
        let fixture = Fixture::new(backend);

        fixture.shutdown().await.unwrap();
        assert_eq!(counters.probes.load(Ordering::SeqCst), 0);
        assert_eq!(counters.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_start_is_retried() {
        let (backend, counters) = MockBackend::new(false);
        backend.fail_start.store(true, Ordering::SeqCst);
        let fixture = Fixture::new(backend);

        let err = fixture.context().await.unwrap_err();
        assert!(matches!(err, Error::External(_)));

        fixture.context().await.unwrap();
        assert_eq!(counters.probes.load(Ordering::SeqCst), 2);
        assert_eq!(counters.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_wires_client_into_context_log() {
        let (backend, _counters) = MockBackend::new(true);
        let fixture = Fixture::with_config(backend, MatcherConfig::default().with_max_wait(1));

        let ctx = fixture.context().await.unwrap();
        ctx.log().push(["genesis", "spawn"]);
        ctx.matcher()
            .resolve_complete(["connected", "genesis", "spawn"])
            .await
            .unwrap();
        assert_eq!(ctx.matcher().config().max_wait(), 1);
    }
}
