//! Drives a toy in-process ledger and checks the events it reports.
//!
//! Run with `cargo run --example ledger`.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use histwatch::*;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Client handle for the toy ledger. Every accepted transaction is reported
/// on `events` a little later, like a block being committed.
struct LedgerClient {
    events: UnboundedSender<String>,
}

impl LedgerClient {
    fn submit(&self, tx: &'static str) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let _ = events.send(format!("committed:{tx}"));
        });
    }
}

struct LocalLedger {
    running: AtomicBool,
}

impl Provisioner for LocalLedger {
    type Client = LedgerClient;

    async fn probe(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn start(&self) -> Result {
        println!("starting ledger nodes");
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self, log: &EventLog) -> Result<LedgerClient> {
        let (tx, rx) = unbounded_channel();
        log.feed(UnboundedReceiverStream::new(rx));
        Ok(LedgerClient { events: tx })
    }

    async fn stop(&self) -> Result {
        println!("stopping ledger nodes");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let fixture = Fixture::new(LocalLedger {
        running: AtomicBool::new(false),
    });

    let ctx = fixture.context().await?;
    let matcher = ctx.matcher();

    ctx.client().submit("mint");
    matcher.resolve(["committed:mint"]).await?;
    ctx.client().submit("transfer");
    matcher.resolve_complete(["committed:transfer"]).await?;

    ctx.client().submit("burn");
    ctx.client().submit("burn");
    let burns = matcher.resolve_all(["committed:burn"]).await;
    println!("drained {burns} burns");

    matcher.reject(["committed:mint"]).await?;

    fixture.shutdown().await
}
