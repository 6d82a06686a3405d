use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::output;
use crate::submission::{SubmitFailure, SubmitOperation};

/// Local stand-in for the remote service: prints the payload as JSON.
pub struct EchoSubmitter<P> {
    latency: Duration,
    fail_next: AtomicBool,
    _payload: PhantomData<fn(P)>,
}

impl<P> EchoSubmitter<P> {
    pub fn new() -> Self {
        Self {
            latency: Duration::from_millis(400),
            fail_next: AtomicBool::new(false),
            _payload: PhantomData,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Rejects the first call so the retry path can be exercised by hand.
    pub fn failing_once(self) -> Self {
        self.fail_next.store(true, Ordering::SeqCst);
        self
    }
}

impl<P> Default for EchoSubmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Serialize + Send + 'static> SubmitOperation<P> for EchoSubmitter<P> {
    async fn submit(&self, payload: P) -> Result<(), SubmitFailure> {
        tokio::time::sleep(self.latency).await;
        if self.fail_next.swap(false, Ordering::SeqCst) {
            warn!("echo submitter rejecting call");
            return Err(SubmitFailure::unknown());
        }
        let json = serde_json::to_string_pretty(&payload)
            .map_err(|err| SubmitFailure::new(err.to_string()))?;
        info!(bytes = json.len(), "echo submitter accepted payload");
        output::section("Gönderilen veri");
        println!("{json}");
        Ok(())
    }
}
