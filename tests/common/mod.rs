#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quote_flow::submission::{CloseHook, SubmitFailure, SubmitOperation};

/// Submit operation answering from a script; succeeds once the script runs out.
pub struct ScriptedSubmitter<P> {
    script: Mutex<VecDeque<Result<(), SubmitFailure>>>,
    received: Mutex<Vec<P>>,
}

impl<P> ScriptedSubmitter<P> {
    pub fn new(script: Vec<Result<(), SubmitFailure>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.received.lock().expect("received lock").len()
    }
}

impl<P: Clone> ScriptedSubmitter<P> {
    pub fn last(&self) -> Option<P> {
        self.received.lock().expect("received lock").last().cloned()
    }
}

#[async_trait]
impl<P: Send + 'static> SubmitOperation<P> for ScriptedSubmitter<P> {
    async fn submit(&self, payload: P) -> Result<(), SubmitFailure> {
        self.received.lock().expect("received lock").push(payload);
        let next = self.script.lock().expect("script lock").pop_front();
        next.unwrap_or(Ok(()))
    }
}

/// Close hook counting its invocations.
pub fn counting_close_hook() -> (CloseHook, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&count);
    let hook: CloseHook = Arc::new(move || {
        hook_count.fetch_add(1, Ordering::SeqCst);
    });
    (hook, count)
}
