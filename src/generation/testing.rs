//! Test doubles for the completion provider and the retry timer

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Sleeper;
use crate::ai::provider::{CompletionRequest, LlmProvider, LlmResponse, TokenUsage};
use crate::types::Result;

type Script = Box<dyn Fn(usize) -> Result<LlmResponse> + Send + Sync>;

/// Provider whose responses come from a closure over the 1-based call number
pub struct ScriptedProvider {
    script: Script,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(script: impl Fn(usize) -> Result<LlmResponse> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns `content N` with usage (10, 5, 15) on call N
    pub fn echo() -> Self {
        Self::new(|call| {
            Ok(LlmResponse::new(
                format!("content {}", call),
                TokenUsage::new(10, 5, 15),
            ))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt.clone());
        (self.script)(call)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Records requested waits instead of sleeping
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}
