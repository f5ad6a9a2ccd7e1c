//! Test doubles for the scrape pipeline

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::traits::PageSource;

/// Replays a scripted list of responses, failing once the script runs out
#[derive(Clone, Default)]
pub struct ScriptedSource {
    responses: Arc<Mutex<VecDeque<Result<String, FetchError>>>>,
    attempts: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<String, FetchError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            attempts: Arc::default(),
        }
    }

    /// A source whose every request fails
    pub fn failing() -> Self {
        Self::default()
    }

    /// A source that serves `body` for every request
    pub fn serving(body: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(body.to_string())).collect())
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn get(&self, _url: &str) -> Result<String, FetchError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::Status(500)))
    }
}
