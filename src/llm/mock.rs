//! Scripted extractor for tests
//!
//! Replies are handed out in call order, or looked up by chunk text when the
//! mock is keyed. A missing reply is a transport error.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ExtractError;
use crate::llm::DialogueExtractor;

pub struct MockExtractor {
    replies: Mutex<VecDeque<Result<String, ExtractError>>>,
    keyed: HashMap<String, String>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl MockExtractor {
    pub fn new(replies: Vec<Result<String, ExtractError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            keyed: HashMap::new(),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Every call succeeds with the given replies, in order
    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Reply depends only on the chunk text, so call order does not matter
    pub fn keyed(pairs: &[(&str, &str)]) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.keyed = pairs
            .iter()
            .map(|(chunk, reply)| (chunk.to_string(), reply.to_string()))
            .collect();
        mock
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Chunk texts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueExtractor for MockExtractor {
    async fn extract(&self, _system: &str, chunk_text: &str) -> Result<String, ExtractError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(chunk_text.to_string());
        if let Some(reply) = self.keyed.get(chunk_text) {
            return Ok(reply.clone());
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractError::Request("no scripted reply left".to_string())))
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
