//! In-memory collaborators (testing only)
//!
//! Provides `ScriptedGenerator`, `StaticSearch` and `RecordingObserver`, which
//! satisfy the capability and observer contracts without any network access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::capability::{GenerationRequest, Generator, SearchHit, SearchTool};
use crate::error::CapabilityError;
use crate::observer::ProgressObserver;

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Script {
    Reply(String),
    Fail(CapabilityError),
}

/// Generator that replays queued replies per role.
///
/// Queues are keyed by role name and selected by the identity line that
/// opens every system prompt (`You are <role name>.`). When a queue is
/// exhausted, or no key matches, the default reply is used; without one, the
/// call fails with `MalformedResponse`.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    keys: Mutex<Vec<String>>,
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    default_reply: Option<String>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, key: &str) {
        let mut keys = self.keys.lock().unwrap();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// Queue replies for requests made on behalf of role `key`.
    pub fn respond_to<I, S>(self, key: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.register(key);
        self.scripts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .extend(replies.into_iter().map(|r| Script::Reply(r.into())));
        self
    }

    /// Queue a failure for requests made on behalf of role `key`.
    pub fn fail_for(self, key: &str, error: CapabilityError) -> Self {
        self.register(key);
        self.scripts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(Script::Fail(error));
        self
    }

    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = Some(reply.into());
        self
    }

    /// Every request received, in call order.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests made on behalf of role `key`.
    pub fn calls_matching(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| is_for_role(c, key))
            .count()
    }
}

fn is_for_role(request: &GenerationRequest, role: &str) -> bool {
    request
        .system
        .strip_prefix("You are ")
        .and_then(|rest| rest.strip_prefix(role))
        .is_some_and(|rest| rest.starts_with('.'))
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CapabilityError> {
        self.calls.lock().unwrap().push(request.clone());

        let keys = self.keys.lock().unwrap().clone();
        let mut scripts = self.scripts.lock().unwrap();
        for key in keys {
            if !is_for_role(request, &key) {
                continue;
            }
            if let Some(next) = scripts.get_mut(&key).and_then(|q| q.pop_front()) {
                return match next {
                    Script::Reply(text) => Ok(text),
                    Script::Fail(err) => Err(err),
                };
            }
        }

        self.default_reply.clone().ok_or_else(|| {
            CapabilityError::MalformedResponse("no scripted reply for request".to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// StaticSearch
// ---------------------------------------------------------------------------

/// Search tool returning a fixed hit list for every query.
///
/// The full list is returned regardless of `limit`, so callers' enforcement
/// of the bound is observable.
#[derive(Debug, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    failure: Option<CapabilityError>,
    queries: Mutex<Vec<(String, u32)>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// `count` numbered hits pointing at `https://example.org/<n>`.
    pub fn with_hits(count: usize) -> Self {
        Self::new(
            (1..=count)
                .map(|n| SearchHit {
                    title: format!("Result {n}"),
                    snippet: format!("Snippet {n}"),
                    source: format!("https://example.org/{n}"),
                })
                .collect(),
        )
    }

    pub fn failing(error: CapabilityError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// `(query, limit)` pairs received, in call order.
    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchTool for StaticSearch {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, CapabilityError> {
        self.queries.lock().unwrap().push((query.to_string(), limit));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(self.hits.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

/// Observer that keeps every message.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    messages: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(system: &str) -> GenerationRequest {
        GenerationRequest {
            model: "gpt-4".to_string(),
            system: system.to_string(),
            user: "task".to_string(),
        }
    }

    #[tokio::test]
    async fn test_scripted_generator_replays_in_order_then_default() {
        let generator = ScriptedGenerator::new()
            .respond_to("Writer", ["one", "two"])
            .with_default_reply("fallback");

        let req = request("You are Writer.");
        assert_eq!(generator.generate(&req).await.unwrap(), "one");
        assert_eq!(generator.generate(&req).await.unwrap(), "two");
        assert_eq!(generator.generate(&req).await.unwrap(), "fallback");
        assert_eq!(generator.calls_matching("Writer"), 3);
    }

    #[tokio::test]
    async fn test_scripted_generator_without_match_fails() {
        let generator = ScriptedGenerator::new().respond_to("Writer", ["one"]);
        let err = generator.generate(&request("You are Analyst.")).await.unwrap_err();
        assert!(matches!(err, CapabilityError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_static_search_records_queries() {
        let search = StaticSearch::with_hits(3);
        let hits = search.search("ai", 2).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(search.queries(), vec![("ai".to_string(), 2)]);
    }
}
