// Test mocks for the outreach cycle.
//
// Two mocks matching the two network-facing trait boundaries:
// - MockSource (ProfileSource): scripted per-call results
// - MockSender (MessageSender): per-profile scripted failures plus a call log
//
// Both are cheap clones over shared state, so a test can keep a handle while
// the agent owns the boxed trait object.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use lens_client::{DeliveryError, SourceError};
use lenspeer_common::{CandidateProfile, Config, DeliveryContext};

use crate::traits::{MessageSender, ProfileSource};

/// A config with zero delays so cycle tests run instantly.
pub fn test_config(replay_all: bool) -> Config {
    Config {
        api_url: "https://api.test".to_string(),
        auth_token: "test-token".to_string(),
        database_url: "sqlite::memory:".to_string(),
        message: "hello from the test suite".to_string(),
        page_size: 10,
        cycle_delay: Duration::ZERO,
        fetch_attempts: 3,
        fetch_retry_delay: Duration::ZERO,
        send_pacing: Duration::ZERO,
        replay_all,
    }
}

pub fn candidate(
    profile_id: &str,
    followers: u32,
    following: u32,
    interest_count: u32,
) -> CandidateProfile {
    CandidateProfile {
        profile_id: profile_id.to_string(),
        handle: format!("lens/{profile_id}"),
        display_name: profile_id.to_uppercase(),
        followers,
        following,
        interest_count,
        delivery_context: DeliveryContext {
            auth_token: "test-token".to_string(),
            profile_endpoint: format!("https://api.test/profile/{profile_id}"),
            message_endpoint: "https://api.test/messages/send".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Scripted profile source. Each fetch pops the next scripted result; once
/// the script runs out, fetches return an empty page.
#[derive(Clone, Default)]
pub struct MockSource {
    script: Arc<Mutex<VecDeque<Result<Vec<CandidateProfile>, SourceError>>>>,
    calls: Arc<Mutex<u32>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, candidates: Vec<CandidateProfile>) -> Self {
        self.script.lock().unwrap().push_back(Ok(candidates));
        self
    }

    pub fn then_unavailable(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(SourceError::Unavailable(message.to_string())));
        self
    }

    pub fn then_malformed(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(SourceError::Malformed(message.to_string())));
        self
    }

    /// How many fetches the agent made.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ProfileSource for MockSource {
    async fn fetch_candidates(&self, _limit: u32) -> Result<Vec<CandidateProfile>, SourceError> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// MockSender
// ---------------------------------------------------------------------------

/// Message sender with per-profile scripted failures and a log of every
/// attempt in order.
#[derive(Clone, Default)]
pub struct MockSender {
    failures: Arc<Mutex<HashMap<String, VecDeque<DeliveryError>>>>,
    attempts: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next send to `profile_id` with `error`; later sends succeed
    /// unless further failures are queued.
    pub fn fail_next(self, profile_id: &str, error: DeliveryError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .entry(profile_id.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Profile ids of every send attempt, in order.
    pub fn attempted_ids(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// (profile_id, message) of every send attempt, in order.
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for MockSender {
    async fn send(
        &self,
        profile_id: &str,
        message: &str,
        _context: &DeliveryContext,
    ) -> Result<(), DeliveryError> {
        self.attempts
            .lock()
            .unwrap()
            .push((profile_id.to_string(), message.to_string()));

        match self.failures.lock().unwrap().get_mut(profile_id) {
            Some(queue) => match queue.pop_front() {
                Some(error) => Err(error),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }
}
