use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Endpoint and credential info captured when a profile is first seen, so the
/// profile can still be messaged in a later cycle or after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryContext {
    pub auth_token: String,
    pub profile_endpoint: String,
    pub message_endpoint: String,
}

/// A profile fetched this cycle. Transient: becomes a [`ContactRecord`] only
/// if it survives the dedup check.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub profile_id: String,
    pub handle: String,
    pub display_name: String,
    pub followers: u32,
    pub following: u32,
    pub interest_count: u32,
    pub delivery_context: DeliveryContext,
}

/// Durable record marking a profile as selected for outreach.
///
/// `profile_id` is the unique key; the first write wins and the record is
/// never overwritten. `delivered_at` is set once the first send is confirmed.
#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub profile_id: String,
    pub handle: String,
    pub display_name: String,
    pub followers: u32,
    pub following: u32,
    pub interest_count: u32,
    pub delivery_context: DeliveryContext,
    pub priority_score: f64,
    pub first_seen_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl ContactRecord {
    /// Accept a candidate: stamp it with its score and first-seen time.
    pub fn accept(candidate: CandidateProfile, priority_score: f64, now: DateTime<Utc>) -> Self {
        Self {
            profile_id: candidate.profile_id,
            handle: candidate.handle,
            display_name: candidate.display_name,
            followers: candidate.followers,
            following: candidate.following,
            interest_count: candidate.interest_count,
            delivery_context: candidate.delivery_context,
            priority_score,
            first_seen_at: now,
            delivered_at: None,
        }
    }
}

/// Wallet metadata from the reference API, cached for downstream features.
/// Keyed by `id`; inserted once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletItem {
    pub id: String,
    pub name: String,
    pub homepage: String,
    pub image_id: String,
    pub mobile_link: Option<String>,
    pub desktop_link: Option<String>,
    pub chains: Vec<String>,
}

/// The feature set an engagement model scores on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementFeatures {
    pub followers: u32,
    pub following: u32,
    pub interest_count: u32,
}

impl From<&CandidateProfile> for EngagementFeatures {
    fn from(candidate: &CandidateProfile) -> Self {
        Self {
            followers: candidate.followers,
            following: candidate.following,
            interest_count: candidate.interest_count,
        }
    }
}
