// Trait abstractions for the outreach cycle's collaborators.
//
// ProfileSource and MessageSender wrap the LensClient so the cycle can be
// driven by mocks: no network, no live credential. `cargo test` in seconds.

use async_trait::async_trait;

use lens_client::{DeliveryError, LensClient, SourceError};
use lenspeer_common::{CandidateProfile, DeliveryContext};

#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch one page of candidate profiles. A single round trip with no
    /// side effects; retry policy lives in the cycle, not here.
    async fn fetch_candidates(&self, limit: u32) -> Result<Vec<CandidateProfile>, SourceError>;
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Attempt one delivery to one profile. Exactly one outbound call.
    async fn send(
        &self,
        profile_id: &str,
        message: &str,
        context: &DeliveryContext,
    ) -> Result<(), DeliveryError>;
}

#[async_trait]
impl ProfileSource for LensClient {
    async fn fetch_candidates(&self, limit: u32) -> Result<Vec<CandidateProfile>, SourceError> {
        LensClient::fetch_candidates(self, limit).await
    }
}

#[async_trait]
impl MessageSender for LensClient {
    async fn send(
        &self,
        profile_id: &str,
        message: &str,
        context: &DeliveryContext,
    ) -> Result<(), DeliveryError> {
        self.send_message(profile_id, message, context).await
    }
}
