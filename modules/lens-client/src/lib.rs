pub mod error;
pub mod types;

pub use error::{DeliveryError, SourceError};

use std::time::Duration;

use serde_json::json;

use lenspeer_common::{CandidateProfile, DeliveryContext, WalletItem};
use types::{ExploreData, GraphQlResponse, WalletsData};

/// Per-request timeout. Bounded call duration is the client's job, not the
/// caller's.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Explore query for recently active profiles, selected via the Post fragment.
const EXPLORE_PUBLICATIONS_QUERY: &str = r#"
query ExplorePublications($request: ExplorePublicationRequest!) {
  explorePublications(request: $request) {
    items {
      ... on Post {
        id
        by {
          handle {
            fullHandle
          }
          name
          stats {
            totalFollowers
            totalFollowing
          }
          interests
        }
      }
    }
  }
}
"#;

/// Wallet reference data. The wallets flow is unauthenticated.
const GET_WALLETS_QUERY: &str = r#"
query GetWallets {
    wallets {
        id
        name
        homepage
        image_id
        mobile_link
        desktop_link
        chains
    }
}
"#;

#[derive(Clone)]
pub struct LensClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl LensClient {
    pub fn new(api_url: impl Into<String>, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("HTTP client construction should not fail");
        Self {
            client,
            api_url: api_url.into(),
            token,
        }
    }

    /// Fetch up to `limit` recently active profiles from the explore feed.
    /// One network round trip, no side effects, no internal retry.
    pub async fn fetch_candidates(&self, limit: u32) -> Result<Vec<CandidateProfile>, SourceError> {
        let body = json!({
            "query": EXPLORE_PUBLICATIONS_QUERY,
            "variables": {
                "request": {
                    "sortCriteria": "LATEST",
                    "limit": limit,
                }
            }
        });

        let resp = self
            .client
            .post(format!("{}/graphql", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "explore query returned status {status}: {text}"
            )));
        }

        let candidates = parse_explore_response(&text, &self.api_url, &self.token)?;
        tracing::info!(count = candidates.len(), "Fetched candidate profiles");
        Ok(candidates)
    }

    /// Deliver one message to one profile. Exactly one outbound attempt;
    /// whether the attempt gets recorded is the caller's concern.
    pub async fn send_message(
        &self,
        profile_id: &str,
        message: &str,
        context: &DeliveryContext,
    ) -> Result<(), DeliveryError> {
        let payload = json!({
            "profile_id": profile_id,
            "message": message,
        });

        let resp = self
            .client
            .post(&context.message_endpoint)
            .bearer_auth(&context.auth_token)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(profile_id, "Message accepted");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(DeliveryError::Unauthorized),
            code if status.is_client_error() => Err(DeliveryError::ClientRejected {
                status: code,
                message: body,
            }),
            _ => Err(DeliveryError::Transient(format!(
                "message endpoint returned status {status}: {body}"
            ))),
        }
    }

    /// Fetch the wallet reference list. Unauthenticated.
    pub async fn fetch_wallets(&self) -> Result<Vec<WalletItem>, SourceError> {
        let body = json!({ "query": GET_WALLETS_QUERY });

        let resp = self
            .client
            .post(format!("{}/graphql", self.api_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "wallets query returned status {status}: {text}"
            )));
        }

        let wallets = parse_wallets_response(&text)?;
        tracing::info!(count = wallets.len(), "Fetched wallet reference data");
        Ok(wallets)
    }
}

fn parse_explore_response(
    body: &str,
    api_url: &str,
    auth_token: &str,
) -> Result<Vec<CandidateProfile>, SourceError> {
    let resp: GraphQlResponse<ExploreData> = serde_json::from_str(body)?;
    if let Some(errors) = resp.errors {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(SourceError::Malformed(messages.join("; ")));
    }
    let data = resp
        .data
        .ok_or_else(|| SourceError::Malformed("response carried no data".to_string()))?;

    Ok(data
        .explore_publications
        .items
        .into_iter()
        .filter_map(|item| item.into_candidate(api_url, auth_token))
        .collect())
}

fn parse_wallets_response(body: &str) -> Result<Vec<WalletItem>, SourceError> {
    let resp: GraphQlResponse<WalletsData> = serde_json::from_str(body)?;
    if let Some(errors) = resp.errors {
        let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
        return Err(SourceError::Malformed(messages.join("; ")));
    }
    let data = resp
        .data
        .ok_or_else(|| SourceError::Malformed("response carried no data".to_string()))?;
    Ok(data.wallets)
}
