use serde::Deserialize;

use lenspeer_common::{CandidateProfile, DeliveryContext, WalletItem};

/// Envelope for GraphQL responses. A response may carry `errors` with or
/// without `data`.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

// --- ExplorePublications ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreData {
    pub explore_publications: ExplorePublications,
}

#[derive(Debug, Deserialize)]
pub struct ExplorePublications {
    pub items: Vec<ExploreItem>,
}

/// One item from the explore feed. The query selects fields via an inline
/// fragment on Post, so non-Post items come back as empty objects; every
/// field is optional and such items are skipped.
#[derive(Debug, Deserialize)]
pub struct ExploreItem {
    pub id: Option<String>,
    pub by: Option<PublicationAuthor>,
}

#[derive(Debug, Deserialize)]
pub struct PublicationAuthor {
    pub handle: ProfileHandle,
    pub name: Option<String>,
    pub stats: ProfileStats,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHandle {
    pub full_handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_followers: u32,
    pub total_following: u32,
}

impl ExploreItem {
    /// Convert to a [`CandidateProfile`], capturing the endpoint and
    /// credential info needed to message this profile later. Returns `None`
    /// for non-Post items.
    pub fn into_candidate(self, api_url: &str, auth_token: &str) -> Option<CandidateProfile> {
        let profile_id = self.id?;
        let author = self.by?;
        Some(CandidateProfile {
            handle: author.handle.full_handle,
            display_name: author.name.unwrap_or_default(),
            followers: author.stats.total_followers,
            following: author.stats.total_following,
            interest_count: author.interests.map(|i| i.len() as u32).unwrap_or(0),
            delivery_context: DeliveryContext {
                auth_token: auth_token.to_string(),
                profile_endpoint: format!("{api_url}/profile/{profile_id}"),
                message_endpoint: format!("{api_url}/messages/send"),
            },
            profile_id,
        })
    }
}

// --- GetWallets ---

#[derive(Debug, Deserialize)]
pub struct WalletsData {
    pub wallets: Vec<WalletItem>,
}
