use anyhow::Result;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use lens_client::DeliveryError;
use lenspeer_common::{CandidateProfile, Config, ContactRecord, EngagementFeatures};
use lenspeer_store::ContactStore;

use crate::scorer::EngagementModel;
use crate::traits::{MessageSender, ProfileSource};

/// Stats from one outreach cycle.
#[derive(Debug, Default)]
pub struct CycleStats {
    pub candidates_fetched: u32,
    pub already_contacted: u32,
    pub new_contacts: u32,
    pub persist_failures: u32,
    pub sends_attempted: u32,
    pub sends_delivered: u32,
    pub sends_failed: u32,
    pub replayed: u32,
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Outreach Cycle Complete ===")?;
        writeln!(f, "Candidates fetched: {}", self.candidates_fetched)?;
        writeln!(f, "Already contacted:  {}", self.already_contacted)?;
        writeln!(f, "New contacts:       {}", self.new_contacts)?;
        writeln!(f, "Persist failures:   {}", self.persist_failures)?;
        writeln!(f, "Replayed:           {}", self.replayed)?;
        writeln!(f, "Sends attempted:    {}", self.sends_attempted)?;
        writeln!(f, "Sends delivered:    {}", self.sends_delivered)?;
        writeln!(f, "Sends failed:       {}", self.sends_failed)?;
        Ok(())
    }
}

enum SendOutcome {
    Delivered,
    Failed,
    CredentialRejected,
}

/// The outreach cycle: fetch candidates, score them, persist and message the
/// new ones, then replay stored records that still need delivery.
///
/// Persist-before-send: a profile is recorded before the first delivery
/// attempt, so the dedup record is the source of truth. A crash between
/// persist and send leaves an undelivered record that the next cycle's
/// replay phase reconciles.
pub struct OutreachAgent {
    source: Box<dyn ProfileSource>,
    model: Box<dyn EngagementModel>,
    sender: Box<dyn MessageSender>,
    store: ContactStore,
    config: Config,
}

impl OutreachAgent {
    pub fn new(
        source: Box<dyn ProfileSource>,
        model: Box<dyn EngagementModel>,
        sender: Box<dyn MessageSender>,
        store: ContactStore,
        config: Config,
    ) -> Self {
        Self {
            source,
            model,
            sender,
            store,
            config,
        }
    }

    /// Run cycles forever. An error escaping a cycle is logged and the agent
    /// proceeds to the next one; the agent favors availability over
    /// crashing fast.
    pub async fn run(&self) {
        loop {
            let cycle = Uuid::new_v4();
            info!(cycle = %cycle, "Starting outreach cycle");
            match self.run_cycle().await {
                Ok(stats) => info!(cycle = %cycle, "{stats}"),
                Err(e) => error!(cycle = %cycle, error = %e, "Cycle failed"),
            }
            info!(
                delay_secs = self.config.cycle_delay.as_secs(),
                "Sleeping until next cycle"
            );
            sleep(self.config.cycle_delay).await;
        }
    }

    /// One full pass of the cycle state machine.
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let mut stats = CycleStats::default();

        // Fetch. If every attempt fails the cycle goes straight to sleep;
        // an empty page is a normal result and the cycle continues.
        let Some(candidates) = self.fetch_with_retry().await else {
            return Ok(stats);
        };
        stats.candidates_fetched = candidates.len() as u32;

        // Score.
        let now = Utc::now();
        let scored: Vec<(CandidateProfile, f64)> = candidates
            .into_iter()
            .map(|c| {
                let score = self.model.score(&EngagementFeatures::from(&c));
                (c, score)
            })
            .collect();

        // Persist and message new profiles.
        let mut credential_rejected = false;
        for (candidate, score) in scored {
            match self.store.exists(&candidate.profile_id).await {
                Ok(true) => {
                    stats.already_contacted += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        profile_id = candidate.profile_id.as_str(),
                        error = %e,
                        "Existence check failed, skipping candidate this cycle"
                    );
                    stats.persist_failures += 1;
                    continue;
                }
            }

            let record = ContactRecord::accept(candidate, score, now);
            if let Err(e) = self.store.insert_if_absent(&record).await {
                warn!(
                    profile_id = record.profile_id.as_str(),
                    error = %e,
                    "Failed to persist contact record, skipping candidate this cycle"
                );
                stats.persist_failures += 1;
                continue;
            }
            stats.new_contacts += 1;
            info!(
                profile_id = record.profile_id.as_str(),
                display_name = record.display_name.as_str(),
                score = record.priority_score,
                "Messaging new profile"
            );

            if matches!(
                self.deliver_one(&record, &mut stats).await,
                SendOutcome::CredentialRejected
            ) {
                credential_rejected = true;
                break;
            }
            sleep(self.config.send_pacing).await;
        }

        if credential_rejected {
            warn!("Skipping replay, no send can succeed until the credential is refreshed");
            return Ok(stats);
        }

        // Replay stored records in priority order.
        let stored = if self.config.replay_all {
            self.store.list_all().await?
        } else {
            self.store.list_undelivered().await?
        };
        for record in stored {
            stats.replayed += 1;
            info!(
                profile_id = record.profile_id.as_str(),
                display_name = record.display_name.as_str(),
                score = record.priority_score,
                "Replaying outreach to stored profile"
            );
            if matches!(
                self.deliver_one(&record, &mut stats).await,
                SendOutcome::CredentialRejected
            ) {
                break;
            }
            sleep(self.config.send_pacing).await;
        }

        Ok(stats)
    }

    /// Bounded fetch retry. Returns `None` when every attempt failed.
    async fn fetch_with_retry(&self) -> Option<Vec<CandidateProfile>> {
        for attempt in 1..=self.config.fetch_attempts {
            match self.source.fetch_candidates(self.config.page_size).await {
                Ok(candidates) => return Some(candidates),
                Err(e) => {
                    warn!(attempt, error = %e, "Profile fetch failed");
                    if attempt < self.config.fetch_attempts {
                        sleep(self.config.fetch_retry_delay).await;
                    }
                }
            }
        }
        error!(
            attempts = self.config.fetch_attempts,
            "Profile fetch failed on every attempt"
        );
        None
    }

    async fn deliver_one(&self, record: &ContactRecord, stats: &mut CycleStats) -> SendOutcome {
        stats.sends_attempted += 1;
        match self
            .sender
            .send(
                &record.profile_id,
                &self.config.message,
                &record.delivery_context,
            )
            .await
        {
            Ok(()) => {
                stats.sends_delivered += 1;
                if let Err(e) = self.store.mark_delivered(&record.profile_id, Utc::now()).await {
                    warn!(
                        profile_id = record.profile_id.as_str(),
                        error = %e,
                        "Send confirmed but not recorded, profile stays eligible for replay"
                    );
                }
                SendOutcome::Delivered
            }
            Err(DeliveryError::Unauthorized) => {
                stats.sends_failed += 1;
                error!(
                    profile_id = record.profile_id.as_str(),
                    "Credential rejected, abandoning sends for this cycle"
                );
                SendOutcome::CredentialRejected
            }
            Err(e) => {
                stats.sends_failed += 1;
                warn!(
                    profile_id = record.profile_id.as_str(),
                    error = %e,
                    "Delivery failed, record kept for replay"
                );
                SendOutcome::Failed
            }
        }
    }
}
