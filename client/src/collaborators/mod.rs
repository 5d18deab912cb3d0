//! Collaborator contracts for the backend services
//!
//! The context, field controller and feed synchronizer talk to the backend
//! only through these traits. `http` and `ws` provide the production
//! implementations; tests supply their own.

pub mod http;
pub mod ws;

use shared::{
    ConnectionStatus, Farm, FarmCreate, FarmsSummary, FeedEntry, FeedbackAnswers, Field,
    HarvestHistoryEntry, HarvestRecord, Seed, UserProfile,
};
use tokio::sync::mpsc;

use crate::error::AppResult;

/// Farm persistence and harvest bookkeeping
pub trait FarmCollaborator: Send + Sync {
    async fn list_farms(&self, user_id: &str) -> AppResult<Vec<Farm>>;

    async fn create_farm(&self, farm: &FarmCreate) -> AppResult<Farm>;

    /// Persist one field's new state; returns the refreshed farm
    async fn update_field(&self, farm_id: &str, field: &Field) -> AppResult<Farm>;

    async fn list_seeds(&self) -> AppResult<Vec<Seed>>;

    async fn record_harvest(
        &self,
        farm_id: &str,
        field_id: u32,
        record: &HarvestRecord,
    ) -> AppResult<()>;

    async fn get_harvest_history(&self, farm_id: &str) -> AppResult<Vec<HarvestHistoryEntry>>;

    async fn submit_feedback(
        &self,
        history_id: &str,
        answers: &FeedbackAnswers,
    ) -> AppResult<()>;

    async fn check_has_farms(&self, user_id: &str) -> AppResult<FarmsSummary>;
}

/// Identity of the signed-in user
pub trait UserCollaborator: Send + Sync {
    async fn get_profile(&self) -> AppResult<UserProfile>;
}

/// What a live subscription delivers
#[derive(Debug)]
pub enum FeedSignal<E> {
    Entry(E),
    Status(ConnectionStatus),
}

/// An open push subscription; dropping it closes the subscription
pub struct FeedConnection<E> {
    pub signals: mpsc::Receiver<FeedSignal<E>>,
}

/// Push subscription plus the one-time history fetch for a feed
pub trait FeedCollaborator<E: FeedEntry>: Send + Sync {
    /// Open a subscription scoped to one user and farm
    async fn connect(&self, user_id: &str, farm_id: &str) -> AppResult<FeedConnection<E>>;

    /// Fetch the stored entries for a farm
    async fn history(&self, farm_id: &str) -> AppResult<Vec<E>>;

    /// Report an entry as read
    async fn mark_read(&self, entry_id: &str) -> AppResult<()>;
}
