//! Farm and user context
//!
//! Holds the resolved user id and the selected farm, remembers the
//! selection across sessions through the state store, and notifies
//! observers of selection changes over a watch channel.

use std::sync::Arc;

use shared::{validate_farm_create, Farm, FarmCreate, FarmsSummary, Seed};
use tokio::sync::watch;

use crate::collaborators::{FarmCollaborator, UserCollaborator};
use crate::error::{AppError, AppResult};
use crate::store::{StateStore, SELECTED_FARM_KEY};

/// Selected farm and resolved user for the session
pub struct FarmContext {
    store: Arc<dyn StateStore>,
    user_id: Option<String>,
    farms: Vec<Farm>,
    seed_catalog: Vec<Seed>,
    selected_tx: watch::Sender<Option<Farm>>,
}

impl FarmContext {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let (selected_tx, _) = watch::channel(None);
        Self {
            store,
            user_id: None,
            farms: Vec::new(),
            seed_catalog: Vec::new(),
            selected_tx,
        }
    }

    /// Resolve the user id from the profile; the email is the stable id
    pub async fn resolve_user<U: UserCollaborator>(&mut self, users: &U) -> AppResult<String> {
        let profile = users.get_profile().await?;
        tracing::debug!(user = %profile.email, "user resolved");
        self.user_id = Some(profile.email.clone());
        Ok(profile.email)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn farms(&self) -> &[Farm] {
        &self.farms
    }

    pub fn selected(&self) -> Option<Farm> {
        self.selected_tx.borrow().clone()
    }

    /// Observe selection changes
    pub fn watch_selected(&self) -> watch::Receiver<Option<Farm>> {
        self.selected_tx.subscribe()
    }

    /// Load the user's farms and restore the selection: the remembered farm
    /// if it still exists, otherwise the first farm, otherwise none.
    pub async fn load_farms<F: FarmCollaborator>(&mut self, farms_api: &F) -> AppResult<()> {
        let user_id = self.user_id.clone().ok_or(AppError::NoUserResolved)?;
        self.farms = farms_api.list_farms(&user_id).await?;

        let remembered = self.store.get(SELECTED_FARM_KEY).ok().flatten();
        let pick = remembered
            .and_then(|id| self.farms.iter().find(|f| f.id == id))
            .or_else(|| self.farms.first())
            .map(|f| f.id.clone());
        match pick {
            Some(farm_id) => self.select_farm(&farm_id)?,
            None => {
                self.selected_tx.send_replace(None);
            }
        }
        Ok(())
    }

    /// Select one of the loaded farms, persist the choice and notify
    pub fn select_farm(&mut self, farm_id: &str) -> AppResult<()> {
        let farm = self
            .farms
            .iter()
            .find(|f| f.id == farm_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("farm {farm_id}")))?;
        if let Err(err) = self.store.put(SELECTED_FARM_KEY, &farm.id) {
            tracing::warn!(error = %err, "failed to persist farm selection");
        }
        self.selected_tx.send_replace(Some(farm));
        Ok(())
    }

    /// Apply a refreshed farm (e.g. returned by a field update). The farm
    /// list is always updated; the selection only if that farm is still the
    /// selected one.
    pub fn apply_refreshed(&mut self, farm: Farm) {
        if let Some(slot) = self.farms.iter_mut().find(|f| f.id == farm.id) {
            *slot = farm.clone();
        }
        let selected_id = self.selected_tx.borrow().as_ref().map(|f| f.id.clone());
        if selected_id.as_deref() == Some(farm.id.as_str()) {
            self.selected_tx.send_replace(Some(farm));
        }
    }

    /// Validate and create a farm, adding it to the loaded list
    pub async fn create_farm<F: FarmCollaborator>(
        &mut self,
        farms_api: &F,
        farm: &FarmCreate,
    ) -> AppResult<Farm> {
        validate_farm_create(farm)?;
        let created = farms_api.create_farm(farm).await?;
        self.farms.push(created.clone());
        Ok(created)
    }

    /// Fetch the seed catalog used by planting surfaces
    pub async fn load_seed_catalog<F: FarmCollaborator>(
        &mut self,
        farms_api: &F,
    ) -> AppResult<()> {
        self.seed_catalog = farms_api.list_seeds().await?;
        Ok(())
    }

    pub fn seed_catalog(&self) -> &[Seed] {
        &self.seed_catalog
    }

    pub async fn has_farms<F: FarmCollaborator>(
        &self,
        farms_api: &F,
    ) -> AppResult<FarmsSummary> {
        let user_id = self.user_id.as_deref().ok_or(AppError::NoUserResolved)?;
        farms_api.check_has_farms(user_id).await
    }

    /// Drop the selection and forget it durably
    pub fn clear_selected(&mut self) {
        self.selected_tx.send_replace(None);
        if let Err(err) = self.store.remove(SELECTED_FARM_KEY) {
            tracing::warn!(error = %err, "failed to clear persisted farm selection");
        }
    }
}
