//! Field lifecycle control
//!
//! Drives the field state machine (Empty → Planted → Growing → Ready →
//! Empty) for the bound farm. Planting and harvesting persist through the
//! farm collaborator and apply the result locally only if the same farm is
//! still bound when the call completes; growth advancement and reset are
//! local-only.

use chrono::NaiveDate;
use shared::{
    days_since_planting, derive_stage_for, validate_harvest_date, validate_seed_choice,
    validate_sowing_date, Crop, CropStatus, Farm, FeedbackAnswers, Field, GrowthStage,
    HarvestHistoryEntry, HarvestRecord, SeedType,
};

use crate::collaborators::FarmCollaborator;
use crate::error::{AppError, AppResult};

/// Controller for the bound farm's field slots
pub struct FieldLifecycleController<F: FarmCollaborator> {
    farms_api: F,
    farm_id: Option<String>,
    fields: Vec<Field>,
}

impl<F: FarmCollaborator> FieldLifecycleController<F> {
    pub fn new(farms_api: F) -> Self {
        Self {
            farms_api,
            farm_id: None,
            fields: Vec::new(),
        }
    }

    /// Bind the controller to a farm's fields
    pub fn load_from(&mut self, farm: &Farm) {
        self.farm_id = Some(farm.id.clone());
        self.fields = farm.fields.clone();
    }

    pub fn unload(&mut self) {
        self.farm_id = None;
        self.fields.clear();
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, field_id: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn first_empty_field_id(&self) -> Option<u32> {
        self.fields.iter().find(|f| f.is_empty()).map(|f| f.id)
    }

    /// Plant a seed in an empty field. The growth stage is derived from the
    /// days already elapsed since the sowing date, so a backdated sowing can
    /// start the crop pre-grown, up to Ready.
    pub async fn plant(
        &mut self,
        field_id: u32,
        seed: Option<SeedType>,
        sowing_date: &str,
        today: NaiveDate,
    ) -> AppResult<Farm> {
        let farm_id = self.farm_id.clone().ok_or(AppError::NoFarmSelected)?;
        let seed = validate_seed_choice(seed)?;
        let planted_date = validate_sowing_date(sowing_date, today)?;

        let field = self
            .field(field_id)
            .ok_or(AppError::FieldNotFound(field_id))?;
        if !field.is_empty() {
            return Err(AppError::InvalidStateTransition(format!(
                "field {field_id} is not empty"
            )));
        }

        let growth_stage = derive_stage_for(seed, days_since_planting(planted_date, today));
        let status = if growth_stage == GrowthStage::Ready {
            CropStatus::Ready
        } else {
            CropStatus::Planted
        };
        let candidate = Field {
            id: field_id,
            crop: Some(Crop {
                status,
                seed_type: seed,
                planted_date,
                growth_stage,
                harvest_date: None,
            }),
        };

        let refreshed = self.farms_api.update_field(&farm_id, &candidate).await?;
        // the farm may have been switched while the update was in flight
        if self.farm_id.as_deref() == Some(farm_id.as_str()) {
            self.fields = refreshed.fields.clone();
        }
        Ok(refreshed)
    }

    /// Step the crop one stage forward; already-Ready crops stay put
    pub fn advance_growth(&mut self, field_id: u32) -> AppResult<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or(AppError::FieldNotFound(field_id))?;
        let Some(crop) = field.crop.as_mut() else {
            return Err(AppError::InvalidStateTransition(format!(
                "field {field_id} is empty"
            )));
        };
        match crop.growth_stage {
            GrowthStage::Seedling => {
                crop.growth_stage = GrowthStage::Young;
                crop.status = CropStatus::Growing;
            }
            GrowthStage::Young => {
                crop.growth_stage = GrowthStage::Mature;
                crop.status = CropStatus::Growing;
            }
            GrowthStage::Mature => {
                crop.growth_stage = GrowthStage::Ready;
                crop.status = CropStatus::Ready;
            }
            GrowthStage::Ready => {}
        }
        Ok(())
    }

    /// Harvest an occupied field. The harvest is recorded first; the field
    /// is cleared locally only after the collaborator accepts it.
    pub async fn harvest(
        &mut self,
        field_id: u32,
        harvest_date: &str,
        today: NaiveDate,
    ) -> AppResult<()> {
        let farm_id = self.farm_id.clone().ok_or(AppError::NoFarmSelected)?;
        let field = self
            .field(field_id)
            .ok_or(AppError::FieldNotFound(field_id))?;
        let planted_date = match &field.crop {
            Some(crop) => crop.planted_date,
            None => {
                return Err(AppError::InvalidStateTransition(format!(
                    "field {field_id} is empty"
                )))
            }
        };
        let harvest_date = validate_harvest_date(harvest_date, planted_date, today)?;

        let record = HarvestRecord {
            harvest_date,
            answers: Vec::new(),
        };
        self.farms_api
            .record_harvest(&farm_id, field_id, &record)
            .await?;

        if self.farm_id.as_deref() == Some(farm_id.as_str()) {
            if let Some(field) = self.fields.iter_mut().find(|f| f.id == field_id) {
                field.crop = None;
            }
        }
        Ok(())
    }

    /// Unconditionally clear a field back to Empty, locally
    pub fn reset(&mut self, field_id: u32) -> AppResult<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or(AppError::FieldNotFound(field_id))?;
        field.crop = None;
        Ok(())
    }

    pub async fn harvest_history(&self) -> AppResult<Vec<HarvestHistoryEntry>> {
        let farm_id = self.farm_id.as_deref().ok_or(AppError::NoFarmSelected)?;
        self.farms_api.get_harvest_history(farm_id).await
    }

    pub async fn submit_feedback(
        &self,
        history_id: &str,
        answers: &FeedbackAnswers,
    ) -> AppResult<()> {
        self.farms_api.submit_feedback(history_id, answers).await
    }
}
