//! Plan entitlement editor session
//!
//! Owns the edit buffers for the selected plan. The catalog is injected by the
//! caller and may arrive before or after the plan's assignments; the draft is
//! only built once both are present.
//!
//! Each dimension saves on its own with its own state. A failed save keeps the
//! local edits so the admin can retry without re-entering them. A successful
//! save re-fetches the affected records and rebuilds only the saved dimension
//! from them, so any server-side normalization shows up locally while pending
//! edits in the other dimensions survive.

use std::collections::HashMap;
use std::sync::Arc;

use plandesk_entitlements::{Catalog, Dimension, DimensionUpdate, PlanDraft, PlanEdit};
use plandesk_shared::types::{PlanFeatures, PlanId, ToolAccessAssignment};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::api::AdminApi;
use crate::error::{ClientError, ClientResult};

/// Per-dimension save lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Saved,
    Failed(String),
}

pub struct PlanEditor {
    api: Arc<dyn AdminApi>,
    catalog: Option<Arc<Catalog>>,
    plan_id: Option<PlanId>,
    features: Option<PlanFeatures>,
    tools: Option<Vec<ToolAccessAssignment>>,
    draft: Option<PlanDraft>,
    save_states: HashMap<Dimension, SaveState>,
    load_error: Option<String>,
}

impl PlanEditor {
    pub fn new(api: Arc<dyn AdminApi>) -> Self {
        Self {
            api,
            catalog: None,
            plan_id: None,
            features: None,
            tools: None,
            draft: None,
            save_states: HashMap::new(),
            load_error: None,
        }
    }

    pub fn with_catalog(api: Arc<dyn AdminApi>, catalog: Arc<Catalog>) -> Self {
        let mut editor = Self::new(api);
        editor.catalog = Some(catalog);
        editor
    }

    /// Supply (or replace) the catalog. Builds the draft if the plan's
    /// assignments are already here.
    pub fn provide_catalog(&mut self, catalog: Arc<Catalog>) {
        self.catalog = Some(catalog);
        self.try_build();
    }

    pub fn plan_id(&self) -> Option<&PlanId> {
        self.plan_id.as_ref()
    }

    pub fn draft(&self) -> Option<&PlanDraft> {
        self.draft.as_ref()
    }

    /// Last fetch failure, if the most recent load did not complete
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn save_state(&self, dimension: Dimension) -> SaveState {
        self.save_states.get(&dimension).cloned().unwrap_or_default()
    }

    /// Switch to `plan_id`. All local state from the previous plan is dropped
    /// before anything is fetched.
    pub async fn select_plan(&mut self, plan_id: PlanId) -> ClientResult<()> {
        self.plan_id = Some(plan_id.clone());
        self.features = None;
        self.tools = None;
        self.draft = None;
        self.save_states.clear();
        self.load_error = None;

        let fetched = tokio::try_join!(
            self.api.get_plan_features(&plan_id),
            self.api.get_plan_tool_access(&plan_id),
        );
        match fetched {
            Ok((features, tools)) => {
                self.features = Some(features);
                self.tools = Some(tools);
                if !self.try_build() {
                    info!(plan_id = %plan_id, "Plan loaded, waiting for catalogs");
                }
                Ok(())
            }
            Err(e) => {
                error!(plan_id = %plan_id, error = %e, "Failed to load plan entitlements");
                self.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn try_build(&mut self) -> bool {
        let (Some(catalog), Some(plan_id), Some(features), Some(tools)) =
            (&self.catalog, &self.plan_id, &self.features, &self.tools)
        else {
            return false;
        };
        self.draft = Some(PlanDraft::build(plan_id.clone(), catalog, features, tools));
        true
    }

    fn draft_mut(&mut self) -> ClientResult<&mut PlanDraft> {
        if self.plan_id.is_none() {
            return Err(ClientError::NoPlanSelected);
        }
        self.draft.as_mut().ok_or(ClientError::CatalogNotLoaded)
    }

    /// Apply one edit to the local draft
    pub fn apply(&mut self, edit: PlanEdit) -> ClientResult<Dimension> {
        Ok(self.draft_mut()?.apply(edit)?)
    }

    /// Save one dimension. On failure the local edits stay as they are.
    pub async fn save(&mut self, dimension: Dimension) -> ClientResult<()> {
        let draft = self.draft_mut()?;
        let plan_id = draft.plan_id.clone();
        let update = draft.updates(dimension);

        self.save_states.insert(dimension, SaveState::Saving);
        info!(plan_id = %plan_id, dimension = %dimension, count = update.len(), "Saving entitlements");

        let result = match &update {
            DimensionUpdate::Display(items) => {
                self.api.update_plan_display_features(&plan_id, items).await
            }
            DimensionUpdate::System(items) => {
                self.api.update_plan_system_features(&plan_id, items).await
            }
            DimensionUpdate::Character(items) => {
                self.api.update_plan_character_access(&plan_id, items).await
            }
            DimensionUpdate::Tool(items) => self.api.update_plan_tool_access(&plan_id, items).await,
        };

        if let Err(e) = result {
            error!(plan_id = %plan_id, dimension = %dimension, error = %e, "Save failed");
            self.save_states
                .insert(dimension, SaveState::Failed(e.to_string()));
            return Err(e);
        }

        self.save_states.insert(dimension, SaveState::Saved);
        if let Some(draft) = self.draft.as_mut() {
            draft.mark_saved(dimension);
        }
        info!(plan_id = %plan_id, dimension = %dimension, "Entitlements saved");

        if let Err(e) = self.refresh(dimension).await {
            // The save itself went through; only the re-read failed
            warn!(plan_id = %plan_id, dimension = %dimension, error = %e, "Refresh after save failed");
            self.load_error = Some(e.to_string());
        }
        Ok(())
    }

    /// Save every dimension with pending edits, each independently
    pub async fn save_dirty(&mut self) -> Vec<(Dimension, ClientResult<()>)> {
        let dirty = match &self.draft {
            Some(draft) => draft.dirty_dimensions(),
            None => return Vec::new(),
        };

        let mut results = Vec::with_capacity(dirty.len());
        for dimension in dirty {
            let result = self.save(dimension).await;
            results.push((dimension, result));
        }
        results
    }

    /// Re-fetch the records behind `dimension` and rebuild that dimension
    /// alone. Display, system and character access share one record, but the
    /// other two keep their local buffers until they are saved themselves.
    async fn refresh(&mut self, dimension: Dimension) -> ClientResult<()> {
        let plan_id = self.plan_id.clone().ok_or(ClientError::NoPlanSelected)?;
        let catalog = self.catalog.clone().ok_or(ClientError::CatalogNotLoaded)?;

        if dimension.is_plan_feature() {
            self.features = Some(self.api.get_plan_features(&plan_id).await?);
        } else {
            self.tools = Some(self.api.get_plan_tool_access(&plan_id).await?);
        }

        if let (Some(draft), Some(features), Some(tools)) =
            (self.draft.as_mut(), &self.features, &self.tools)
        {
            draft.rebuild_dimension(dimension, &catalog, features, tools);
        }
        self.load_error = None;
        Ok(())
    }
}
