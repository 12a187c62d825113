//! Admin API abstraction
//!
//! The editor only depends on this trait, so it can run against the HTTP
//! backend or an in-memory fake.

use async_trait::async_trait;
use plandesk_shared::types::{
    Character, CharacterAccessUpdate, CharacterQuery, DisplayFeature, DisplayFeatureUpdate, Plan,
    PlanFeatures, PlanId, SystemFeature, SystemFeatureUpdate, Tool, ToolAccessAssignment,
    ToolAccessUpdate,
};

use crate::error::ClientResult;

/// Logical operations of the admin REST API used by the plan editor
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn get_plans(&self) -> ClientResult<Vec<Plan>>;

    async fn get_display_features(&self) -> ClientResult<Vec<DisplayFeature>>;

    async fn get_system_features(&self) -> ClientResult<Vec<SystemFeature>>;

    async fn get_public_characters(&self, query: &CharacterQuery) -> ClientResult<Vec<Character>>;

    async fn get_tools(&self) -> ClientResult<Vec<Tool>>;

    /// Display, system and character assignments recorded for a plan
    async fn get_plan_features(&self, plan_id: &PlanId) -> ClientResult<PlanFeatures>;

    async fn update_plan_display_features(
        &self,
        plan_id: &PlanId,
        items: &[DisplayFeatureUpdate],
    ) -> ClientResult<()>;

    async fn update_plan_system_features(
        &self,
        plan_id: &PlanId,
        items: &[SystemFeatureUpdate],
    ) -> ClientResult<()>;

    async fn update_plan_character_access(
        &self,
        plan_id: &PlanId,
        items: &[CharacterAccessUpdate],
    ) -> ClientResult<()>;

    async fn get_plan_tool_access(&self, plan_id: &PlanId) -> ClientResult<Vec<ToolAccessAssignment>>;

    async fn update_plan_tool_access(
        &self,
        plan_id: &PlanId,
        items: &[ToolAccessUpdate],
    ) -> ClientResult<()>;

    async fn set_plan_active(&self, plan_id: &PlanId, active: bool) -> ClientResult<()>;
}
