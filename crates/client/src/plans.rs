//! Plan directory
//!
//! The list of plans an admin picks from. Toggling a plan's active flag is
//! optimistic: the local list changes first, and the previous value is put
//! back if the backend rejects the change.

use plandesk_shared::types::{Plan, PlanId};
use tracing::warn;

use crate::api::AdminApi;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct PlanDirectory {
    plans: Vec<Plan>,
}

impl PlanDirectory {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub async fn load(api: &dyn AdminApi) -> ClientResult<Self> {
        Ok(Self::new(api.get_plans().await?))
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn get(&self, plan_id: &PlanId) -> Option<&Plan> {
        self.plans.iter().find(|plan| &plan.id == plan_id)
    }

    fn set_local(&mut self, plan_id: &PlanId, active: Option<bool>) -> ClientResult<Option<bool>> {
        let plan = self
            .plans
            .iter_mut()
            .find(|plan| &plan.id == plan_id)
            .ok_or_else(|| ClientError::PlanNotFound(plan_id.to_string()))?;
        Ok(std::mem::replace(&mut plan.is_active, active))
    }

    /// Set a plan's active flag, reverting the local change if the backend fails
    pub async fn set_active(
        &mut self,
        api: &dyn AdminApi,
        plan_id: &PlanId,
        active: bool,
    ) -> ClientResult<()> {
        let previous = self.set_local(plan_id, Some(active))?;

        if let Err(e) = api.set_plan_active(plan_id, active).await {
            warn!(plan_id = %plan_id, active, error = %e, "Reverting plan active toggle");
            self.set_local(plan_id, previous)?;
            return Err(e);
        }
        Ok(())
    }
}
