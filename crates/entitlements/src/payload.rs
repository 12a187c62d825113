//! Save payloads
//!
//! Each dimension serializes its whole buffer independently. Nothing here
//! diffs against the server: the backend replaces the plan's records for the
//! dimension with whatever is sent.

use plandesk_shared::types::{
    CharacterAccessUpdate, DisplayFeatureUpdate, FeatureState, SystemFeatureUpdate,
    ToolAccessUpdate,
};

use crate::entry::{
    CharacterAccessEntry, DisplayFeatureEntry, SystemFeatureEntry, SystemFeatureValue,
    ToolAccessEntry,
};

/// `NotShown` means "no opinion" and is never sent
pub fn display_feature_updates(entries: &[DisplayFeatureEntry]) -> Vec<DisplayFeatureUpdate> {
    entries
        .iter()
        .filter(|entry| entry.state != FeatureState::NotShown)
        .map(|entry| DisplayFeatureUpdate {
            feature_id: entry.feature_id.clone(),
            is_included: entry.state == FeatureState::Included,
            custom_value: entry
                .custom_value
                .clone()
                .filter(|value| !value.is_empty()),
        })
        .collect()
}

pub fn system_feature_updates(entries: &[SystemFeatureEntry]) -> Vec<SystemFeatureUpdate> {
    entries
        .iter()
        .map(|entry| {
            let mut update = SystemFeatureUpdate {
                feature_id: entry.feature_id.clone(),
                is_enabled: None,
                limit_value: None,
                allowed_values: None,
            };
            match &entry.value {
                SystemFeatureValue::Boolean { is_enabled } => update.is_enabled = Some(*is_enabled),
                SystemFeatureValue::Limit { limit_value } => update.limit_value = Some(*limit_value),
                SystemFeatureValue::List { allowed_values } => {
                    update.allowed_values = Some(allowed_values.clone())
                }
                SystemFeatureValue::Untyped {} => {}
            }
            update
        })
        .collect()
}

/// Limits are sent even for inaccessible characters; the server ignores them
pub fn character_access_updates(entries: &[CharacterAccessEntry]) -> Vec<CharacterAccessUpdate> {
    entries
        .iter()
        .map(|entry| CharacterAccessUpdate {
            character_id: entry.character_id.clone(),
            is_accessible: entry.is_accessible,
            daily_message_limit: entry.daily_message_limit,
            daily_token_limit: entry.daily_token_limit,
            monthly_message_limit: entry.monthly_message_limit,
            monthly_token_limit: entry.monthly_token_limit,
            rate_limit_per_minute: entry.rate_limit_per_minute,
            priority: entry.priority,
        })
        .collect()
}

pub fn tool_access_updates(entries: &[ToolAccessEntry]) -> Vec<ToolAccessUpdate> {
    entries
        .iter()
        .map(|entry| ToolAccessUpdate {
            tool_name: entry.tool_name.clone(),
            is_enabled: entry.is_enabled,
            monthly_usage_limit: entry.monthly_usage_limit,
        })
        .collect()
}
