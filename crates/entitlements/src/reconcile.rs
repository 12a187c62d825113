//! Reconciliation of catalogs against a plan's existing assignments
//!
//! Every catalog item gets exactly one entry, in catalog order. Items the plan
//! has a record for copy that record; the rest get the documented defaults.
//! Records for items that are no longer in the catalog are dropped.

use std::collections::HashMap;

use plandesk_shared::types::{
    Character, CharacterAccessAssignment, DisplayFeature, DisplayFeatureAssignment, FeatureState,
    FeatureType, SystemFeature, SystemFeatureAssignment, Tool, ToolAccessAssignment,
    DEFAULT_PRIORITY, DEFAULT_RATE_LIMIT_PER_MINUTE, LIMIT_DISABLED,
};
use serde::{Deserialize, Serialize};

use crate::entry::{
    CharacterAccessEntry, DisplayFeatureEntry, SystemFeatureEntry, SystemFeatureValue,
    ToolAccessEntry,
};

/// Everything that can be assigned to a plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub display_features: Vec<DisplayFeature>,
    pub system_features: Vec<SystemFeature>,
    pub characters: Vec<Character>,
    pub tools: Vec<Tool>,
}

/// Index assignments by key. The first record wins when the backend repeats a key.
fn index_by<'a, A>(assignments: &'a [A], key: impl Fn(&A) -> &str) -> HashMap<&'a str, &'a A> {
    let mut index = HashMap::with_capacity(assignments.len());
    for assignment in assignments {
        index.entry(key(assignment)).or_insert(assignment);
    }
    index
}

fn log_orphans<'a>(dimension: &'static str, assigned: impl Iterator<Item = &'a str>, known: &[&str]) {
    let orphans = assigned.filter(|key| !known.contains(key)).count();
    if orphans > 0 {
        tracing::debug!(dimension, orphans, "Dropping assignments with no catalog entry");
    }
}

pub fn reconcile_display_features(
    catalog: &[DisplayFeature],
    assignments: &[DisplayFeatureAssignment],
) -> Vec<DisplayFeatureEntry> {
    let index = index_by(assignments, |a| a.feature_id.as_str());
    let known: Vec<&str> = catalog.iter().map(|f| f.id.as_str()).collect();
    log_orphans("display", index.keys().copied(), &known);

    catalog
        .iter()
        .map(|feature| match index.get(feature.id.as_str()) {
            Some(assignment) => DisplayFeatureEntry {
                feature_id: feature.id.clone(),
                name: feature.name.clone(),
                state: if assignment.is_included {
                    FeatureState::Included
                } else {
                    FeatureState::Excluded
                },
                custom_value: assignment.custom_value.clone(),
            },
            None => DisplayFeatureEntry {
                feature_id: feature.id.clone(),
                name: feature.name.clone(),
                state: FeatureState::NotShown,
                custom_value: None,
            },
        })
        .collect()
}

fn system_value(
    feature_type: &FeatureType,
    assignment: Option<&SystemFeatureAssignment>,
) -> SystemFeatureValue {
    let Some(assignment) = assignment else {
        return SystemFeatureValue::default_for(feature_type);
    };
    match feature_type {
        FeatureType::Boolean => SystemFeatureValue::Boolean {
            is_enabled: assignment.is_enabled.unwrap_or(false),
        },
        FeatureType::Limit => SystemFeatureValue::Limit {
            limit_value: assignment.limit_value.unwrap_or(LIMIT_DISABLED),
        },
        FeatureType::List => SystemFeatureValue::List {
            allowed_values: assignment.allowed_values.clone().unwrap_or_default(),
        },
        FeatureType::Unknown(_) => SystemFeatureValue::Untyped {},
    }
}

pub fn reconcile_system_features(
    catalog: &[SystemFeature],
    assignments: &[SystemFeatureAssignment],
) -> Vec<SystemFeatureEntry> {
    let index = index_by(assignments, |a| a.feature_id.as_str());
    let known: Vec<&str> = catalog.iter().map(|f| f.id.as_str()).collect();
    log_orphans("system", index.keys().copied(), &known);

    catalog
        .iter()
        .map(|feature| {
            if let FeatureType::Unknown(raw) = &feature.feature_type {
                tracing::warn!(feature_id = %feature.id, feature_type = %raw, "Unknown system feature type");
            }
            SystemFeatureEntry {
                feature_id: feature.id.clone(),
                name: feature.name.clone(),
                feature_type: feature.feature_type.clone(),
                value: system_value(
                    &feature.feature_type,
                    index.get(feature.id.as_str()).copied(),
                ),
            }
        })
        .collect()
}

pub fn reconcile_character_access(
    catalog: &[Character],
    assignments: &[CharacterAccessAssignment],
) -> Vec<CharacterAccessEntry> {
    let index = index_by(assignments, |a| a.character_id.as_str());
    let known: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
    log_orphans("character", index.keys().copied(), &known);

    catalog
        .iter()
        .map(|character| match index.get(character.id.as_str()) {
            Some(assignment) => CharacterAccessEntry {
                character_id: character.id.clone(),
                name: character.name.clone(),
                is_accessible: assignment.is_accessible,
                daily_message_limit: assignment.daily_message_limit,
                daily_token_limit: assignment.daily_token_limit,
                monthly_message_limit: assignment.monthly_message_limit,
                monthly_token_limit: assignment.monthly_token_limit,
                rate_limit_per_minute: assignment
                    .rate_limit_per_minute
                    .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE),
                priority: assignment.priority.unwrap_or(DEFAULT_PRIORITY),
            },
            None => CharacterAccessEntry::inaccessible(character.id.clone(), character.name.clone()),
        })
        .collect()
}

pub fn reconcile_tool_access(
    catalog: &[Tool],
    assignments: &[ToolAccessAssignment],
) -> Vec<ToolAccessEntry> {
    let index = index_by(assignments, |a| a.tool_name.as_str());
    let known: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
    log_orphans("tool", index.keys().copied(), &known);

    catalog
        .iter()
        .map(|tool| match index.get(tool.name.as_str()) {
            Some(assignment) => ToolAccessEntry {
                tool_name: tool.name.clone(),
                is_enabled: assignment.is_enabled,
                monthly_usage_limit: assignment.monthly_usage_limit,
            },
            None => ToolAccessEntry {
                tool_name: tool.name.clone(),
                is_enabled: false,
                monthly_usage_limit: None,
            },
        })
        .collect()
}
