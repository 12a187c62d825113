//! Editable per-plan entitlement entries
//!
//! One entry exists per catalog item. Each entry type has a matching edit
//! enum; edits are validated and clamped as they are applied.

use plandesk_shared::types::{
    CharacterId, FeatureId, FeatureState, FeatureType, DEFAULT_PRIORITY,
    DEFAULT_RATE_LIMIT_PER_MINUTE,
};
use serde::{Deserialize, Serialize};

use crate::buffer::{Editable, Keyed};
use crate::error::{EditError, EditResult};
use crate::limits::{
    clamp_priority, clamp_rate_limit, parse_priority, parse_rate_limit, validate_limit_value,
};

// =============================================================================
// Display Features
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayFeatureEntry {
    pub feature_id: FeatureId,
    pub name: String,
    pub state: FeatureState,
    pub custom_value: Option<String>,
}

/// Any state is reachable from any other state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum DisplayFeatureEdit {
    SetState(FeatureState),
    SetCustomValue(Option<String>),
}

impl Keyed for DisplayFeatureEntry {
    fn key(&self) -> &str {
        self.feature_id.as_str()
    }
}

impl Editable for DisplayFeatureEntry {
    type Edit = DisplayFeatureEdit;

    fn apply(&mut self, edit: DisplayFeatureEdit) -> EditResult<()> {
        match edit {
            DisplayFeatureEdit::SetState(state) => self.state = state,
            DisplayFeatureEdit::SetCustomValue(value) => self.custom_value = value,
        }
        Ok(())
    }
}

// =============================================================================
// System Features
// =============================================================================

/// Typed value of a system feature. Only the variant matching the feature's
/// type is ever stored, so no foreign fields can leak into a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SystemFeatureValue {
    Boolean { is_enabled: bool },
    Limit { limit_value: i64 },
    List { allowed_values: Vec<String> },
    Untyped {},
}

impl SystemFeatureValue {
    /// Value used when a plan has no record for the feature
    pub fn default_for(feature_type: &FeatureType) -> Self {
        match feature_type {
            FeatureType::Boolean => SystemFeatureValue::Boolean { is_enabled: false },
            FeatureType::Limit => SystemFeatureValue::Limit { limit_value: 0 },
            FeatureType::List => SystemFeatureValue::List {
                allowed_values: Vec::new(),
            },
            FeatureType::Unknown(_) => SystemFeatureValue::Untyped {},
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SystemFeatureValue::Boolean { .. } => "BOOLEAN",
            SystemFeatureValue::Limit { .. } => "LIMIT",
            SystemFeatureValue::List { .. } => "LIST",
            SystemFeatureValue::Untyped {} => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemFeatureEntry {
    pub feature_id: FeatureId,
    pub name: String,
    pub feature_type: FeatureType,
    #[serde(flatten)]
    pub value: SystemFeatureValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum SystemFeatureEdit {
    SetEnabled(bool),
    SetLimit(i64),
    AddAllowedValue(String),
    RemoveAllowedValue(usize),
}

impl SystemFeatureEntry {
    fn mismatch(&self, expected: &'static str) -> EditError {
        EditError::TypeMismatch {
            feature_id: self.feature_id.to_string(),
            expected,
            actual: self.value.kind().to_string(),
        }
    }
}

impl Keyed for SystemFeatureEntry {
    fn key(&self) -> &str {
        self.feature_id.as_str()
    }
}

impl Editable for SystemFeatureEntry {
    type Edit = SystemFeatureEdit;

    fn apply(&mut self, edit: SystemFeatureEdit) -> EditResult<()> {
        match edit {
            SystemFeatureEdit::SetEnabled(enabled) => match &mut self.value {
                SystemFeatureValue::Boolean { is_enabled } => *is_enabled = enabled,
                _ => return Err(self.mismatch("BOOLEAN")),
            },
            SystemFeatureEdit::SetLimit(value) => {
                let value = validate_limit_value(value)?;
                match &mut self.value {
                    SystemFeatureValue::Limit { limit_value } => *limit_value = value,
                    _ => return Err(self.mismatch("LIMIT")),
                }
            }
            SystemFeatureEdit::AddAllowedValue(raw) => {
                let value = raw.trim();
                if value.is_empty() {
                    return Err(EditError::EmptyValue);
                }
                match &mut self.value {
                    SystemFeatureValue::List { allowed_values } => {
                        if allowed_values.iter().any(|existing| existing == value) {
                            return Err(EditError::DuplicateValue(value.to_string()));
                        }
                        allowed_values.push(value.to_string());
                    }
                    _ => return Err(self.mismatch("LIST")),
                }
            }
            SystemFeatureEdit::RemoveAllowedValue(index) => match &mut self.value {
                SystemFeatureValue::List { allowed_values } => {
                    if index >= allowed_values.len() {
                        return Err(EditError::IndexOutOfRange {
                            index,
                            len: allowed_values.len(),
                        });
                    }
                    allowed_values.remove(index);
                }
                _ => return Err(self.mismatch("LIST")),
            },
        }
        Ok(())
    }
}

// =============================================================================
// Character Access
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterAccessEntry {
    pub character_id: CharacterId,
    pub name: String,
    pub is_accessible: bool,
    pub daily_message_limit: Option<u64>,
    pub daily_token_limit: Option<u64>,
    pub monthly_message_limit: Option<u64>,
    pub monthly_token_limit: Option<u64>,
    pub rate_limit_per_minute: u32,
    pub priority: u32,
}

impl CharacterAccessEntry {
    /// Entry for a character the plan has no record for
    pub fn inaccessible(character_id: CharacterId, name: String) -> Self {
        Self {
            character_id,
            name,
            is_accessible: false,
            daily_message_limit: None,
            daily_token_limit: None,
            monthly_message_limit: None,
            monthly_token_limit: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// The four independent usage ceilings. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterLimit {
    DailyMessages,
    DailyTokens,
    MonthlyMessages,
    MonthlyTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum CharacterAccessEdit {
    SetAccessible(bool),
    SetLimit {
        limit: CharacterLimit,
        value: Option<u64>,
    },
    SetRateLimit(i64),
    SetPriority(i64),
    /// Raw form input; unparseable text resets to the default
    SetRateLimitInput(String),
    SetPriorityInput(String),
}

impl Keyed for CharacterAccessEntry {
    fn key(&self) -> &str {
        self.character_id.as_str()
    }
}

impl Editable for CharacterAccessEntry {
    type Edit = CharacterAccessEdit;

    fn apply(&mut self, edit: CharacterAccessEdit) -> EditResult<()> {
        match edit {
            // Limits are left alone: toggling access never fills them in
            CharacterAccessEdit::SetAccessible(accessible) => self.is_accessible = accessible,
            CharacterAccessEdit::SetLimit { limit, value } => {
                let slot = match limit {
                    CharacterLimit::DailyMessages => &mut self.daily_message_limit,
                    CharacterLimit::DailyTokens => &mut self.daily_token_limit,
                    CharacterLimit::MonthlyMessages => &mut self.monthly_message_limit,
                    CharacterLimit::MonthlyTokens => &mut self.monthly_token_limit,
                };
                *slot = value;
            }
            CharacterAccessEdit::SetRateLimit(value) => {
                self.rate_limit_per_minute = clamp_rate_limit(value)
            }
            CharacterAccessEdit::SetPriority(value) => self.priority = clamp_priority(value),
            CharacterAccessEdit::SetRateLimitInput(input) => {
                self.rate_limit_per_minute = parse_rate_limit(&input)
            }
            CharacterAccessEdit::SetPriorityInput(input) => self.priority = parse_priority(&input),
        }
        Ok(())
    }
}

// =============================================================================
// Tool Access
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolAccessEntry {
    pub tool_name: String,
    pub is_enabled: bool,
    pub monthly_usage_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum ToolAccessEdit {
    SetEnabled(bool),
    SetMonthlyUsageLimit(Option<u64>),
}

impl Keyed for ToolAccessEntry {
    fn key(&self) -> &str {
        &self.tool_name
    }
}

impl Editable for ToolAccessEntry {
    type Edit = ToolAccessEdit;

    fn apply(&mut self, edit: ToolAccessEdit) -> EditResult<()> {
        match edit {
            ToolAccessEdit::SetEnabled(enabled) => self.is_enabled = enabled,
            ToolAccessEdit::SetMonthlyUsageLimit(limit) => self.monthly_usage_limit = limit,
        }
        Ok(())
    }
}
