//! Common types used across PlanDesk

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PlanDeskError, PlanDeskResult};

// =============================================================================
// ID Wrappers
// =============================================================================

/// Backend identifiers are opaque strings. They are compared, never parsed.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Accepts any non-blank string as an identifier
            pub fn parse(raw: &str) -> PlanDeskResult<Self> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(PlanDeskError::InvalidId(format!(
                        "{} must not be empty",
                        stringify!($name)
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Subscription plan ID
    PlanId
);
string_id!(
    /// Display or system feature ID
    FeatureId
);
string_id!(
    /// AI character ID
    CharacterId
);

// =============================================================================
// Limits
// =============================================================================

/// LIMIT-type system feature sentinel for "no cap"
pub const LIMIT_UNLIMITED: i64 = -1;

/// LIMIT-type system feature value meaning "feature disabled"
pub const LIMIT_DISABLED: i64 = 0;

/// Per-minute message rate applied to characters without an explicit value
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;

/// Scheduling priority applied to characters without an explicit value
pub const DEFAULT_PRIORITY: u32 = 1;

/// Inclusive bounds shared by `rate_limit_per_minute` and `priority`
pub const MIN_RATE_LIMIT_PER_MINUTE: u32 = 1;
pub const MAX_RATE_LIMIT_PER_MINUTE: u32 = 100;
pub const MIN_PRIORITY: u32 = 1;
pub const MAX_PRIORITY: u32 = 100;

// =============================================================================
// Enums
// =============================================================================

/// Tri-state assignment of a display feature to a plan.
///
/// `NotShown` is the zero value: a feature with no backend record is not shown,
/// which is different from being explicitly excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Included,
    Excluded,
    #[default]
    NotShown,
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureState::Included => write!(f, "included"),
            FeatureState::Excluded => write!(f, "excluded"),
            FeatureState::NotShown => write!(f, "not_shown"),
        }
    }
}

impl FromStr for FeatureState {
    type Err = PlanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "included" => Ok(FeatureState::Included),
            "excluded" => Ok(FeatureState::Excluded),
            "not_shown" => Ok(FeatureState::NotShown),
            other => Err(PlanDeskError::UnknownFeatureState(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for FeatureState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Value shape of a system feature.
///
/// The backend is inconsistent about casing, so type strings are upper-cased
/// before matching. Anything else is kept verbatim as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureType {
    Boolean,
    Limit,
    List,
    Unknown(String),
}

impl FeatureType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "BOOLEAN" => FeatureType::Boolean,
            "LIMIT" => FeatureType::Limit,
            "LIST" => FeatureType::List,
            other => FeatureType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeatureType::Boolean => "BOOLEAN",
            FeatureType::Limit => "LIMIT",
            FeatureType::List => "LIST",
            FeatureType::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FeatureType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FeatureType::parse(&raw))
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Subscription plan as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Marketing-facing feature shown on pricing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFeature {
    pub id: FeatureId,
    pub name: String,
}

/// Internally enforced feature with a typed value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFeature {
    pub id: FeatureId,
    pub name: String,
    pub feature_type: FeatureType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
}

/// Callable AI tool. Tools are keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Query parameters for the public character listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CharacterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

// =============================================================================
// Existing Assignments (backend -> editor)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFeatureAssignment {
    pub feature_id: FeatureId,
    pub is_included: bool,
    #[serde(default)]
    pub custom_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFeatureAssignment {
    pub feature_id: FeatureId,
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub limit_value: Option<i64>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAccessAssignment {
    pub character_id: CharacterId,
    #[serde(default)]
    pub is_accessible: bool,
    #[serde(default)]
    pub daily_message_limit: Option<u64>,
    #[serde(default)]
    pub daily_token_limit: Option<u64>,
    #[serde(default)]
    pub monthly_message_limit: Option<u64>,
    #[serde(default)]
    pub monthly_token_limit: Option<u64>,
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
    #[serde(default)]
    pub priority: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAccessAssignment {
    pub tool_name: String,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub monthly_usage_limit: Option<u64>,
}

/// Everything the backend has on record for one plan, minus tool access.
/// Missing arrays decode as empty so a partial response stays usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFeatures {
    #[serde(default)]
    pub display_features: Vec<DisplayFeatureAssignment>,
    #[serde(default)]
    pub system_features: Vec<SystemFeatureAssignment>,
    #[serde(default)]
    pub character_access: Vec<CharacterAccessAssignment>,
}

// =============================================================================
// Update Payloads (editor -> backend)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFeatureUpdate {
    pub feature_id: FeatureId,
    pub is_included: bool,
    pub custom_value: Option<String>,
}

/// Only the fields that belong to the feature's type are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFeatureUpdate {
    pub feature_id: FeatureId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAccessUpdate {
    pub character_id: CharacterId,
    pub is_accessible: bool,
    pub daily_message_limit: Option<u64>,
    pub daily_token_limit: Option<u64>,
    pub monthly_message_limit: Option<u64>,
    pub monthly_token_limit: Option<u64>,
    pub rate_limit_per_minute: u32,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolAccessUpdate {
    pub tool_name: String,
    pub is_enabled: bool,
    pub monthly_usage_limit: Option<u64>,
}
