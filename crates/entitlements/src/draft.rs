//! Local edit buffer for one plan
//!
//! A `PlanDraft` holds the four entitlement dimensions side by side. They are
//! rebuilt, edited and saved independently: there is no cross-dimension
//! transaction.

use std::fmt;

use plandesk_shared::types::{
    CharacterAccessUpdate, DisplayFeatureUpdate, PlanFeatures, PlanId, SystemFeatureUpdate,
    ToolAccessAssignment, ToolAccessUpdate,
};
use serde::{Deserialize, Serialize};

use crate::buffer::EditBuffer;
use crate::entry::{
    CharacterAccessEdit, CharacterAccessEntry, DisplayFeatureEdit, DisplayFeatureEntry,
    SystemFeatureEdit, SystemFeatureEntry, ToolAccessEdit, ToolAccessEntry,
};
use crate::error::EditResult;
use crate::payload;
use crate::reconcile::{self, Catalog};

/// One independently saved slice of a plan's entitlements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Display,
    System,
    Character,
    Tool,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Display,
        Dimension::System,
        Dimension::Character,
        Dimension::Tool,
    ];

    /// Dimensions stored in the plan-features record (tools live elsewhere)
    pub fn is_plan_feature(&self) -> bool {
        !matches!(self, Dimension::Tool)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Display => write!(f, "display_features"),
            Dimension::System => write!(f, "system_features"),
            Dimension::Character => write!(f, "character_access"),
            Dimension::Tool => write!(f, "tool_access"),
        }
    }
}

/// An edit addressed to one entry of one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dimension", rename_all = "snake_case")]
pub enum PlanEdit {
    Display {
        id: String,
        edit: DisplayFeatureEdit,
    },
    System {
        id: String,
        edit: SystemFeatureEdit,
    },
    Character {
        id: String,
        edit: CharacterAccessEdit,
    },
    Tool {
        id: String,
        edit: ToolAccessEdit,
    },
}

impl PlanEdit {
    pub fn dimension(&self) -> Dimension {
        match self {
            PlanEdit::Display { .. } => Dimension::Display,
            PlanEdit::System { .. } => Dimension::System,
            PlanEdit::Character { .. } => Dimension::Character,
            PlanEdit::Tool { .. } => Dimension::Tool,
        }
    }
}

/// Wire payload for saving one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionUpdate {
    Display(Vec<DisplayFeatureUpdate>),
    System(Vec<SystemFeatureUpdate>),
    Character(Vec<CharacterAccessUpdate>),
    Tool(Vec<ToolAccessUpdate>),
}

impl DimensionUpdate {
    pub fn len(&self) -> usize {
        match self {
            DimensionUpdate::Display(items) => items.len(),
            DimensionUpdate::System(items) => items.len(),
            DimensionUpdate::Character(items) => items.len(),
            DimensionUpdate::Tool(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanDraft {
    pub plan_id: PlanId,
    pub display_features: EditBuffer<DisplayFeatureEntry>,
    pub system_features: EditBuffer<SystemFeatureEntry>,
    pub character_access: EditBuffer<CharacterAccessEntry>,
    pub tool_access: EditBuffer<ToolAccessEntry>,
}

impl PlanDraft {
    /// Reconcile every dimension from scratch
    pub fn build(
        plan_id: PlanId,
        catalog: &Catalog,
        features: &PlanFeatures,
        tools: &[ToolAccessAssignment],
    ) -> Self {
        let mut draft = Self {
            plan_id,
            display_features: EditBuffer::default(),
            system_features: EditBuffer::default(),
            character_access: EditBuffer::default(),
            tool_access: EditBuffer::default(),
        };
        for dimension in Dimension::ALL {
            draft.rebuild_dimension(dimension, catalog, features, tools);
        }
        draft
    }

    /// Replace one dimension's buffer from fresh assignments. Pending edits in
    /// the other dimensions are kept.
    pub fn rebuild_dimension(
        &mut self,
        dimension: Dimension,
        catalog: &Catalog,
        features: &PlanFeatures,
        tools: &[ToolAccessAssignment],
    ) {
        match dimension {
            Dimension::Display => {
                self.display_features = EditBuffer::new(reconcile::reconcile_display_features(
                    &catalog.display_features,
                    &features.display_features,
                ))
            }
            Dimension::System => {
                self.system_features = EditBuffer::new(reconcile::reconcile_system_features(
                    &catalog.system_features,
                    &features.system_features,
                ))
            }
            Dimension::Character => {
                self.character_access = EditBuffer::new(reconcile::reconcile_character_access(
                    &catalog.characters,
                    &features.character_access,
                ))
            }
            Dimension::Tool => {
                self.tool_access =
                    EditBuffer::new(reconcile::reconcile_tool_access(&catalog.tools, tools))
            }
        }
    }

    /// The backend accepted `dimension` as it stands locally
    pub fn mark_saved(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Display => self.display_features.mark_clean(),
            Dimension::System => self.system_features.mark_clean(),
            Dimension::Character => self.character_access.mark_clean(),
            Dimension::Tool => self.tool_access.mark_clean(),
        }
    }

    /// Route an edit to its dimension. Returns the dimension that changed.
    pub fn apply(&mut self, edit: PlanEdit) -> EditResult<Dimension> {
        let dimension = edit.dimension();
        match edit {
            PlanEdit::Display { id, edit } => self.display_features.apply(&id, edit)?,
            PlanEdit::System { id, edit } => self.system_features.apply(&id, edit)?,
            PlanEdit::Character { id, edit } => self.character_access.apply(&id, edit)?,
            PlanEdit::Tool { id, edit } => self.tool_access.apply(&id, edit)?,
        }
        Ok(dimension)
    }

    pub fn is_dirty(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Display => self.display_features.is_dirty(),
            Dimension::System => self.system_features.is_dirty(),
            Dimension::Character => self.character_access.is_dirty(),
            Dimension::Tool => self.tool_access.is_dirty(),
        }
    }

    pub fn dirty_dimensions(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|dimension| self.is_dirty(*dimension))
            .collect()
    }

    /// Build the save payload for one dimension from its current buffer
    pub fn updates(&self, dimension: Dimension) -> DimensionUpdate {
        match dimension {
            Dimension::Display => DimensionUpdate::Display(payload::display_feature_updates(
                self.display_features.entries(),
            )),
            Dimension::System => DimensionUpdate::System(payload::system_feature_updates(
                self.system_features.entries(),
            )),
            Dimension::Character => DimensionUpdate::Character(payload::character_access_updates(
                self.character_access.entries(),
            )),
            Dimension::Tool => {
                DimensionUpdate::Tool(payload::tool_access_updates(self.tool_access.entries()))
            }
        }
    }
}
