//! PlanDesk Entitlements
//!
//! Pure editing logic for a plan's entitlements: reconciling the catalogs
//! against a plan's existing assignments, applying typed edits to the local
//! buffers, and turning those buffers back into update payloads.

pub mod buffer;
pub mod draft;
pub mod entry;
pub mod error;
pub mod limits;
pub mod payload;
pub mod reconcile;

pub use buffer::{EditBuffer, Editable, Keyed};
pub use draft::{Dimension, DimensionUpdate, PlanDraft, PlanEdit};
pub use entry::{
    CharacterAccessEdit, CharacterAccessEntry, CharacterLimit, DisplayFeatureEdit,
    DisplayFeatureEntry, SystemFeatureEdit, SystemFeatureEntry, SystemFeatureValue,
    ToolAccessEdit, ToolAccessEntry,
};
pub use error::{EditError, EditResult};
pub use reconcile::Catalog;
