//! PlanDesk Admin Client
//!
//! Talks to the admin REST API and drives the plan entitlement editor:
//! loading catalogs, selecting a plan, applying edits and saving each
//! entitlement dimension on its own.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod plans;
pub mod session;
pub mod telemetry;

pub use api::AdminApi;
pub use config::Config;
pub use error::{ClientError, ClientResult};
pub use http::HttpAdminApi;
pub use plans::PlanDirectory;
pub use session::{PlanEditor, SaveState};
