//! PlanDesk command-line front end
//!
//! Usage:
//!   plandesk plans
//!   plandesk show <plan_id>
//!   plandesk apply <plan_id> <edits.json>
//!   plandesk activate <plan_id>
//!   plandesk deactivate <plan_id>
//!
//! `edits.json` is a JSON array of edits, for example:
//!   [{"dimension":"display","id":"f1","edit":{"op":"set_state","value":"included"}},
//!    {"dimension":"character","id":"c1","edit":{"op":"set_priority","value":5}}]
//!
//! Configuration comes from the environment (or a `.env` file):
//! PLANDESK_API_URL, PLANDESK_API_TOKEN and the optional tuning variables.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use plandesk_client::catalog::load_catalog;
use plandesk_client::{telemetry, AdminApi, Config, HttpAdminApi, PlanDirectory, PlanEditor};
use plandesk_entitlements::PlanEdit;
use plandesk_shared::PlanId;
use tracing::{error, info};

const USAGE: &str = "usage: plandesk <plans | show <plan_id> | apply <plan_id> <edits.json> | activate <plan_id> | deactivate <plan_id>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let command: Vec<&str> = args.iter().map(String::as_str).collect();

    let config = Config::from_env().context("Failed to load configuration")?;
    let api: Arc<dyn AdminApi> = Arc::new(HttpAdminApi::new(&config)?);

    match command.as_slice() {
        ["plans"] => list_plans(api.as_ref()).await,
        ["show", plan_id] => show_plan(api, &config, PlanId::parse(plan_id)?).await,
        ["apply", plan_id, edits_path] => {
            apply_edits(api, &config, PlanId::parse(plan_id)?, edits_path).await
        }
        ["activate", plan_id] => set_active(api.as_ref(), PlanId::parse(plan_id)?, true).await,
        ["deactivate", plan_id] => set_active(api.as_ref(), PlanId::parse(plan_id)?, false).await,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

async fn list_plans(api: &dyn AdminApi) -> anyhow::Result<()> {
    let directory = PlanDirectory::load(api).await?;
    println!("{}", serde_json::to_string_pretty(directory.plans())?);
    Ok(())
}

async fn open_editor(
    api: Arc<dyn AdminApi>,
    config: &Config,
    plan_id: PlanId,
) -> anyhow::Result<PlanEditor> {
    let catalog = load_catalog(api.as_ref(), config.character_page_size)
        .await
        .context("Failed to load catalogs")?;
    let mut editor = PlanEditor::with_catalog(api, Arc::new(catalog));
    editor
        .select_plan(plan_id.clone())
        .await
        .with_context(|| format!("Failed to load plan {}", plan_id))?;
    Ok(editor)
}

async fn show_plan(api: Arc<dyn AdminApi>, config: &Config, plan_id: PlanId) -> anyhow::Result<()> {
    let editor = open_editor(api, config, plan_id).await?;
    let draft = editor.draft().context("Plan entitlements were not built")?;
    println!("{}", serde_json::to_string_pretty(draft)?);
    Ok(())
}

async fn apply_edits(
    api: Arc<dyn AdminApi>,
    config: &Config,
    plan_id: PlanId,
    edits_path: &str,
) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(edits_path)
        .await
        .with_context(|| format!("Failed to read {}", edits_path))?;
    let edits: Vec<PlanEdit> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid edits in {}", edits_path))?;

    let mut editor = open_editor(api, config, plan_id).await?;
    for (index, edit) in edits.into_iter().enumerate() {
        editor
            .apply(edit)
            .with_context(|| format!("Edit #{} rejected", index + 1))?;
    }

    let results = editor.save_dirty().await;
    if results.is_empty() {
        info!("Nothing to save");
        return Ok(());
    }

    let mut failed = 0;
    for (dimension, result) in &results {
        match result {
            Ok(()) => println!("{}: saved", dimension),
            Err(e) => {
                failed += 1;
                error!(dimension = %dimension, error = %e, "Save failed");
                println!("{}: failed: {}", dimension, e);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} dimensions failed to save", failed, results.len());
    }
    Ok(())
}

async fn set_active(api: &dyn AdminApi, plan_id: PlanId, active: bool) -> anyhow::Result<()> {
    let mut directory = PlanDirectory::load(api).await?;
    directory.set_active(api, &plan_id, active).await?;
    println!("{}: active={}", plan_id, active);
    Ok(())
}
