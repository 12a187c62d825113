//! Editor session tests against an in-memory admin API
//!
//! The fake persists saves the way the backend does, so a refresh after a
//! successful save reads back what was written.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use plandesk_client::catalog::load_catalog;
use plandesk_client::{AdminApi, ClientError, ClientResult, PlanDirectory, PlanEditor, SaveState};
use plandesk_entitlements::{
    CharacterAccessEdit, CharacterLimit, Dimension, DisplayFeatureEdit, PlanEdit,
    SystemFeatureEdit, SystemFeatureValue, ToolAccessEdit,
};
use plandesk_shared::types::*;

// ============================================================================
// Fake backend
// ============================================================================

#[derive(Default)]
struct FakeState {
    plans: Vec<Plan>,
    display_features: Vec<DisplayFeature>,
    system_features: Vec<SystemFeature>,
    characters: Vec<Character>,
    tools: Vec<Tool>,
    plan_features: HashMap<String, PlanFeatures>,
    tool_access: HashMap<String, Vec<ToolAccessAssignment>>,
    failing: HashSet<&'static str>,
    character_queries: Vec<CharacterQuery>,
    sent_display: Vec<Vec<DisplayFeatureUpdate>>,
    sent_characters: Vec<Vec<CharacterAccessUpdate>>,
}

#[derive(Default)]
struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn fail(&self, operation: &'static str) {
        self.with(|s| s.failing.insert(operation));
    }

    fn recover(&self, operation: &'static str) {
        self.with(|s| s.failing.remove(operation));
    }

    fn check(&self, operation: &'static str) -> ClientResult<()> {
        if self.with(|s| s.failing.contains(operation)) {
            return Err(ClientError::from_response(
                500,
                &format!(r#"{{"message":"{} unavailable"}}"#, operation),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    async fn get_plans(&self) -> ClientResult<Vec<Plan>> {
        self.check("get_plans")?;
        Ok(self.with(|s| s.plans.clone()))
    }

    async fn get_display_features(&self) -> ClientResult<Vec<DisplayFeature>> {
        Ok(self.with(|s| s.display_features.clone()))
    }

    async fn get_system_features(&self) -> ClientResult<Vec<SystemFeature>> {
        Ok(self.with(|s| s.system_features.clone()))
    }

    async fn get_public_characters(&self, query: &CharacterQuery) -> ClientResult<Vec<Character>> {
        Ok(self.with(|s| {
            s.character_queries.push(query.clone());
            let offset = query.offset.unwrap_or(0) as usize;
            let limit = query.limit.unwrap_or(u32::MAX) as usize;
            s.characters.iter().skip(offset).take(limit).cloned().collect()
        }))
    }

    async fn get_tools(&self) -> ClientResult<Vec<Tool>> {
        Ok(self.with(|s| s.tools.clone()))
    }

    async fn get_plan_features(&self, plan_id: &PlanId) -> ClientResult<PlanFeatures> {
        self.check("get_plan_features")?;
        Ok(self.with(|s| {
            s.plan_features
                .get(plan_id.as_str())
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn update_plan_display_features(
        &self,
        plan_id: &PlanId,
        items: &[DisplayFeatureUpdate],
    ) -> ClientResult<()> {
        self.check("update_display")?;
        self.with(|s| {
            s.sent_display.push(items.to_vec());
            s.plan_features
                .entry(plan_id.to_string())
                .or_default()
                .display_features = items
                .iter()
                .map(|item| DisplayFeatureAssignment {
                    feature_id: item.feature_id.clone(),
                    is_included: item.is_included,
                    custom_value: item.custom_value.clone(),
                })
                .collect();
        });
        Ok(())
    }

    async fn update_plan_system_features(
        &self,
        plan_id: &PlanId,
        items: &[SystemFeatureUpdate],
    ) -> ClientResult<()> {
        self.check("update_system")?;
        self.with(|s| {
            s.plan_features
                .entry(plan_id.to_string())
                .or_default()
                .system_features = items
                .iter()
                .map(|item| SystemFeatureAssignment {
                    feature_id: item.feature_id.clone(),
                    is_enabled: item.is_enabled,
                    limit_value: item.limit_value,
                    allowed_values: item.allowed_values.clone(),
                })
                .collect();
        });
        Ok(())
    }

    async fn update_plan_character_access(
        &self,
        plan_id: &PlanId,
        items: &[CharacterAccessUpdate],
    ) -> ClientResult<()> {
        self.check("update_characters")?;
        self.with(|s| {
            s.sent_characters.push(items.to_vec());
            s.plan_features
                .entry(plan_id.to_string())
                .or_default()
                .character_access = items
                .iter()
                .map(|item| CharacterAccessAssignment {
                    character_id: item.character_id.clone(),
                    is_accessible: item.is_accessible,
                    daily_message_limit: item.daily_message_limit,
                    daily_token_limit: item.daily_token_limit,
                    monthly_message_limit: item.monthly_message_limit,
                    monthly_token_limit: item.monthly_token_limit,
                    rate_limit_per_minute: Some(item.rate_limit_per_minute),
                    priority: Some(item.priority),
                })
                .collect();
        });
        Ok(())
    }

    async fn get_plan_tool_access(&self, plan_id: &PlanId) -> ClientResult<Vec<ToolAccessAssignment>> {
        self.check("get_tool_access")?;
        Ok(self.with(|s| {
            s.tool_access
                .get(plan_id.as_str())
                .cloned()
                .unwrap_or_default()
        }))
    }

    async fn update_plan_tool_access(
        &self,
        plan_id: &PlanId,
        items: &[ToolAccessUpdate],
    ) -> ClientResult<()> {
        self.check("update_tools")?;
        self.with(|s| {
            s.tool_access.insert(
                plan_id.to_string(),
                items
                    .iter()
                    .map(|item| ToolAccessAssignment {
                        tool_name: item.tool_name.clone(),
                        is_enabled: item.is_enabled,
                        monthly_usage_limit: item.monthly_usage_limit,
                    })
                    .collect(),
            );
        });
        Ok(())
    }

    async fn set_plan_active(&self, plan_id: &PlanId, active: bool) -> ClientResult<()> {
        self.check("set_plan_active")?;
        self.with(|s| {
            if let Some(plan) = s.plans.iter_mut().find(|p| &p.id == plan_id) {
                plan.is_active = Some(active);
            }
        });
        Ok(())
    }
}

// ============================================================================
// Test Utilities
// ============================================================================

fn seeded_api() -> Arc<FakeApi> {
    let api = FakeApi::default();
    api.with(|s| {
        s.plans = vec![
            Plan {
                id: PlanId::from("free"),
                name: "Free".to_string(),
                price: 0.0,
                is_active: Some(true),
            },
            Plan {
                id: PlanId::from("pro"),
                name: "Pro".to_string(),
                price: 19.99,
                is_active: Some(true),
            },
        ];
        s.display_features = ["a", "b", "c"]
            .iter()
            .map(|id| DisplayFeature {
                id: FeatureId::from(*id),
                name: id.to_uppercase(),
            })
            .collect();
        s.system_features = vec![
            SystemFeature {
                id: FeatureId::from("memory"),
                name: "Memory".to_string(),
                feature_type: FeatureType::parse("boolean"),
            },
            SystemFeature {
                id: FeatureId::from("tiers"),
                name: "Tiers".to_string(),
                feature_type: FeatureType::parse("list"),
            },
        ];
        s.characters = (1..=5)
            .map(|i| Character {
                id: CharacterId::from(format!("c{}", i)),
                name: format!("Character {}", i),
            })
            .collect();
        s.tools = vec![Tool {
            name: "web_search".to_string(),
            description: None,
        }];
        s.plan_features.insert(
            "pro".to_string(),
            PlanFeatures {
                display_features: vec![DisplayFeatureAssignment {
                    feature_id: FeatureId::from("b"),
                    is_included: true,
                    custom_value: None,
                }],
                ..Default::default()
            },
        );
    });
    Arc::new(api)
}

async fn open(api: &Arc<FakeApi>, plan: &str) -> PlanEditor {
    let catalog = load_catalog(api.as_ref(), 2).await.unwrap();
    let mut editor = PlanEditor::with_catalog(api.clone(), Arc::new(catalog));
    editor.select_plan(PlanId::from(plan)).await.unwrap();
    editor
}

fn allowed_values(editor: &PlanEditor, id: &str) -> Vec<String> {
    match &editor
        .draft()
        .unwrap()
        .system_features
        .get(id)
        .unwrap()
        .value
    {
        SystemFeatureValue::List { allowed_values } => allowed_values.clone(),
        other => panic!("expected list, got {:?}", other),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_catalog_pages_through_characters() {
    let api = seeded_api();
    let catalog = load_catalog(api.as_ref(), 2).await.unwrap();

    assert_eq!(catalog.characters.len(), 5);
    let offsets: Vec<Option<u32>> = api.with(|s| s.character_queries.iter().map(|q| q.offset).collect());
    assert_eq!(offsets, vec![Some(0), Some(2), Some(4)]);
}

#[tokio::test]
async fn test_draft_waits_for_catalog() {
    let api = seeded_api();
    let mut editor = PlanEditor::new(api.clone());

    assert!(matches!(
        editor.apply(PlanEdit::Tool {
            id: "web_search".to_string(),
            edit: ToolAccessEdit::SetEnabled(true),
        }),
        Err(ClientError::NoPlanSelected)
    ));

    editor.select_plan(PlanId::from("pro")).await.unwrap();
    assert!(editor.draft().is_none());
    assert!(matches!(
        editor.save(Dimension::Display).await,
        Err(ClientError::CatalogNotLoaded)
    ));

    let catalog = load_catalog(api.as_ref(), 10).await.unwrap();
    editor.provide_catalog(Arc::new(catalog));

    let draft = editor.draft().unwrap();
    assert_eq!(draft.display_features.len(), 3);
    assert_eq!(draft.character_access.len(), 5);
}

#[tokio::test]
async fn test_display_scenario_sends_only_assigned_feature() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    let states: Vec<FeatureState> = editor
        .draft()
        .unwrap()
        .display_features
        .entries()
        .iter()
        .map(|e| e.state)
        .collect();
    assert_eq!(
        states,
        vec![FeatureState::NotShown, FeatureState::Included, FeatureState::NotShown]
    );

    editor.save(Dimension::Display).await.unwrap();

    let sent = api.with(|s| s.sent_display.clone());
    assert_eq!(
        sent,
        vec![vec![DisplayFeatureUpdate {
            feature_id: FeatureId::from("b"),
            is_included: true,
            custom_value: None,
        }]]
    );
    assert_eq!(editor.save_state(Dimension::Display), SaveState::Saved);
}

#[tokio::test]
async fn test_failed_save_keeps_edits_for_retry() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    for value in ["gold", "silver"] {
        editor
            .apply(PlanEdit::System {
                id: "tiers".to_string(),
                edit: SystemFeatureEdit::AddAllowedValue(value.to_string()),
            })
            .unwrap();
    }
    let duplicate = editor.apply(PlanEdit::System {
        id: "tiers".to_string(),
        edit: SystemFeatureEdit::AddAllowedValue("gold".to_string()),
    });
    assert!(duplicate.is_err());
    assert_eq!(allowed_values(&editor, "tiers"), vec!["gold", "silver"]);

    api.fail("update_system");
    let err = editor.save(Dimension::System).await.unwrap_err();
    assert_eq!(err.to_string(), "API error (500): update_system unavailable");
    assert_eq!(
        editor.save_state(Dimension::System),
        SaveState::Failed("API error (500): update_system unavailable".to_string())
    );
    assert_eq!(allowed_values(&editor, "tiers"), vec!["gold", "silver"]);
    assert!(editor.draft().unwrap().is_dirty(Dimension::System));

    api.recover("update_system");
    editor.save(Dimension::System).await.unwrap();

    // Rebuilt from what the server stored
    assert_eq!(editor.save_state(Dimension::System), SaveState::Saved);
    assert_eq!(allowed_values(&editor, "tiers"), vec!["gold", "silver"]);
    assert!(!editor.draft().unwrap().is_dirty(Dimension::System));
}

#[tokio::test]
async fn test_tool_save_leaves_other_dimensions_alone() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::Display {
            id: "a".to_string(),
            edit: DisplayFeatureEdit::SetState(FeatureState::Excluded),
        })
        .unwrap();
    editor
        .apply(PlanEdit::Tool {
            id: "web_search".to_string(),
            edit: ToolAccessEdit::SetMonthlyUsageLimit(Some(250)),
        })
        .unwrap();

    editor.save(Dimension::Tool).await.unwrap();

    let draft = editor.draft().unwrap();
    assert!(draft.is_dirty(Dimension::Display));
    assert_eq!(
        draft.display_features.get("a").unwrap().state,
        FeatureState::Excluded
    );
    assert_eq!(
        draft.tool_access.get("web_search").unwrap().monthly_usage_limit,
        Some(250)
    );
    assert_eq!(editor.save_state(Dimension::Display), SaveState::Idle);
}

#[tokio::test]
async fn test_character_limits_stay_unlimited_when_granting_access() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::Character {
            id: "c2".to_string(),
            edit: CharacterAccessEdit::SetAccessible(true),
        })
        .unwrap();
    editor
        .apply(PlanEdit::Character {
            id: "c3".to_string(),
            edit: CharacterAccessEdit::SetLimit {
                limit: CharacterLimit::MonthlyTokens,
                value: Some(1_000),
            },
        })
        .unwrap();
    editor
        .apply(PlanEdit::Character {
            id: "c3".to_string(),
            edit: CharacterAccessEdit::SetPriorityInput("abc".to_string()),
        })
        .unwrap();
    editor.save(Dimension::Character).await.unwrap();

    let sent = api.with(|s| s.sent_characters.last().cloned().unwrap());
    assert_eq!(sent.len(), 5);
    let c2 = sent.iter().find(|u| u.character_id.as_str() == "c2").unwrap();
    assert!(c2.is_accessible);
    assert_eq!(c2.daily_message_limit, None);
    assert_eq!(c2.monthly_token_limit, None);
    assert_eq!(c2.rate_limit_per_minute, DEFAULT_RATE_LIMIT_PER_MINUTE);

    // Inaccessible characters still carry their limits
    let c3 = sent.iter().find(|u| u.character_id.as_str() == "c3").unwrap();
    assert!(!c3.is_accessible);
    assert_eq!(c3.monthly_token_limit, Some(1_000));
    assert_eq!(c3.priority, DEFAULT_PRIORITY);
}

#[tokio::test]
async fn test_save_dirty_reports_each_dimension() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::System {
            id: "memory".to_string(),
            edit: SystemFeatureEdit::SetEnabled(true),
        })
        .unwrap();
    editor
        .apply(PlanEdit::Tool {
            id: "web_search".to_string(),
            edit: ToolAccessEdit::SetEnabled(true),
        })
        .unwrap();
    api.fail("update_tools");

    let results = editor.save_dirty().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, Dimension::System);
    assert!(results[0].1.is_ok());
    assert_eq!(results[1].0, Dimension::Tool);
    assert!(results[1].1.is_err());
    assert!(editor.draft().unwrap().is_dirty(Dimension::Tool));
    assert!(editor.draft().unwrap().tool_access.get("web_search").unwrap().is_enabled);
}

#[tokio::test]
async fn test_switching_plans_rebuilds_from_scratch() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;
    editor
        .apply(PlanEdit::Display {
            id: "c".to_string(),
            edit: DisplayFeatureEdit::SetCustomValue(Some("10 GB".to_string())),
        })
        .unwrap();

    editor.select_plan(PlanId::from("free")).await.unwrap();

    let draft = editor.draft().unwrap();
    assert_eq!(draft.plan_id, PlanId::from("free"));
    assert!(draft.dirty_dimensions().is_empty());
    assert!(draft
        .display_features
        .entries()
        .iter()
        .all(|e| e.state == FeatureState::NotShown && e.custom_value.is_none()));
}

#[tokio::test]
async fn test_fetch_failure_recorded_as_load_error() {
    let api = seeded_api();
    let catalog = load_catalog(api.as_ref(), 10).await.unwrap();
    let mut editor = PlanEditor::with_catalog(api.clone(), Arc::new(catalog));

    api.fail("get_plan_features");
    assert!(editor.select_plan(PlanId::from("pro")).await.is_err());
    assert!(editor.draft().is_none());
    assert_eq!(
        editor.load_error(),
        Some("API error (500): get_plan_features unavailable")
    );

    api.recover("get_plan_features");
    editor.select_plan(PlanId::from("pro")).await.unwrap();
    assert!(editor.load_error().is_none());
    assert!(editor.draft().is_some());
}

#[tokio::test]
async fn test_optimistic_toggle_reverts_on_failure() {
    let api = seeded_api();
    let mut directory = PlanDirectory::load(api.as_ref()).await.unwrap();
    let pro = PlanId::from("pro");

    api.fail("set_plan_active");
    assert!(directory.set_active(api.as_ref(), &pro, false).await.is_err());
    assert_eq!(directory.get(&pro).unwrap().is_active, Some(true));

    api.recover("set_plan_active");
    directory.set_active(api.as_ref(), &pro, false).await.unwrap();
    assert_eq!(directory.get(&pro).unwrap().is_active, Some(false));

    assert!(matches!(
        directory
            .set_active(api.as_ref(), &PlanId::from("ghost"), true)
            .await,
        Err(ClientError::PlanNotFound(_))
    ));
}

fn stored_features(api: &FakeApi, plan: &str) -> PlanFeatures {
    api.with(|s| s.plan_features.get(plan).cloned().unwrap_or_default())
}

#[tokio::test]
async fn test_save_dirty_sends_every_plan_feature_dimension() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::Display {
            id: "a".to_string(),
            edit: DisplayFeatureEdit::SetState(FeatureState::Excluded),
        })
        .unwrap();
    editor
        .apply(PlanEdit::System {
            id: "memory".to_string(),
            edit: SystemFeatureEdit::SetEnabled(true),
        })
        .unwrap();
    editor
        .apply(PlanEdit::System {
            id: "tiers".to_string(),
            edit: SystemFeatureEdit::AddAllowedValue("gold".to_string()),
        })
        .unwrap();
    editor
        .apply(PlanEdit::Character {
            id: "c1".to_string(),
            edit: CharacterAccessEdit::SetAccessible(true),
        })
        .unwrap();

    let results = editor.save_dirty().await;

    let dimensions: Vec<Dimension> = results.iter().map(|(d, _)| *d).collect();
    assert_eq!(
        dimensions,
        vec![Dimension::Display, Dimension::System, Dimension::Character]
    );
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let stored = stored_features(&api, "pro");
    let a = stored
        .display_features
        .iter()
        .find(|f| f.feature_id.as_str() == "a")
        .unwrap();
    assert!(!a.is_included);
    let memory = stored
        .system_features
        .iter()
        .find(|f| f.feature_id.as_str() == "memory")
        .unwrap();
    assert_eq!(memory.is_enabled, Some(true));
    let tiers = stored
        .system_features
        .iter()
        .find(|f| f.feature_id.as_str() == "tiers")
        .unwrap();
    assert_eq!(tiers.allowed_values, Some(vec!["gold".to_string()]));
    let c1 = stored
        .character_access
        .iter()
        .find(|c| c.character_id.as_str() == "c1")
        .unwrap();
    assert!(c1.is_accessible);

    let draft = editor.draft().unwrap();
    assert!(draft.dirty_dimensions().is_empty());
    assert_eq!(allowed_values(&editor, "tiers"), vec!["gold"]);
    assert!(draft.character_access.get("c1").unwrap().is_accessible);
}

#[tokio::test]
async fn test_display_save_keeps_pending_system_edits() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::System {
            id: "memory".to_string(),
            edit: SystemFeatureEdit::SetEnabled(true),
        })
        .unwrap();
    editor
        .apply(PlanEdit::Display {
            id: "c".to_string(),
            edit: DisplayFeatureEdit::SetState(FeatureState::Included),
        })
        .unwrap();

    editor.save(Dimension::Display).await.unwrap();

    let draft = editor.draft().unwrap();
    assert!(!draft.is_dirty(Dimension::Display));
    assert!(draft.is_dirty(Dimension::System));
    assert_eq!(
        draft.system_features.get("memory").unwrap().value,
        SystemFeatureValue::Boolean { is_enabled: true }
    );
    assert!(stored_features(&api, "pro").system_features.is_empty());

    editor.save(Dimension::System).await.unwrap();

    let stored = stored_features(&api, "pro");
    assert_eq!(stored.system_features[0].is_enabled, Some(true));
    assert_eq!(stored.display_features.len(), 2);
}

#[tokio::test]
async fn test_refresh_failure_after_save_is_cleared_by_next_refresh() {
    let api = seeded_api();
    let mut editor = open(&api, "pro").await;

    editor
        .apply(PlanEdit::Display {
            id: "a".to_string(),
            edit: DisplayFeatureEdit::SetState(FeatureState::Included),
        })
        .unwrap();
    api.fail("get_plan_features");

    editor.save(Dimension::Display).await.unwrap();

    assert_eq!(editor.save_state(Dimension::Display), SaveState::Saved);
    assert_eq!(
        editor.load_error(),
        Some("API error (500): get_plan_features unavailable")
    );
    assert!(!editor.draft().unwrap().is_dirty(Dimension::Display));
    assert_eq!(
        editor.draft().unwrap().display_features.get("a").unwrap().state,
        FeatureState::Included
    );

    api.recover("get_plan_features");
    editor
        .apply(PlanEdit::System {
            id: "memory".to_string(),
            edit: SystemFeatureEdit::SetEnabled(true),
        })
        .unwrap();
    editor.save(Dimension::System).await.unwrap();

    assert!(editor.load_error().is_none());
    assert!(editor.draft().unwrap().dirty_dimensions().is_empty());
}
