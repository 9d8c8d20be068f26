//! End-to-end lifecycle scenarios against the in-memory ads API: bootstrap,
//! running-state detection, budget scaling, status ordering, token scoping,
//! and the create/update flows of both campaign types.

use std::sync::Arc;

use serde_json::json;

use asc_ads_client::entities::{ActionStat, AdsInsights, ProductSet};
use asc_ads_client::error::AdsApiError;
use asc_ads_client::{AdsApi, InMemoryAdsApi};
use asc_campaigns::{CampaignHandler, CampaignProps, CampaignStore, InMemoryCampaignStore};
use asc_core::config::AscConfig;
use asc_core::error::AscError;
use asc_core::types::{CampaignKind, StoredCampaignRecord};

fn make_config() -> AscConfig {
    AscConfig {
        ad_account_id: "act_1".to_string(),
        page_id: "page_1".to_string(),
        pixel_id: "pix_1".to_string(),
        catalog_id: "cat_1".to_string(),
        store_name: "Acme Outdoors".to_string(),
        store_url: "https://acme.example".to_string(),
        access_token: "user-token".to_string(),
    }
}

/// A fully working account: funding source, minimum budgets, page token,
/// linked Instagram account, one product set, canned insights.
fn make_api(config: &AscConfig) -> Arc<InMemoryAdsApi> {
    let api = InMemoryAdsApi::new(&config.access_token);
    api.seed_object(
        &config.ad_account_id,
        json!({
            "funding_source_details": { "id": "fs_1", "type": 1 },
            "minimum_budgets": [
                { "currency": "USD", "min_daily_budget": 20 },
                { "currency": "EUR", "min_daily_budget": 18 },
            ],
        }),
    );
    api.seed_object(
        "me",
        json!({ "accounts": { "data": [
            { "id": "page_1", "access_token": "page-token" },
        ] } }),
    );
    api.seed_object(
        "page_1",
        json!({
            "instagram_accounts": { "data": [ { "id": "ig_1" } ] },
            "page_backed_instagram_accounts": { "data": [] },
        }),
    );
    api.seed_product_sets(
        "cat_1",
        vec![ProductSet {
            id: "ps_1".to_string(),
            name: "All Products".to_string(),
            product_count: Some(12),
        }],
    );
    api.seed_default_insights(AdsInsights {
        spend: 21.5,
        reach: 4_200,
        actions: vec![
            ActionStat { action_type: "link_click".to_string(), value: 230 },
            ActionStat { action_type: "view_content".to_string(), value: 140 },
            ActionStat { action_type: "add_to_cart".to_string(), value: 36 },
            ActionStat { action_type: "purchase".to_string(), value: 9 },
        ],
    });
    Arc::new(api)
}

fn make_handler(
    kind: CampaignKind,
    api: &Arc<InMemoryAdsApi>,
    store: &Arc<InMemoryCampaignStore>,
) -> CampaignHandler {
    CampaignHandler::new(
        kind,
        Arc::clone(api) as Arc<dyn AdsApi>,
        Arc::clone(store) as Arc<dyn CampaignStore>,
        &make_config(),
    )
    .unwrap()
}

fn stored_record(store: &InMemoryCampaignStore, kind: CampaignKind) -> StoredCampaignRecord {
    store.load_all().unwrap().get(kind.as_str()).cloned().unwrap()
}

fn props_json(value: serde_json::Value) -> CampaignProps {
    serde_json::from_value(value).unwrap()
}

// ─── Bootstrap ─────────────────────────────────────────────────────────────

#[test]
fn test_bootstrap_is_idempotent() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());

    let first = make_handler(CampaignKind::NewBuyers, &api, &store);
    let second = make_handler(CampaignKind::NewBuyers, &api, &store);

    assert_eq!(first.min_daily_budget(), second.min_daily_budget());
    assert_eq!(
        first.get_allowed_min_daily_budget(),
        second.get_allowed_min_daily_budget()
    );
    assert_eq!(first.get_currency(), second.get_currency());
    assert_eq!(
        first.get_ad_daily_budget().unwrap(),
        second.get_ad_daily_budget().unwrap()
    );
}

#[test]
fn test_minimum_budget_derivation() {
    let config = make_config();
    let api = make_api(&config);
    api.set_currency("EUR");
    let store = Arc::new(InMemoryCampaignStore::new());

    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    let min = handler.min_daily_budget();
    assert_eq!(min.value, 10.0);
    assert_eq!(min.conversion_rate, 0.9);
    assert_eq!(handler.get_allowed_min_daily_budget(), 10.0);
    // Not running: the advertised budget is the safety-factor proposal.
    assert_eq!(handler.get_ad_daily_budget().unwrap(), 12.0);
}

#[test]
fn test_missing_payment_method() {
    let config = make_config();
    let api = make_api(&config);
    api.seed_object(&config.ad_account_id, json!({ "minimum_budgets": [] }));
    let store = Arc::new(InMemoryCampaignStore::new());

    let result = CampaignHandler::new(
        CampaignKind::NewBuyers,
        Arc::clone(&api) as Arc<dyn AdsApi>,
        Arc::clone(&store) as Arc<dyn CampaignStore>,
        &config,
    );
    assert!(matches!(result, Err(AscError::InvalidPaymentInformation)));
}

#[test]
fn test_missing_instagram_actor() {
    let config = make_config();
    let api = make_api(&config);
    api.seed_object(
        "page_1",
        json!({
            "instagram_accounts": { "data": [] },
            "page_backed_instagram_accounts": { "data": [] },
        }),
    );
    let store = Arc::new(InMemoryCampaignStore::new());

    let result = CampaignHandler::new(
        CampaignKind::NewBuyers,
        Arc::clone(&api) as Arc<dyn AdsApi>,
        Arc::clone(&store) as Arc<dyn CampaignStore>,
        &config,
    );
    assert!(matches!(result, Err(AscError::InstagramActorNotFound)));
}

#[test]
fn test_page_backed_fallback() {
    let config = make_config();
    let api = make_api(&config);
    api.seed_object(
        "page_1",
        json!({
            "instagram_accounts": { "data": [] },
            "page_backed_instagram_accounts": { "data": [ { "id": "pbia_1" } ] },
        }),
    );
    let store = Arc::new(InMemoryCampaignStore::new());
    // Falls back to the page-backed account; construction succeeds.
    make_handler(CampaignKind::NewBuyers, &api, &store);
}

#[test]
fn test_token_restored_when_lookup_fails() {
    let config = make_config();
    let api = make_api(&config);
    api.fail_on("get_object:page_1", AdsApiError::new(None, "lookup exploded"));
    let store = Arc::new(InMemoryCampaignStore::new());

    let result = CampaignHandler::new(
        CampaignKind::NewBuyers,
        Arc::clone(&api) as Arc<dyn AdsApi>,
        Arc::clone(&store) as Arc<dyn CampaignStore>,
        &config,
    );
    assert!(matches!(result, Err(AscError::Api(_))));
    // The page token was swapped in and the user token restored on unwind.
    assert_eq!(api.access_token(), "user-token");
    let token_calls: Vec<String> = api
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("set_access_token:"))
        .collect();
    assert_eq!(
        token_calls,
        vec![
            "set_access_token:page-token".to_string(),
            "set_access_token:user-token".to_string(),
        ]
    );
}

// ─── Running state ─────────────────────────────────────────────────────────

#[test]
fn test_running_state_invariant() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());

    // No record at all.
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    assert!(!handler.is_running().unwrap());

    // Incomplete id set.
    let mut map = store.load_all().unwrap();
    map.insert(
        CampaignKind::NewBuyers.as_str().to_string(),
        StoredCampaignRecord {
            ad_account_id: Some("act_1".to_string()),
            campaign_id: Some("cmp_x".to_string()),
            adset_id: Some("as_x".to_string()),
            ad_id: None,
            adcreative_id: Some("cr_x".to_string()),
            updated_at: None,
        },
    );
    store.save_all(&map).unwrap();
    assert!(!make_handler(CampaignKind::NewBuyers, &api, &store)
        .is_running()
        .unwrap());

    // Complete ids but a different ad account.
    let mut map = store.load_all().unwrap();
    map.insert(
        CampaignKind::NewBuyers.as_str().to_string(),
        StoredCampaignRecord {
            ad_account_id: Some("act_other".to_string()),
            campaign_id: Some("cmp_x".to_string()),
            adset_id: Some("as_x".to_string()),
            ad_id: Some("ad_x".to_string()),
            adcreative_id: Some("cr_x".to_string()),
            updated_at: None,
        },
    );
    store.save_all(&map).unwrap();
    assert!(!make_handler(CampaignKind::NewBuyers, &api, &store)
        .is_running()
        .unwrap());

    // A real graph, everything ACTIVE.
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    handler
        .create_campaign(&props_json(json!({ "state": "true" })))
        .unwrap();
    assert!(handler.is_running().unwrap());
    assert!(handler.get_ad_status().unwrap());

    // One entity ARCHIVED: torn down out-of-band, must be recreated.
    let record = stored_record(&store, CampaignKind::NewBuyers);
    api.update_campaign(
        record.campaign_id.as_deref().unwrap(),
        &asc_ads_client::entities::CampaignUpdate {
            status: Some("ARCHIVED".into()),
        },
    )
    .unwrap();
    let fresh = make_handler(CampaignKind::NewBuyers, &api, &store);
    assert!(!fresh.is_running().unwrap());
    assert!(!fresh.get_ad_status().unwrap());
}

// ─── Budget scaling ────────────────────────────────────────────────────────

#[test]
fn test_budget_scaling_round_trip() {
    let config = make_config();
    for budget in [0.01, 10.0, 999.99] {
        let api = make_api(&config);
        let store = Arc::new(InMemoryCampaignStore::new());
        let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

        let props = CampaignProps {
            daily_budget: Some(budget),
            status: Some(false),
            ..Default::default()
        };
        handler.create_campaign(&props).unwrap();

        let record = stored_record(&store, CampaignKind::NewBuyers);
        let adset = api.entity_json(record.adset_id.as_deref().unwrap()).unwrap();
        assert_eq!(
            adset["daily_budget"].as_i64().unwrap(),
            (budget * 100.0_f64).round() as i64
        );
        assert_eq!(handler.get_ad_daily_budget().unwrap(), budget);
    }
}

// ─── Status transitions ────────────────────────────────────────────────────

#[test]
fn test_status_transition_ordering() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    handler
        .create_campaign(&props_json(json!({ "state": "false" })))
        .unwrap();

    api.clear_calls();
    handler.set_ad_status(true).unwrap();
    let calls = api.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls[0].starts_with("update_adcreative:"));
    assert!(calls[1].starts_with("update_campaign:"));
    assert!(calls[2].starts_with("update_adset:"));
    assert!(calls[3].starts_with("update_ad:"));

    api.clear_calls();
    handler.set_ad_status(false).unwrap();
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("update_campaign:"));
    let record = stored_record(&store, CampaignKind::NewBuyers);
    let campaign = api.entity_json(record.campaign_id.as_deref().unwrap()).unwrap();
    assert_eq!(campaign["status"], "PAUSED");
}

// ─── NewBuyers scenarios ───────────────────────────────────────────────────

#[test]
fn test_first_new_buyers_creation() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

    handler
        .create_campaign(&props_json(json!({
            "state": "true",
            "daily_budget": "15",
            "ad_message": "Buy now",
            "country": ["US", "CA"],
        })))
        .unwrap();

    let record = stored_record(&store, CampaignKind::NewBuyers);
    assert!(record.is_complete());
    assert!(record.matches_account("act_1"));

    assert!(handler.is_running().unwrap());
    assert!(handler.get_ad_status().unwrap());
    assert_eq!(handler.get_currency(), "USD");
    assert_eq!(handler.get_ad_daily_budget().unwrap(), 15.0);
    assert_eq!(handler.get_ad_message().unwrap(), "Buy now");
    assert_eq!(
        handler.get_ad_targeted_countries().unwrap(),
        vec!["US".to_string(), "CA".to_string()]
    );

    assert!(handler.are_insights_available());
    let insights = handler.insights().unwrap();
    assert_eq!(insights.spend, 21.5);
    assert_eq!(insights.reach, 4_200);
    assert_eq!(insights.actions.clicks, 230);
    assert_eq!(insights.actions.purchases, 9);

    let campaign = api.entity_json(record.campaign_id.as_deref().unwrap()).unwrap();
    assert_eq!(campaign["name"], "Acme Outdoors New Buyers Campaign [ASC]");
    assert_eq!(campaign["objective"], "OUTCOME_SALES");
    assert_eq!(campaign["smart_promotion_type"], "AUTOMATED_SHOPPING_ADS");

    let adset = api.entity_json(record.adset_id.as_deref().unwrap()).unwrap();
    assert_eq!(adset["targeting"]["geo_locations"]["countries"], json!(["US", "CA"]));
    assert_eq!(adset["promoted_object"]["custom_event_type"], "PURCHASE");
    assert_eq!(adset["bid_strategy"], "LOWEST_COST_WITHOUT_CAP");
    assert_eq!(adset["billing_event"], "IMPRESSIONS");
}

#[test]
fn test_not_supported_code_on_campaign_creation() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

    api.fail_on(
        "create_campaign:act_1",
        AdsApiError::new(2, "feature unavailable for this account"),
    );
    let result = handler.create_campaign(&props_json(json!({ "state": "false" })));
    assert!(matches!(result, Err(AscError::AscNotSupported)));
}

#[test]
fn test_non_discrimination_surfaces_typed() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

    api.fail_on(
        "create_adcreative:act_1",
        AdsApiError::new(368, "The Non-Discrimination Policy has not been accepted"),
    );
    let result = handler.create_campaign(&props_json(json!({ "state": "false" })));
    assert!(matches!(result, Err(AscError::NonDiscriminationNotAccepted)));
}

#[test]
fn test_new_buyers_message_update_replaces_pair() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    handler
        .create_campaign(&props_json(json!({ "state": "false", "ad_message": "Old" })))
        .unwrap();

    let before = stored_record(&store, CampaignKind::NewBuyers);
    let old_ad = before.ad_id.clone().unwrap();
    let old_creative = before.adcreative_id.clone().unwrap();

    handler
        .update_campaign(&props_json(json!({ "ad_message": "New message" })))
        .unwrap();

    let after = stored_record(&store, CampaignKind::NewBuyers);
    assert_ne!(after.ad_id.as_deref().unwrap(), old_ad);
    assert_ne!(after.adcreative_id.as_deref().unwrap(), old_creative);
    assert_eq!(after.adset_id, before.adset_id);
    assert_eq!(after.campaign_id, before.campaign_id);

    // The superseded pair is gone; the new pair carries the message.
    assert!(api.entity_json(&old_ad).is_none());
    assert!(api.entity_json(&old_creative).is_none());
    let creative = api.entity_json(after.adcreative_id.as_deref().unwrap()).unwrap();
    assert_eq!(creative["body"], "New message");
}

#[test]
fn test_new_buyers_failed_cleanup_propagates() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);
    handler
        .create_campaign(&props_json(json!({ "state": "false" })))
        .unwrap();

    let before = stored_record(&store, CampaignKind::NewBuyers);
    let old_ad = before.ad_id.clone().unwrap();
    api.fail_on(
        &format!("delete_object:{old_ad}"),
        AdsApiError::new(None, "deletion refused"),
    );

    let result = handler.update_campaign(&props_json(json!({ "ad_message": "New" })));
    assert!(matches!(result, Err(AscError::Api(_))));
    // New state already won: the record points at the fresh pair.
    let after = stored_record(&store, CampaignKind::NewBuyers);
    assert_ne!(after.ad_id.as_deref().unwrap(), old_ad);
}

// ─── Retargeting scenarios ─────────────────────────────────────────────────

fn create_retargeting(
    api: &Arc<InMemoryAdsApi>,
    store: &Arc<InMemoryCampaignStore>,
) -> CampaignHandler {
    let handler = make_handler(CampaignKind::Retargeting, api, store);
    handler
        .create_campaign(&props_json(json!({ "state": "false", "p4": "7" })))
        .unwrap();
    handler
}

#[test]
fn test_retargeting_creation_shape() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    create_retargeting(&api, &store);

    let record = stored_record(&store, CampaignKind::Retargeting);
    let campaign = api.entity_json(record.campaign_id.as_deref().unwrap()).unwrap();
    assert_eq!(campaign["objective"], "PRODUCT_CATALOG_SALES");
    assert_eq!(campaign["promoted_object"]["product_catalog_id"], "cat_1");

    let adset = api.entity_json(record.adset_id.as_deref().unwrap()).unwrap();
    assert_eq!(adset["optimization_goal"], "OFFSITE_CONVERSIONS");
    assert_eq!(adset["billing_event"], "IMPRESSIONS");
    assert!(adset["bid_amount"].as_i64().unwrap() > 0);
    let spec = &adset["targeting"]["product_audience_specs"][0];
    assert_eq!(spec["product_set_id"], "ps_1");
    assert_eq!(spec["inclusions"][0]["retention_seconds"], 7 * 86_400);

    let creative = api.entity_json(record.adcreative_id.as_deref().unwrap()).unwrap();
    assert_eq!(creative["template_data"]["format_option"], "carousel_images_multi_items");
    assert_eq!(creative["instagram_actor_id"], "ig_1");
}

#[test]
fn test_retargeting_visit_period_update_only() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = create_retargeting(&api, &store);
    let before = stored_record(&store, CampaignKind::Retargeting);

    api.clear_calls();
    handler
        .update_campaign(&props_json(json!({ "p4": 14 })))
        .unwrap();

    // Exactly one remote mutation: the adset, with the rebuilt window.
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("update_adset:"));

    let adset = api.entity_json(before.adset_id.as_deref().unwrap()).unwrap();
    let spec = &adset["targeting"]["product_audience_specs"][0];
    for rule in spec["inclusions"].as_array().unwrap() {
        assert_eq!(rule["retention_seconds"], 14 * 86_400);
    }
    for rule in spec["exclusions"].as_array().unwrap() {
        assert_eq!(rule["retention_seconds"], 14 * 86_400);
    }

    // Creative and ad untouched.
    let after = stored_record(&store, CampaignKind::Retargeting);
    assert_eq!(after.ad_id, before.ad_id);
    assert_eq!(after.adcreative_id, before.adcreative_id);
}

#[test]
fn test_retargeting_budget_update_resends_targeting() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = create_retargeting(&api, &store);
    let record = stored_record(&store, CampaignKind::Retargeting);

    api.clear_calls();
    handler
        .update_campaign(&props_json(json!({ "daily_budget": "25" })))
        .unwrap();

    let adset = api.entity_json(record.adset_id.as_deref().unwrap()).unwrap();
    assert_eq!(adset["daily_budget"].as_i64().unwrap(), 2_500);
    // The window was resent wholesale, preserving the current value.
    let spec = &adset["targeting"]["product_audience_specs"][0];
    assert_eq!(spec["inclusions"][0]["retention_seconds"], 7 * 86_400);
}

#[test]
fn test_retargeting_message_update_repoints_ad() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = create_retargeting(&api, &store);
    let before = stored_record(&store, CampaignKind::Retargeting);
    let old_creative = before.adcreative_id.clone().unwrap();

    // Best-effort cleanup: even a refused deletion must not fail the update.
    api.fail_on(
        &format!("delete_object:{old_creative}"),
        AdsApiError::new(None, "deletion refused"),
    );
    handler
        .update_campaign(&props_json(json!({ "ad_message": "Fresh copy" })))
        .unwrap();

    let after = stored_record(&store, CampaignKind::Retargeting);
    // Same ad object, repointed at the new creative.
    assert_eq!(after.ad_id, before.ad_id);
    assert_ne!(after.adcreative_id.as_deref().unwrap(), old_creative);

    let ad = api.entity_json(after.ad_id.as_deref().unwrap()).unwrap();
    assert_eq!(
        ad["creative"]["id"],
        json!(after.adcreative_id.as_deref().unwrap())
    );
    // The stale creative lingers; the failure was swallowed.
    assert!(api.entity_json(&old_creative).is_some());
}

// ─── Previews / choices ────────────────────────────────────────────────────

#[test]
fn test_preview_paths() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

    // Side-effect-free preview works before anything exists.
    let preview = handler.generate_ad_preview("Try this", "MOBILE_FEED_STANDARD").unwrap();
    assert!(preview.body.contains("Try this"));
    assert!(store.load_all().unwrap().is_empty());

    // The live-ad preview needs a running campaign.
    assert!(matches!(
        handler.get_ad_preview("MOBILE_FEED_STANDARD"),
        Err(AscError::CampaignNotRunning)
    ));

    handler
        .create_campaign(&props_json(json!({ "state": "false" })))
        .unwrap();
    assert!(handler.get_ad_preview("MOBILE_FEED_STANDARD").is_ok());
}

#[test]
fn test_property_choices_by_kind() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());

    let retargeting = make_handler(CampaignKind::Retargeting, &api, &store);
    let choices = retargeting.get_property_choices("visit_period").unwrap();
    assert_eq!(choices.len(), 5);
    assert_eq!(choices[0].value, 1);
    assert_eq!(choices[4].value, 28);

    assert!(matches!(
        retargeting.get_property_choices("bid_cap"),
        Err(AscError::InvalidPropertyName(_))
    ));

    let new_buyers = make_handler(CampaignKind::NewBuyers, &api, &store);
    assert!(matches!(
        new_buyers.get_property_choices("visit_period"),
        Err(AscError::InvalidPropertyName(_))
    ));
}

#[test]
fn test_not_running_defaults() {
    let config = make_config();
    let api = make_api(&config);
    let store = Arc::new(InMemoryCampaignStore::new());
    let handler = make_handler(CampaignKind::NewBuyers, &api, &store);

    assert!(!handler.get_ad_status().unwrap());
    assert_eq!(handler.get_ad_targeted_countries().unwrap(), vec!["US".to_string()]);
    assert!(!handler.are_insights_available());
    assert!(handler.insights().is_none());
}
