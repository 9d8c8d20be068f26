//! In-memory ads API backed by DashMap.
//!
//! Production: replace with an HTTP client for the marketing API. This
//! provides the same API surface for development and testing, records every
//! call for ordering assertions, and supports per-call failure injection.

use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use asc_core::config::AscConfig;
use asc_core::types::EntityStatus;

use crate::api::AdsApi;
use crate::entities::*;
use crate::error::{AdsApiError, ApiResult};

pub struct InMemoryAdsApi {
    /// Created campaign/adset/ad/creative objects, keyed by id.
    entities: DashMap<String, Value>,
    /// Introspection objects (`me`, the ad account, the page), keyed by id.
    objects: DashMap<String, Value>,
    product_sets: DashMap<String, Vec<ProductSet>>,
    insights: DashMap<String, AdsInsights>,
    default_insights: RwLock<Option<AdsInsights>>,
    currency: RwLock<String>,
    access_token: RwLock<String>,
    /// `method:target` entries in call order.
    calls: Mutex<Vec<String>>,
    /// One-shot failures keyed by `method:target`; consumed when triggered.
    failures: Mutex<HashMap<String, AdsApiError>>,
}

impl InMemoryAdsApi {
    pub fn new(access_token: &str) -> Self {
        Self {
            entities: DashMap::new(),
            objects: DashMap::new(),
            product_sets: DashMap::new(),
            insights: DashMap::new(),
            default_insights: RwLock::new(None),
            currency: RwLock::new("USD".to_string()),
            access_token: RwLock::new(access_token.to_string()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    // ─── Seeding ───────────────────────────────────────────────────────────

    pub fn seed_object(&self, id: &str, value: Value) {
        self.objects.insert(id.to_string(), value);
    }

    pub fn set_currency(&self, currency: &str) {
        *self.currency.write() = currency.to_string();
    }

    pub fn seed_product_sets(&self, catalog_id: &str, sets: Vec<ProductSet>) {
        self.product_sets.insert(catalog_id.to_string(), sets);
    }

    pub fn seed_insights(&self, campaign_id: &str, insights: AdsInsights) {
        self.insights.insert(campaign_id.to_string(), insights);
    }

    /// Insights returned for any campaign without an explicit entry. Useful
    /// when the campaign id is minted during the scenario under test.
    pub fn seed_default_insights(&self, insights: AdsInsights) {
        *self.default_insights.write() = Some(insights);
    }

    /// Populate a fully working account: funding source, minimum budgets,
    /// page token, linked Instagram account, product sets. Used by the CLI
    /// demo mode.
    pub fn seed_demo(&self, config: &AscConfig) {
        self.seed_object(
            &config.ad_account_id,
            json!({
                "funding_source_details": { "id": "fs_demo", "type": 1 },
                "minimum_budgets": [
                    { "currency": "USD", "min_daily_budget": 100 },
                    { "currency": "EUR", "min_daily_budget": 84 },
                    { "currency": "GBP", "min_daily_budget": 73 },
                ],
            }),
        );
        self.seed_object(
            "me",
            json!({
                "accounts": { "data": [
                    { "id": config.page_id, "access_token": "page-token-demo" },
                ] },
            }),
        );
        self.seed_object(
            &config.page_id,
            json!({
                "instagram_accounts": { "data": [ { "id": "ig_demo" } ] },
                "page_backed_instagram_accounts": { "data": [] },
            }),
        );
        self.seed_product_sets(
            &config.catalog_id,
            vec![ProductSet {
                id: "ps_all_products".to_string(),
                name: "All Products".to_string(),
                product_count: Some(240),
            }],
        );
        self.seed_default_insights(AdsInsights {
            spend: 184.2,
            reach: 51_300,
            actions: vec![
                ActionStat { action_type: "link_click".to_string(), value: 1_890 },
                ActionStat { action_type: "view_content".to_string(), value: 1_240 },
                ActionStat { action_type: "add_to_cart".to_string(), value: 310 },
                ActionStat { action_type: "purchase".to_string(), value: 74 },
            ],
        });
    }

    // ─── Inspection ────────────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn entity_json(&self, id: &str) -> Option<Value> {
        self.entities.get(id).map(|r| r.value().clone())
    }

    /// Queue a failure for the next call recorded as `method:target`.
    pub fn fail_on(&self, key: &str, error: AdsApiError) {
        self.failures.lock().insert(key.to_string(), error);
    }

    // ─── Internals ─────────────────────────────────────────────────────────

    fn begin(&self, method: &str, target: &str) -> ApiResult<()> {
        let key = format!("{method}:{target}");
        debug!(call = %key, "in-memory ads API call");
        self.calls.lock().push(key.clone());
        if let Some(err) = self.failures.lock().remove(&key) {
            return Err(err);
        }
        Ok(())
    }

    fn mint_id(prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }

    fn store_entity(&self, id: &str, mut value: Value) {
        value["id"] = json!(id);
        value["created_time"] = json!(chrono::Utc::now().to_rfc3339());
        self.entities.insert(id.to_string(), value);
    }

    fn read_entity<T: serde::de::DeserializeOwned>(&self, id: &str) -> ApiResult<T> {
        let value = self
            .entities
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| AdsApiError::new(100, format!("Unknown object: {id}")))?;
        serde_json::from_value(value)
            .map_err(|e| AdsApiError::new(None, format!("Malformed object {id}: {e}")))
    }

    fn patch_entity(&self, id: &str, patch: Value) -> ApiResult<()> {
        let mut entry = self
            .entities
            .get_mut(id)
            .ok_or_else(|| AdsApiError::new(100, format!("Unknown object: {id}")))?;
        if let Value::Object(fields) = patch {
            for (k, v) in fields {
                entry.value_mut()[k] = v;
            }
        }
        Ok(())
    }

    fn to_value<T: serde::Serialize>(params: &T) -> Value {
        serde_json::to_value(params).unwrap_or_else(|_| json!({}))
    }
}

impl AdsApi for InMemoryAdsApi {
    fn create_campaign(&self, account_id: &str, params: &CampaignParams) -> ApiResult<Campaign> {
        self.begin("create_campaign", account_id)?;
        let id = Self::mint_id("cmp");
        self.store_entity(&id, Self::to_value(params));
        self.read_entity(&id)
    }

    fn get_campaign(&self, id: &str) -> ApiResult<Campaign> {
        self.begin("get_campaign", id)?;
        self.read_entity(id)
    }

    fn update_campaign(&self, id: &str, update: &CampaignUpdate) -> ApiResult<()> {
        self.begin("update_campaign", id)?;
        self.patch_entity(id, Self::to_value(update))
    }

    fn create_adset(&self, account_id: &str, params: &AdSetParams) -> ApiResult<AdSet> {
        self.begin("create_adset", account_id)?;
        let id = Self::mint_id("as");
        self.store_entity(&id, Self::to_value(params));
        self.read_entity(&id)
    }

    fn get_adset(&self, id: &str) -> ApiResult<AdSet> {
        self.begin("get_adset", id)?;
        self.read_entity(id)
    }

    fn update_adset(&self, id: &str, update: &AdSetUpdate) -> ApiResult<()> {
        self.begin("update_adset", id)?;
        self.patch_entity(id, Self::to_value(update))
    }

    fn create_ad(&self, account_id: &str, params: &AdParams) -> ApiResult<Ad> {
        self.begin("create_ad", account_id)?;
        let id = Self::mint_id("ad");
        self.store_entity(
            &id,
            json!({
                "name": params.name,
                "adset_id": params.adset_id,
                "creative": { "id": params.creative_id },
                "status": params.status,
            }),
        );
        self.read_entity(&id)
    }

    fn get_ad(&self, id: &str) -> ApiResult<Ad> {
        self.begin("get_ad", id)?;
        self.read_entity(id)
    }

    fn update_ad(&self, id: &str, update: &AdUpdate) -> ApiResult<()> {
        self.begin("update_ad", id)?;
        let mut patch = serde_json::Map::new();
        if let Some(creative_id) = &update.creative_id {
            patch.insert("creative".to_string(), json!({ "id": creative_id }));
        }
        if let Some(status) = &update.status {
            patch.insert("status".to_string(), json!(status));
        }
        self.patch_entity(id, Value::Object(patch))
    }

    fn create_adcreative(&self, account_id: &str, spec: &CreativeSpec) -> ApiResult<AdCreative> {
        self.begin("create_adcreative", account_id)?;
        let id = Self::mint_id("cr");
        let mut value = Self::to_value(spec);
        value["status"] = json!(EntityStatus::Active);
        self.store_entity(&id, value);
        self.read_entity(&id)
    }

    fn get_adcreative(&self, id: &str) -> ApiResult<AdCreative> {
        self.begin("get_adcreative", id)?;
        self.read_entity(id)
    }

    fn update_adcreative(&self, id: &str, update: &AdCreativeUpdate) -> ApiResult<()> {
        self.begin("update_adcreative", id)?;
        self.patch_entity(id, Self::to_value(update))
    }

    fn get_object(&self, id: &str, fields: &[&str]) -> ApiResult<Value> {
        self.begin("get_object", id)?;
        let source = self
            .objects
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| AdsApiError::new(100, format!("Unknown object: {id}")))?;
        let mut out = serde_json::Map::new();
        for field in fields {
            if let Some(v) = source.get(*field) {
                out.insert((*field).to_string(), v.clone());
            }
        }
        Ok(Value::Object(out))
    }

    fn delete_object(&self, id: &str) -> ApiResult<()> {
        self.begin("delete_object", id)?;
        self.entities
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AdsApiError::new(100, format!("Unknown object: {id}")))
    }

    fn get_currency(&self, account_id: &str) -> ApiResult<String> {
        self.begin("get_currency", account_id)?;
        Ok(self.currency.read().clone())
    }

    fn get_insights(&self, campaign_id: &str) -> ApiResult<AdsInsights> {
        self.begin("get_insights", campaign_id)?;
        if let Some(entry) = self.insights.get(campaign_id) {
            return Ok(entry.value().clone());
        }
        Ok(self.default_insights.read().clone().unwrap_or_default())
    }

    fn get_product_sets(&self, catalog_id: &str) -> ApiResult<Vec<ProductSet>> {
        self.begin("get_product_sets", catalog_id)?;
        Ok(self
            .product_sets
            .get(catalog_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    fn get_ad_previews(&self, ad_id: &str, format: &str) -> ApiResult<AdPreview> {
        self.begin("get_ad_previews", ad_id)?;
        let ad: Ad = self.read_entity(ad_id)?;
        Ok(AdPreview {
            body: format!(
                "<iframe data-format=\"{format}\" data-ad=\"{}\"></iframe>",
                ad.id
            ),
        })
    }

    fn generate_ad_preview(
        &self,
        account_id: &str,
        format: &str,
        spec: &CreativeSpec,
    ) -> ApiResult<AdPreview> {
        self.begin("generate_ad_preview", account_id)?;
        Ok(AdPreview {
            body: format!("<iframe data-format=\"{format}\">{}</iframe>", spec.body),
        })
    }

    fn access_token(&self) -> String {
        self.access_token.read().clone()
    }

    fn set_access_token(&self, token: &str) {
        self.calls.lock().push(format!("set_access_token:{token}"));
        *self.access_token.write() = token.to_string();
    }
}
