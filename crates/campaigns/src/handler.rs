//! Shared campaign lifecycle orchestrator.
//!
//! One handler is constructed per inbound request for one campaign kind.
//! Construction bootstraps everything the operations need (payment check,
//! product set, currency, minimum budget, Instagram actor, eager insights
//! when the campaign is already running) and either fully succeeds or
//! errors — there is no partially-initialized handler.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info, warn};

use asc_core::config::AscConfig;
use asc_core::error::{AscError, AscResult};
use asc_core::types::{CampaignKind, Insights, MinimumDailyBudget, StoredCampaignRecord};
use asc_ads_client::entities::{
    Ad, AdCreative, AdCreativeUpdate, AdParams, AdPreview, AdSet, AdSetParams, AdSetUpdate,
    AdUpdate, Campaign, CampaignUpdate,
};
use asc_ads_client::error::AdsApiError;
use asc_ads_client::token::AccessTokenGuard;
use asc_ads_client::AdsApi;

use crate::budget::{self, MinimumBudgetRow, BUDGET_SAFETY_FACTOR};
use crate::insights::map_insights;
use crate::props::CampaignProps;
use crate::store::CampaignStore;
use crate::strategy::{
    strategy_for, CampaignContext, CampaignStrategy, CreatePlan, EntityNames, PropertyChoice,
    SupersededCleanup, TargetingInputs, DEFAULT_VISIT_PERIOD_DAYS,
};

/// The four remote entities of one campaign, loaded together for status
/// evaluation.
#[derive(Debug, Clone)]
pub struct EntityGraph {
    pub campaign: Campaign,
    pub adset: AdSet,
    pub ad: Ad,
    pub creative: AdCreative,
}

impl EntityGraph {
    /// True when any entity reports ARCHIVED: the remote graph was torn
    /// down out-of-band and must be recreated.
    pub fn any_archived(&self) -> bool {
        [
            self.creative.status.as_ref(),
            self.campaign.status.as_ref(),
            self.adset.status.as_ref(),
            self.ad.status.as_ref(),
        ]
        .iter()
        .any(|s| s.is_some_and(|s| s.is_archived()))
    }

    /// True only when creative, campaign, adset, and ad all report ACTIVE.
    pub fn all_active(&self) -> bool {
        [
            self.creative.status.as_ref(),
            self.campaign.status.as_ref(),
            self.adset.status.as_ref(),
            self.ad.status.as_ref(),
        ]
        .iter()
        .all(|s| s.is_some_and(|s| s.is_active()))
    }
}

pub struct CampaignHandler {
    api: Arc<dyn AdsApi>,
    store: Arc<dyn CampaignStore>,
    strategy: Box<dyn CampaignStrategy>,
    ctx: CampaignContext,
    currency: String,
    min_budget: MinimumDailyBudget,
    insights: Mutex<Option<Insights>>,
    entities: Mutex<Option<EntityGraph>>,
}

impl CampaignHandler {
    /// Bootstraps a handler for `kind`. Remote failures are logged and
    /// wrapped; the typed setup conditions (`InvalidPaymentInformation`,
    /// `InstagramActorNotFound`) surface as themselves.
    pub fn new(
        kind: CampaignKind,
        api: Arc<dyn AdsApi>,
        store: Arc<dyn CampaignStore>,
        config: &AscConfig,
    ) -> AscResult<Self> {
        info!(kind = %kind, account = %config.ad_account_id, "Bootstrapping campaign handler");

        verify_payment_method(api.as_ref(), &config.ad_account_id)?;
        let product_set_id = resolve_product_set(api.as_ref(), &config.catalog_id)?;
        let names = EntityNames::derive(&config.store_name, kind);
        let currency = api
            .get_currency(&config.ad_account_id)
            .map_err(|e| wrap_api("read account currency", &e))?;
        let min_budget = resolve_minimum_budget(api.as_ref(), &config.ad_account_id, &currency)?;

        let mut handler = Self {
            api,
            store,
            strategy: strategy_for(kind),
            ctx: CampaignContext {
                account_id: config.ad_account_id.clone(),
                page_id: config.page_id.clone(),
                pixel_id: config.pixel_id.clone(),
                catalog_id: config.catalog_id.clone(),
                store_name: config.store_name.clone(),
                store_url: config.store_url.clone(),
                product_set_id,
                instagram_actor_id: String::new(),
                names,
            },
            currency,
            min_budget,
            insights: Mutex::new(None),
            entities: Mutex::new(None),
        };

        if handler.is_running()? {
            handler.refresh_insights()?;
        }
        handler.ctx.instagram_actor_id =
            resolve_instagram_actor(handler.api.as_ref(), &config.page_id)?;

        Ok(handler)
    }

    pub fn kind(&self) -> CampaignKind {
        self.strategy.kind()
    }

    pub fn get_currency(&self) -> &str {
        &self.currency
    }

    pub fn min_daily_budget(&self) -> MinimumDailyBudget {
        self.min_budget
    }

    pub(crate) fn api(&self) -> &dyn AdsApi {
        self.api.as_ref()
    }

    pub(crate) fn ctx(&self) -> &CampaignContext {
        &self.ctx
    }

    // ─── Running state ─────────────────────────────────────────────────────

    /// Single source of truth gating every other operation: the stored
    /// record must be complete and belong to the configured account, and no
    /// remote entity may be ARCHIVED.
    pub fn is_running(&self) -> AscResult<bool> {
        let Some(record) = self.stored_record()? else {
            return Ok(false);
        };
        if !record.is_complete() || !record.matches_account(&self.ctx.account_id) {
            return Ok(false);
        }
        let graph = self.load_entities(&record)?;
        Ok(!graph.any_archived())
    }

    /// Whether the ad is live: running and every entity ACTIVE. Safe
    /// default of `false` when nothing is running.
    pub fn get_ad_status(&self) -> AscResult<bool> {
        let Some(record) = self.stored_record()? else {
            return Ok(false);
        };
        if !record.is_complete() || !record.matches_account(&self.ctx.account_id) {
            return Ok(false);
        }
        let graph = self.load_entities(&record)?;
        Ok(graph.all_active())
    }

    /// Flip delivery on or off.
    ///
    /// Activation order is a contract with the remote API's dependency
    /// tolerance: creative, campaign, adset, ad. Deactivation pauses only
    /// the umbrella campaign; that is sufficient to stop delivery and the
    /// sub-entities are intentionally left untouched. No rollback is
    /// attempted on partial failure.
    pub fn set_ad_status(&self, active: bool) -> AscResult<()> {
        let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
        let (campaign_id, adset_id, ad_id, creative_id) = record_ids(&record)?;
        info!(kind = %self.kind(), active, "Updating ad status");

        if active {
            self.api
                .update_adcreative(&creative_id, &AdCreativeUpdate { status: Some("ACTIVE".into()) })
                .map_err(|e| wrap_api("activate creative", &e))?;
            self.api
                .update_campaign(&campaign_id, &CampaignUpdate { status: Some("ACTIVE".into()) })
                .map_err(|e| wrap_api("activate campaign", &e))?;
            self.api
                .update_adset(&adset_id, &AdSetUpdate { status: Some("ACTIVE".into()), ..Default::default() })
                .map_err(|e| wrap_api("activate adset", &e))?;
            self.api
                .update_ad(&ad_id, &AdUpdate { status: Some("ACTIVE".into()), ..Default::default() })
                .map_err(|e| wrap_api("activate ad", &e))?;
        } else {
            self.api
                .update_campaign(&campaign_id, &CampaignUpdate { status: Some("PAUSED".into()) })
                .map_err(|e| wrap_api("pause campaign", &e))?;
        }

        self.invalidate_entities();
        Ok(())
    }

    // ─── Budget / message / targeting accessors ────────────────────────────

    pub fn get_allowed_min_daily_budget(&self) -> f64 {
        self.strategy.allowed_min_daily_budget(&self.min_budget)
    }

    /// Current daily budget in major units when running; otherwise the
    /// default proposal (safety factor over the allowed minimum).
    pub fn get_ad_daily_budget(&self) -> AscResult<f64> {
        if self.is_running()? {
            let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
            let graph = self.load_entities(&record)?;
            if let Some(minor) = graph.adset.daily_budget {
                return Ok(budget::from_minor_units(minor));
            }
        }
        Ok(self.default_budget_proposal())
    }

    pub fn get_ad_message(&self) -> AscResult<String> {
        if self.is_running()? {
            let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
            let graph = self.load_entities(&record)?;
            if let Some(body) = graph.creative.body {
                return Ok(body);
            }
        }
        Ok(self.strategy.default_message())
    }

    /// Country list off the live adset, or the single-country default.
    pub fn get_ad_targeted_countries(&self) -> AscResult<Vec<String>> {
        if self.is_running()? {
            let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
            let graph = self.load_entities(&record)?;
            if let Some(geo) = graph.adset.targeting.as_ref().and_then(|t| t.geo_locations.as_ref()) {
                return Ok(geo.countries.clone());
            }
        }
        Ok(vec!["US".to_string()])
    }

    /// Visit-recency window off the live adset (seconds → days), or the
    /// default.
    pub fn get_visit_period_days(&self) -> AscResult<u32> {
        if self.is_running()? {
            let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
            let graph = self.load_entities(&record)?;
            if let Some(seconds) = graph.adset.targeting.as_ref().and_then(|t| t.primary_retention_seconds()) {
                return Ok((seconds / 86_400) as u32);
            }
        }
        Ok(DEFAULT_VISIT_PERIOD_DAYS)
    }

    pub fn get_property_choices(&self, name: &str) -> AscResult<Vec<PropertyChoice>> {
        self.strategy.property_choices(name)
    }

    // ─── Insights ──────────────────────────────────────────────────────────

    pub fn are_insights_available(&self) -> bool {
        self.insights.lock().is_some()
    }

    pub fn insights(&self) -> Option<Insights> {
        self.insights.lock().clone()
    }

    /// Fetches the aggregate result keyed by campaign id and replaces the
    /// cached metrics.
    pub fn refresh_insights(&self) -> AscResult<()> {
        let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
        let campaign_id = record.campaign_id.ok_or(AscError::CampaignNotRunning)?;
        let raw = self
            .api
            .get_insights(&campaign_id)
            .map_err(|e| wrap_api("read campaign insights", &e))?;
        *self.insights.lock() = Some(map_insights(&raw));
        Ok(())
    }

    // ─── Previews ──────────────────────────────────────────────────────────

    /// Renders a preview of what the ad would look like with `message`,
    /// without creating any durable remote object.
    pub fn generate_ad_preview(&self, message: &str, format: &str) -> AscResult<AdPreview> {
        let spec = self.strategy.build_creative_spec(&self.ctx, message);
        self.api
            .generate_ad_preview(&self.ctx.account_id, format, &spec)
            .map_err(|e| wrap_api("generate ad preview", &e))
    }

    /// Preview of the live ad. Requires a running campaign.
    pub fn get_ad_preview(&self, format: &str) -> AscResult<AdPreview> {
        if !self.is_running()? {
            return Err(AscError::CampaignNotRunning);
        }
        let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
        let ad_id = record.ad_id.ok_or(AscError::CampaignNotRunning)?;
        self.api
            .get_ad_previews(&ad_id, format)
            .map_err(|e| wrap_api("read ad preview", &e))
    }

    // ─── Create / update ───────────────────────────────────────────────────

    /// First-time setup of the remote entity tree. Persists the new record,
    /// optionally activates, and always refreshes insights on success.
    pub fn create_campaign(&self, props: &CampaignProps) -> AscResult<()> {
        let plan = self.plan_create(props);
        info!(
            kind = %self.kind(),
            daily_budget = plan.daily_budget,
            activate = plan.activate,
            "Creating campaign entity tree"
        );
        let record = self.strategy.create_graph(self, &plan)?;
        self.persist_record(&record)?;
        if plan.activate {
            self.set_ad_status(true)?;
        }
        self.invalidate_entities();
        self.refresh_insights()?;
        Ok(())
    }

    /// Applies the supplied changes to the existing tree. Each present
    /// field is handled independently; status, when present, is applied
    /// last.
    pub fn update_campaign(&self, props: &CampaignProps) -> AscResult<()> {
        let record = self.stored_record()?.ok_or(AscError::CampaignNotRunning)?;
        info!(kind = %self.kind(), "Updating campaign entity tree");
        self.strategy.apply_update(self, record, props)?;
        self.invalidate_entities();
        Ok(())
    }

    fn plan_create(&self, props: &CampaignProps) -> CreatePlan {
        CreatePlan {
            daily_budget: props
                .daily_budget
                .unwrap_or_else(|| self.default_budget_proposal()),
            message: props
                .ad_message
                .clone()
                .unwrap_or_else(|| self.strategy.default_message()),
            targeting: TargetingInputs {
                countries: props
                    .country
                    .clone()
                    .unwrap_or_else(|| vec!["US".to_string()]),
                visit_period_days: props.visit_period_days.unwrap_or(DEFAULT_VISIT_PERIOD_DAYS),
            },
            activate: props.status.unwrap_or(false),
        }
    }

    fn default_budget_proposal(&self) -> f64 {
        self.get_allowed_min_daily_budget() * BUDGET_SAFETY_FACTOR
    }

    // ─── Record access ─────────────────────────────────────────────────────

    pub(crate) fn stored_record(&self) -> AscResult<Option<StoredCampaignRecord>> {
        let map = self
            .store
            .load_all()
            .map_err(|e| AscError::Store(e.to_string()))?;
        Ok(map.get(self.kind().as_str()).cloned())
    }

    /// Read-modify-write over the whole per-kind map.
    pub(crate) fn persist_record(&self, record: &StoredCampaignRecord) -> AscResult<()> {
        let mut map = self
            .store
            .load_all()
            .map_err(|e| AscError::Store(e.to_string()))?;
        map.insert(self.kind().as_str().to_string(), record.clone());
        self.store
            .save_all(&map)
            .map_err(|e| AscError::Store(e.to_string()))
    }

    // ─── Entity cache / CRUD delegation ────────────────────────────────────

    fn load_entities(&self, record: &StoredCampaignRecord) -> AscResult<EntityGraph> {
        if let Some(graph) = self.entities.lock().clone() {
            return Ok(graph);
        }
        let (campaign_id, adset_id, ad_id, creative_id) = record_ids(record)?;
        let graph = EntityGraph {
            campaign: self.fetch_campaign(&campaign_id)?,
            adset: self.fetch_adset(&adset_id)?,
            ad: self.fetch_ad(&ad_id)?,
            creative: self.fetch_adcreative(&creative_id)?,
        };
        *self.entities.lock() = Some(graph.clone());
        Ok(graph)
    }

    pub(crate) fn invalidate_entities(&self) {
        *self.entities.lock() = None;
    }

    pub fn fetch_campaign(&self, id: &str) -> AscResult<Campaign> {
        self.api.get_campaign(id).map_err(|e| wrap_api("read campaign", &e))
    }

    pub fn fetch_adset(&self, id: &str) -> AscResult<AdSet> {
        self.api.get_adset(id).map_err(|e| wrap_api("read adset", &e))
    }

    pub fn fetch_ad(&self, id: &str) -> AscResult<Ad> {
        self.api.get_ad(id).map_err(|e| wrap_api("read ad", &e))
    }

    pub fn fetch_adcreative(&self, id: &str) -> AscResult<AdCreative> {
        self.api.get_adcreative(id).map_err(|e| wrap_api("read ad creative", &e))
    }

    pub(crate) fn create_adset(&self, params: &AdSetParams) -> AscResult<AdSet> {
        self.api
            .create_adset(&self.ctx.account_id, params)
            .map_err(|e| wrap_api("create adset", &e))
    }

    pub(crate) fn create_ad(&self, params: &AdParams) -> AscResult<Ad> {
        self.api
            .create_ad(&self.ctx.account_id, params)
            .map_err(|e| wrap_api("create ad", &e))
    }

    pub(crate) fn update_adset(&self, id: &str, update: &AdSetUpdate) -> AscResult<()> {
        self.api.update_adset(id, update).map_err(|e| wrap_api("update adset", &e))
    }

    pub(crate) fn update_ad(&self, id: &str, update: &AdUpdate) -> AscResult<()> {
        self.api.update_ad(id, update).map_err(|e| wrap_api("update ad", &e))
    }

    /// Arbitrary-field read used for account-level introspection.
    pub fn get_fields(&self, id: &str, fields: &[&str]) -> AscResult<Value> {
        self.api.get_object(id, fields).map_err(|e| wrap_api("read object fields", &e))
    }

    pub fn delete_item(&self, id: &str) -> AscResult<()> {
        self.api.delete_object(id).map_err(|e| wrap_api("delete object", &e))
    }

    /// Removes objects superseded by an update, under the policy the
    /// strategy names.
    pub(crate) fn cleanup_superseded(
        &self,
        ids: &[&str],
        policy: SupersededCleanup,
    ) -> AscResult<()> {
        for id in ids {
            match (self.delete_item(id), policy) {
                (Ok(()), _) => {}
                (Err(e), SupersededCleanup::Propagate) => return Err(e),
                (Err(e), SupersededCleanup::BestEffort) => {
                    warn!(object = %id, error = %e, "Leaving superseded object behind");
                }
            }
        }
        Ok(())
    }
}

/// Logs the remote failure once and converts it into the generic domain
/// error.
pub(crate) fn wrap_api(action: &str, err: &AdsApiError) -> AscError {
    error!(action, code = ?err.code, error = %err.message, "Remote ads API call failed");
    AscError::Api(err.message.clone())
}

fn record_ids(record: &StoredCampaignRecord) -> AscResult<(String, String, String, String)> {
    match (
        record.campaign_id.clone(),
        record.adset_id.clone(),
        record.ad_id.clone(),
        record.adcreative_id.clone(),
    ) {
        (Some(campaign), Some(adset), Some(ad), Some(creative)) => {
            Ok((campaign, adset, ad, creative))
        }
        _ => Err(AscError::CampaignNotRunning),
    }
}

// ─── Bootstrap helpers ─────────────────────────────────────────────────────

fn verify_payment_method(api: &dyn AdsApi, account_id: &str) -> AscResult<()> {
    let details = api
        .get_object(account_id, &["funding_source_details"])
        .map_err(|e| wrap_api("read funding source", &e))?;
    match details.get("funding_source_details") {
        Some(v) if !v.is_null() => Ok(()),
        _ => Err(AscError::InvalidPaymentInformation),
    }
}

fn resolve_product_set(api: &dyn AdsApi, catalog_id: &str) -> AscResult<Option<String>> {
    let sets = api
        .get_product_sets(catalog_id)
        .map_err(|e| wrap_api("list product sets", &e))?;
    match sets.first() {
        Some(set) => Ok(Some(set.id.clone())),
        None => {
            warn!(catalog_id, "No product sets on the catalog; proceeding without one");
            Ok(None)
        }
    }
}

fn resolve_minimum_budget(
    api: &dyn AdsApi,
    account_id: &str,
    currency: &str,
) -> AscResult<MinimumDailyBudget> {
    let value = api
        .get_object(account_id, &["minimum_budgets"])
        .map_err(|e| wrap_api("read minimum budgets", &e))?;
    let table = match value.get("minimum_budgets") {
        Some(v) => v.get("data").unwrap_or(v).clone(),
        None => Value::Array(Vec::new()),
    };
    let rows: Vec<MinimumBudgetRow> = serde_json::from_value(table)?;
    budget::derive_minimum(&rows, currency)
}

/// Resolves the Instagram business account linked to the page. The page
/// lookup runs under the page-scoped token; the guard restores the previous
/// token on every exit path.
fn resolve_instagram_actor(api: &dyn AdsApi, page_id: &str) -> AscResult<String> {
    let me = api
        .get_object("me", &["accounts"])
        .map_err(|e| wrap_api("list associated accounts", &e))?;
    let page_token = me["accounts"]["data"]
        .as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry["id"].as_str() == Some(page_id))
        })
        .and_then(|entry| entry["access_token"].as_str())
        .map(str::to_string)
        .ok_or(AscError::InstagramActorNotFound)?;

    let _guard = AccessTokenGuard::swap(api, &page_token);

    let linked = api
        .get_object(page_id, &["instagram_accounts"])
        .map_err(|e| wrap_api("list instagram accounts", &e))?;
    let mut ids = collect_account_ids(&linked["instagram_accounts"]);
    if ids.is_empty() {
        let backed = api
            .get_object(page_id, &["page_backed_instagram_accounts"])
            .map_err(|e| wrap_api("list page-backed instagram accounts", &e))?;
        ids = collect_account_ids(&backed["page_backed_instagram_accounts"]);
    }

    ids.into_iter().next().ok_or(AscError::InstagramActorNotFound)
}

fn collect_account_ids(value: &Value) -> Vec<String> {
    value["data"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
