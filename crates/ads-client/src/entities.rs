//! Wire shapes for the four remote entity kinds and their creation/update
//! parameters. Fields beyond the id are fetched on demand, so everything is
//! optional on the read side; write-side params skip unset fields entirely.

use asc_core::types::EntityStatus;
use serde::{Deserialize, Serialize};

// ─── Entities ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_promotion_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdSet {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    /// Minor currency units (cents), as the remote API expresses budgets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targeting: Option<Targeting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    /// Reference to the creative the ad renders. Replaceable independently
    /// of the ad object itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative: Option<CreativeRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreativeRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCreative {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    /// The ad message rendered to users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_set_id: Option<String>,
}

// ─── Targeting ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Targeting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_locations: Option<GeoLocations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_audience_specs: Option<Vec<ProductAudienceSpec>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeoLocations {
    pub countries: Vec<String>,
}

/// Visit-recency audience over a product set: who to include and who to
/// exclude, each rule scoped by a lookback window in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAudienceSpec {
    pub product_set_id: String,
    pub inclusions: Vec<AudienceRule>,
    pub exclusions: Vec<AudienceRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudienceRule {
    pub event: String,
    pub retention_seconds: u64,
}

impl Targeting {
    /// Lookback window shared by the product-audience rules, when this
    /// targeting carries any.
    pub fn primary_retention_seconds(&self) -> Option<u64> {
        self.product_audience_specs
            .as_ref()?
            .first()?
            .inclusions
            .first()
            .map(|rule| rule.retention_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromotedObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_catalog_id: Option<String>,
}

// ─── Creation params ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CampaignParams {
    pub name: String,
    pub objective: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_promotion_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_object: Option<PromotedObject>,
    pub status: EntityStatus,
    /// Always sent, even when empty; the remote API requires the field.
    pub special_ad_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdSetParams {
    pub name: String,
    pub campaign_id: String,
    /// Minor currency units.
    pub daily_budget: i64,
    pub targeting: Targeting,
    pub optimization_goal: String,
    pub billing_event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_strategy: Option<String>,
    /// Minor currency units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted_object: Option<PromotedObject>,
    pub status: EntityStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdParams {
    pub name: String,
    pub adset_id: String,
    pub creative_id: String,
    pub status: EntityStatus,
}

/// Creative definition, shared between durable creative creation and the
/// side-effect-free preview endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreativeSpec {
    pub name: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_actor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_data: Option<serde_json::Value>,
}

// ─── Partial updates ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct CampaignUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdSetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targeting: Option<Targeting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AdCreativeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

// ─── Account-level reads ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_count: Option<u64>,
}

/// Aggregate insights as the remote API reports them, before funnel mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdsInsights {
    pub spend: f64,
    pub reach: u64,
    #[serde(default)]
    pub actions: Vec<ActionStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionStat {
    pub action_type: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdPreview {
    /// Rendered preview markup.
    pub body: String,
}
