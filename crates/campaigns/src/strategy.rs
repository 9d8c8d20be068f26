//! Campaign-type capability interface. The shared lifecycle lives in
//! `CampaignHandler`; everything that differs between the two campaign
//! types — objective, targeting shape, creative spec, update semantics —
//! comes through this trait.

use asc_core::error::{AscError, AscResult};
use asc_core::types::{CampaignKind, MinimumDailyBudget, StoredCampaignRecord};
use asc_ads_client::entities::{CreativeSpec, Targeting};

use crate::handler::CampaignHandler;
use crate::new_buyers::NewBuyers;
use crate::props::CampaignProps;
use crate::retargeting::Retargeting;

/// Suffix appended to every remote-object display name so the objects this
/// subsystem manages are recognizable in the ads manager UI. Cosmetic, not
/// an identifier.
pub const NAME_TAG: &str = "[ASC]";

/// Visit-recency window used when the caller supplies none and no remote
/// value exists yet.
pub const DEFAULT_VISIT_PERIOD_DAYS: u32 = 14;

/// What to do with remote objects superseded during an update. The two
/// campaign types name different policies; the mechanism is shared
/// (`CampaignHandler::cleanup_superseded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupersededCleanup {
    /// Deletion failure propagates to the caller.
    Propagate,
    /// Deletion failure is logged and swallowed; the stale object lingers.
    BestEffort,
}

/// Display names for the four remote objects of one campaign kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNames {
    pub campaign: String,
    pub adset: String,
    pub ad: String,
    pub creative: String,
}

impl EntityNames {
    pub fn derive(store_name: &str, kind: CampaignKind) -> Self {
        let label = kind.label();
        Self {
            campaign: format!("{store_name} {label} Campaign {NAME_TAG}"),
            adset: format!("{store_name} {label} Ad Set {NAME_TAG}"),
            ad: format!("{store_name} {label} Ad {NAME_TAG}"),
            creative: format!("{store_name} {label} Creative {NAME_TAG}"),
        }
    }
}

/// Everything resolved at bootstrap that the strategies need to build
/// remote payloads.
#[derive(Debug, Clone)]
pub struct CampaignContext {
    pub account_id: String,
    pub page_id: String,
    pub pixel_id: String,
    pub catalog_id: String,
    pub store_name: String,
    pub store_url: String,
    /// Canonical "all products" set for the catalog, when one exists.
    pub product_set_id: Option<String>,
    pub instagram_actor_id: String,
    pub names: EntityNames,
}

/// Targeting knobs; each strategy reads the fields relevant to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetingInputs {
    pub countries: Vec<String>,
    pub visit_period_days: u32,
}

/// Normalized inputs for a first-time graph creation, produced by the
/// handler from caller props and the not-running defaults.
#[derive(Debug, Clone)]
pub struct CreatePlan {
    /// Major currency units.
    pub daily_budget: f64,
    pub message: String,
    pub targeting: TargetingInputs,
    pub activate: bool,
}

/// One entry of an enumerated property choice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChoice {
    pub value: u32,
    pub label: &'static str,
}

pub trait CampaignStrategy: Send + Sync {
    fn kind(&self) -> CampaignKind;

    fn objective(&self) -> &'static str;

    /// Message advertised before any campaign exists.
    fn default_message(&self) -> String;

    /// Minimum daily budget for this campaign subtype. Defaults to the
    /// account-level floor.
    fn allowed_min_daily_budget(&self, base: &MinimumDailyBudget) -> f64 {
        base.value
    }

    fn cleanup_policy(&self) -> SupersededCleanup;

    fn build_targeting(&self, ctx: &CampaignContext, inputs: &TargetingInputs) -> Targeting;

    fn build_creative_spec(&self, ctx: &CampaignContext, message: &str) -> CreativeSpec;

    /// Enumerated choices for a user-facing property. Unknown names are a
    /// programming error, not a remote condition.
    fn property_choices(&self, name: &str) -> AscResult<Vec<PropertyChoice>> {
        Err(AscError::InvalidPropertyName(name.to_string()))
    }

    /// Creates the full remote entity tree, paused, and returns the record
    /// to persist. Must not persist anything itself.
    fn create_graph(
        &self,
        handler: &CampaignHandler,
        plan: &CreatePlan,
    ) -> AscResult<StoredCampaignRecord>;

    /// Applies an in-place update to an existing graph, persisting id
    /// changes before superseded objects are removed.
    fn apply_update(
        &self,
        handler: &CampaignHandler,
        record: StoredCampaignRecord,
        props: &CampaignProps,
    ) -> AscResult<()>;
}

/// Strategy for the given campaign kind.
pub fn strategy_for(kind: CampaignKind) -> Box<dyn CampaignStrategy> {
    match kind {
        CampaignKind::NewBuyers => Box::new(NewBuyers),
        CampaignKind::Retargeting => Box::new(Retargeting),
    }
}
