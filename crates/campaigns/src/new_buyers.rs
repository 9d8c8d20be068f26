//! Prospecting campaign: outcome-sales objective with the automated
//! shopping smart-promotion type, targeted by country list, optimized for
//! pixel purchases.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use asc_core::error::{AscError, AscResult};
use asc_core::types::{CampaignKind, StoredCampaignRecord};
use asc_ads_client::entities::{
    AdParams, AdSetParams, AdSetUpdate, CampaignParams, CreativeSpec, GeoLocations,
    PromotedObject, Targeting,
};
use asc_ads_client::error::AdsApiError;

use crate::budget::to_minor_units;
use crate::handler::{wrap_api, CampaignHandler};
use crate::props::CampaignProps;
use crate::strategy::{
    CampaignContext, CampaignStrategy, CreatePlan, SupersededCleanup, TargetingInputs,
    DEFAULT_VISIT_PERIOD_DAYS,
};

pub struct NewBuyers;

const OBJECTIVE: &str = "OUTCOME_SALES";
const SMART_PROMOTION_TYPE: &str = "AUTOMATED_SHOPPING_ADS";

impl NewBuyers {
    /// Creates a creative and an ad referencing it, then re-reads the ad to
    /// pick up the canonical creative id the remote side persisted.
    fn create_ad_pair(
        &self,
        handler: &CampaignHandler,
        adset_id: &str,
        message: &str,
    ) -> AscResult<(String, String)> {
        let ctx = handler.ctx();
        let spec = self.build_creative_spec(ctx, message);
        let creative = handler
            .api()
            .create_adcreative(&ctx.account_id, &spec)
            .map_err(|e| translate_setup_error("create ad creative", e))?;
        let ad = handler
            .api()
            .create_ad(
                &ctx.account_id,
                &AdParams {
                    name: ctx.names.ad.clone(),
                    adset_id: adset_id.to_string(),
                    creative_id: creative.id.clone(),
                    status: "PAUSED".into(),
                },
            )
            .map_err(|e| translate_setup_error("create ad", e))?;

        let persisted = handler.fetch_ad(&ad.id)?;
        let creative_id = persisted
            .creative
            .map(|c| c.id)
            .unwrap_or(creative.id);
        Ok((ad.id, creative_id))
    }
}

impl CampaignStrategy for NewBuyers {
    fn kind(&self) -> CampaignKind {
        CampaignKind::NewBuyers
    }

    fn objective(&self) -> &'static str {
        OBJECTIVE
    }

    fn default_message(&self) -> String {
        "These great products are waiting for you! Shop now.".to_string()
    }

    fn cleanup_policy(&self) -> SupersededCleanup {
        SupersededCleanup::Propagate
    }

    fn build_targeting(&self, _ctx: &CampaignContext, inputs: &TargetingInputs) -> Targeting {
        Targeting {
            geo_locations: Some(GeoLocations {
                countries: inputs.countries.clone(),
            }),
            product_audience_specs: None,
        }
    }

    fn build_creative_spec(&self, ctx: &CampaignContext, message: &str) -> CreativeSpec {
        CreativeSpec {
            name: ctx.names.creative.clone(),
            body: message.to_string(),
            page_id: Some(ctx.page_id.clone()),
            instagram_actor_id: Some(ctx.instagram_actor_id.clone()),
            product_set_id: ctx.product_set_id.clone(),
            link: Some(ctx.store_url.clone()),
            call_to_action_type: Some("SHOP_NOW".to_string()),
            template_data: Some(json!({
                "message": message,
                "link": ctx.store_url,
            })),
        }
    }

    fn create_graph(
        &self,
        handler: &CampaignHandler,
        plan: &CreatePlan,
    ) -> AscResult<StoredCampaignRecord> {
        let ctx = handler.ctx();

        let campaign = handler
            .api()
            .create_campaign(
                &ctx.account_id,
                &CampaignParams {
                    name: ctx.names.campaign.clone(),
                    objective: OBJECTIVE.to_string(),
                    smart_promotion_type: Some(SMART_PROMOTION_TYPE.to_string()),
                    promoted_object: None,
                    status: "PAUSED".into(),
                    special_ad_categories: Vec::new(),
                },
            )
            .map_err(|e| {
                if e.is_feature_unavailable() {
                    AscError::AscNotSupported
                } else {
                    wrap_api("create campaign", &e)
                }
            })?;

        let adset = handler.create_adset(&AdSetParams {
            name: ctx.names.adset.clone(),
            campaign_id: campaign.id.clone(),
            daily_budget: to_minor_units(plan.daily_budget),
            targeting: self.build_targeting(ctx, &plan.targeting),
            optimization_goal: "OFFSITE_CONVERSIONS".to_string(),
            billing_event: "IMPRESSIONS".to_string(),
            bid_strategy: Some("LOWEST_COST_WITHOUT_CAP".to_string()),
            bid_amount: None,
            promoted_object: Some(PromotedObject {
                pixel_id: Some(ctx.pixel_id.clone()),
                custom_event_type: Some("PURCHASE".to_string()),
                product_catalog_id: None,
            }),
            status: "PAUSED".into(),
        })?;

        let (ad_id, creative_id) = self.create_ad_pair(handler, &adset.id, &plan.message)?;
        info!(campaign = %campaign.id, "Created prospecting entity tree");

        Ok(StoredCampaignRecord {
            ad_account_id: Some(ctx.account_id.clone()),
            campaign_id: Some(campaign.id),
            adset_id: Some(adset.id),
            ad_id: Some(ad_id),
            adcreative_id: Some(creative_id),
            updated_at: Some(Utc::now()),
        })
    }

    fn apply_update(
        &self,
        handler: &CampaignHandler,
        record: StoredCampaignRecord,
        props: &CampaignProps,
    ) -> AscResult<()> {
        let mut record = record;

        if let Some(message) = &props.ad_message {
            let adset_id = record.adset_id.clone().ok_or(AscError::CampaignNotRunning)?;
            let old_ad = record.ad_id.clone();
            let old_creative = record.adcreative_id.clone();

            let (ad_id, creative_id) = self.create_ad_pair(handler, &adset_id, message)?;
            record.ad_id = Some(ad_id);
            record.adcreative_id = Some(creative_id);
            record.updated_at = Some(Utc::now());
            // New state wins: the record points at the fresh pair before the
            // old objects are removed.
            handler.persist_record(&record)?;

            let stale: Vec<String> = [old_ad, old_creative].into_iter().flatten().collect();
            let stale_refs: Vec<&str> = stale.iter().map(String::as_str).collect();
            handler.cleanup_superseded(&stale_refs, self.cleanup_policy())?;
        }

        if props.daily_budget.is_some() || props.country.is_some() {
            let adset_id = record.adset_id.clone().ok_or(AscError::CampaignNotRunning)?;
            let update = AdSetUpdate {
                daily_budget: props.daily_budget.map(to_minor_units),
                targeting: props.country.as_ref().map(|countries| {
                    self.build_targeting(
                        handler.ctx(),
                        &TargetingInputs {
                            countries: countries.clone(),
                            visit_period_days: DEFAULT_VISIT_PERIOD_DAYS,
                        },
                    )
                }),
                status: None,
            };
            handler.update_adset(&adset_id, &update)?;
        }

        if let Some(active) = props.status {
            handler.set_ad_status(active)?;
        }

        Ok(())
    }
}

/// Creative/ad setup can hit the non-discrimination compliance gate, which
/// the remote side only signals through the error message.
fn translate_setup_error(action: &str, err: AdsApiError) -> AscError {
    if err.is_non_discrimination() {
        AscError::NonDiscriminationNotAccepted
    } else {
        wrap_api(action, &err)
    }
}
