//! Retargeting campaign: product-catalog sales driven by a visit-recency
//! product audience. Site visitors who viewed or carted within the window
//! are included; purchasers within the same window are excluded.

use chrono::Utc;
use serde_json::json;
use tracing::info;

use asc_core::error::{AscError, AscResult};
use asc_core::types::{CampaignKind, StoredCampaignRecord};
use asc_ads_client::entities::{
    AdParams, AdSetParams, AdSetUpdate, AdUpdate, AudienceRule, CampaignParams, CreativeSpec,
    ProductAudienceSpec, PromotedObject, Targeting,
};
use asc_ads_client::error::AdsApiError;

use crate::budget::to_minor_units;
use crate::handler::{wrap_api, CampaignHandler};
use crate::props::CampaignProps;
use crate::strategy::{
    CampaignContext, CampaignStrategy, CreatePlan, PropertyChoice, SupersededCleanup,
    TargetingInputs, DEFAULT_VISIT_PERIOD_DAYS,
};

pub struct Retargeting;

const OBJECTIVE: &str = "PRODUCT_CATALOG_SALES";
const SECONDS_PER_DAY: u64 = 86_400;
/// Fixed bid, minor currency units.
const BID_AMOUNT: i64 = 100;

/// The visit-period windows offered to users, in days.
pub const VISIT_PERIOD_CHOICES: [PropertyChoice; 5] = [
    PropertyChoice { value: 1, label: "1 day" },
    PropertyChoice { value: 7, label: "1 week" },
    PropertyChoice { value: 14, label: "2 weeks" },
    PropertyChoice { value: 21, label: "3 weeks" },
    PropertyChoice { value: 28, label: "4 weeks" },
];

impl Retargeting {
    /// Current window off the live adset, falling back to the default when
    /// the targeting carries none.
    fn current_visit_period_days(
        &self,
        handler: &CampaignHandler,
        adset_id: &str,
    ) -> AscResult<u32> {
        let adset = handler.fetch_adset(adset_id)?;
        Ok(adset
            .targeting
            .and_then(|t| t.primary_retention_seconds())
            .map(|seconds| (seconds / SECONDS_PER_DAY) as u32)
            .unwrap_or(DEFAULT_VISIT_PERIOD_DAYS))
    }
}

impl CampaignStrategy for Retargeting {
    fn kind(&self) -> CampaignKind {
        CampaignKind::Retargeting
    }

    fn objective(&self) -> &'static str {
        OBJECTIVE
    }

    fn default_message(&self) -> String {
        "Still thinking it over? Your favorites are waiting.".to_string()
    }

    fn cleanup_policy(&self) -> SupersededCleanup {
        SupersededCleanup::BestEffort
    }

    fn build_targeting(&self, ctx: &CampaignContext, inputs: &TargetingInputs) -> Targeting {
        let retention_seconds = u64::from(inputs.visit_period_days) * SECONDS_PER_DAY;
        let product_set_id = ctx.product_set_id.clone().unwrap_or_default();
        Targeting {
            geo_locations: None,
            product_audience_specs: Some(vec![ProductAudienceSpec {
                product_set_id,
                inclusions: vec![
                    AudienceRule {
                        event: "ViewContent".to_string(),
                        retention_seconds,
                    },
                    AudienceRule {
                        event: "AddToCart".to_string(),
                        retention_seconds,
                    },
                ],
                exclusions: vec![AudienceRule {
                    event: "Purchase".to_string(),
                    retention_seconds,
                }],
            }]),
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
                "format_option": "carousel_images_multi_items",
                "message": message,
                "name": "{{product.name}}",
                "description": "{{product.current_price}}",
                "link": ctx.store_url,
            })),
        }
    }

    fn property_choices(&self, name: &str) -> AscResult<Vec<PropertyChoice>> {
        match name {
            "visit_period" | "p4" => Ok(VISIT_PERIOD_CHOICES.to_vec()),
            other => Err(AscError::InvalidPropertyName(other.to_string())),
        }
    }

    fn create_graph(
        &self,
        handler: &CampaignHandler,
        plan: &CreatePlan,
    ) -> AscResult<StoredCampaignRecord> {
        let ctx = handler.ctx();
        if ctx.product_set_id.is_none() {
            return Err(AscError::Api(
                "retargeting requires a product set on the catalog".to_string(),
            ));
        }

        let campaign = handler
            .api()
            .create_campaign(
                &ctx.account_id,
                &CampaignParams {
                    name: ctx.names.campaign.clone(),
                    objective: OBJECTIVE.to_string(),
                    smart_promotion_type: None,
                    promoted_object: Some(PromotedObject {
                        pixel_id: None,
                        custom_event_type: None,
                        product_catalog_id: Some(ctx.catalog_id.clone()),
                    }),
                    status: "PAUSED".into(),
                    special_ad_categories: Vec::new(),
                },
            )
            .map_err(|e| wrap_api("create campaign", &e))?;

        let adset = handler.create_adset(&AdSetParams {
            name: ctx.names.adset.clone(),
            campaign_id: campaign.id.clone(),
            daily_budget: to_minor_units(plan.daily_budget),
            targeting: self.build_targeting(ctx, &plan.targeting),
            optimization_goal: "OFFSITE_CONVERSIONS".to_string(),
            billing_event: "IMPRESSIONS".to_string(),
            bid_strategy: None,
            bid_amount: Some(BID_AMOUNT),
            promoted_object: None,
            status: "PAUSED".into(),
        })?;

        let spec = self.build_creative_spec(ctx, &plan.message);
        let creative = handler
            .api()
            .create_adcreative(&ctx.account_id, &spec)
            .map_err(|e| translate_setup_error("create ad creative", e))?;

        let ad = handler.create_ad(&AdParams {
            name: ctx.names.ad.clone(),
            adset_id: adset.id.clone(),
            creative_id: creative.id.clone(),
            status: "PAUSED".into(),
        })?;
        info!(campaign = %campaign.id, "Created retargeting entity tree");

        Ok(StoredCampaignRecord {
            ad_account_id: Some(ctx.account_id.clone()),
            campaign_id: Some(campaign.id),
            adset_id: Some(adset.id),
            ad_id: Some(ad.id),
            adcreative_id: Some(creative.id),
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

        if props.daily_budget.is_some() || props.visit_period_days.is_some() {
            let adset_id = record.adset_id.clone().ok_or(AscError::CampaignNotRunning)?;
            // The targeting object is resent wholesale, so the window is
            // rebuilt even when only the budget changed.
            let days = match props.visit_period_days {
                Some(days) => days,
                None => self.current_visit_period_days(handler, &adset_id)?,
            };
            let update = AdSetUpdate {
                daily_budget: props.daily_budget.map(to_minor_units),
                targeting: Some(self.build_targeting(
                    handler.ctx(),
                    &TargetingInputs {
                        countries: Vec::new(),
                        visit_period_days: days,
                    },
                )),
                status: None,
            };
            handler.update_adset(&adset_id, &update)?;
        }

        if let Some(message) = &props.ad_message {
            let ad_id = record.ad_id.clone().ok_or(AscError::CampaignNotRunning)?;
            let old_creative = record.adcreative_id.clone();

            let spec = self.build_creative_spec(handler.ctx(), message);
            let creative = handler
                .api()
                .create_adcreative(&handler.ctx().account_id, &spec)
                .map_err(|e| translate_setup_error("create ad creative", e))?;
            // The existing ad is repointed in place; no new ad object.
            handler.update_ad(
                &ad_id,
                &AdUpdate {
                    creative_id: Some(creative.id.clone()),
                    status: None,
                },
            )?;

            record.adcreative_id = Some(creative.id);
            record.updated_at = Some(Utc::now());
            handler.persist_record(&record)?;

            if let Some(old) = old_creative {
                handler.cleanup_superseded(&[old.as_str()], self.cleanup_policy())?;
            }
        }

        if let Some(active) = props.status {
            handler.set_ad_status(active)?;
        }

        Ok(())
    }
}

fn translate_setup_error(action: &str, err: AdsApiError) -> AscError {
    if err.is_non_discrimination() {
        AscError::NonDiscriminationNotAccepted
    } else {
        wrap_api(action, &err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::EntityNames;

    fn make_ctx() -> CampaignContext {
        CampaignContext {
            account_id: "act_1".to_string(),
            page_id: "page_1".to_string(),
            pixel_id: "pix_1".to_string(),
            catalog_id: "cat_1".to_string(),
            store_name: "Acme".to_string(),
            store_url: "https://acme.example".to_string(),
            product_set_id: Some("ps_1".to_string()),
            instagram_actor_id: "ig_1".to_string(),
            names: EntityNames::derive("Acme", CampaignKind::Retargeting),
        }
    }

    #[test]
    fn test_targeting_rules_share_one_window() {
        let targeting = Retargeting.build_targeting(
            &make_ctx(),
            &TargetingInputs {
                countries: Vec::new(),
                visit_period_days: 7,
            },
        );
        let specs = targeting.product_audience_specs.unwrap();
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.product_set_id, "ps_1");
        assert_eq!(spec.inclusions.len(), 2);
        assert_eq!(spec.exclusions.len(), 1);
        for rule in spec.inclusions.iter().chain(spec.exclusions.iter()) {
            assert_eq!(rule.retention_seconds, 7 * 86_400);
        }
        assert_eq!(spec.inclusions[0].event, "ViewContent");
        assert_eq!(spec.inclusions[1].event, "AddToCart");
        assert_eq!(spec.exclusions[0].event, "Purchase");
    }

    #[test]
    fn test_creative_spec_is_a_carousel() {
        let spec = Retargeting.build_creative_spec(&make_ctx(), "Come back");
        let template = spec.template_data.unwrap();
        assert_eq!(template["format_option"], "carousel_images_multi_items");
        assert_eq!(template["name"], "{{product.name}}");
        assert_eq!(template["description"], "{{product.current_price}}");
        assert_eq!(spec.call_to_action_type.as_deref(), Some("SHOP_NOW"));
    }

    #[test]
    fn test_visit_period_choices() {
        let choices = Retargeting.property_choices("visit_period").unwrap();
        let values: Vec<u32> = choices.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![1, 7, 14, 21, 28]);

        assert!(matches!(
            Retargeting.property_choices("bid_cap"),
            Err(AscError::InvalidPropertyName(_))
        ));
    }
}
