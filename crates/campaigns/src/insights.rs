//! Maps the remote insight payload into the funnel metrics the lifecycle
//! exposes. Action types outside the funnel are ignored.

use asc_core::types::{FunnelActions, Insights};
use asc_ads_client::entities::AdsInsights;

pub fn map_insights(raw: &AdsInsights) -> Insights {
    let mut actions = FunnelActions::default();
    for stat in &raw.actions {
        match stat.action_type.as_str() {
            "link_click" | "omni_link_click" => actions.clicks += stat.value,
            "view_content" | "omni_view_content" => actions.views += stat.value,
            "add_to_cart" | "omni_add_to_cart" => actions.cart += stat.value,
            "purchase" | "omni_purchase" => actions.purchases += stat.value,
            _ => {}
        }
    }
    Insights {
        spend: raw.spend,
        reach: raw.reach,
        actions,
    }
}
