//! Remote Ads API boundary. One trait covers the capability set the
//! lifecycle consumes: CRUD on the four entity kinds, account introspection,
//! insights, previews, and the active access token.

use crate::entities::*;
use crate::error::ApiResult;

/// Client for the remote marketing API. Calls are blocking round-trips;
/// timeout and retry policy belong to the implementation, not this layer.
pub trait AdsApi: Send + Sync {
    // Campaigns
    fn create_campaign(&self, account_id: &str, params: &CampaignParams) -> ApiResult<Campaign>;
    fn get_campaign(&self, id: &str) -> ApiResult<Campaign>;
    fn update_campaign(&self, id: &str, update: &CampaignUpdate) -> ApiResult<()>;

    // Ad sets
    fn create_adset(&self, account_id: &str, params: &AdSetParams) -> ApiResult<AdSet>;
    fn get_adset(&self, id: &str) -> ApiResult<AdSet>;
    fn update_adset(&self, id: &str, update: &AdSetUpdate) -> ApiResult<()>;

    // Ads
    fn create_ad(&self, account_id: &str, params: &AdParams) -> ApiResult<Ad>;
    fn get_ad(&self, id: &str) -> ApiResult<Ad>;
    fn update_ad(&self, id: &str, update: &AdUpdate) -> ApiResult<()>;

    // Creatives
    fn create_adcreative(&self, account_id: &str, spec: &CreativeSpec) -> ApiResult<AdCreative>;
    fn get_adcreative(&self, id: &str) -> ApiResult<AdCreative>;
    fn update_adcreative(&self, id: &str, update: &AdCreativeUpdate) -> ApiResult<()>;

    /// Read arbitrary fields off an arbitrary remote object. Escape hatch
    /// used for account-level introspection (`funding_source_details`,
    /// `minimum_budgets`, `me`'s accounts, Instagram account lists).
    fn get_object(&self, id: &str, fields: &[&str]) -> ApiResult<serde_json::Value>;

    fn delete_object(&self, id: &str) -> ApiResult<()>;

    fn get_currency(&self, account_id: &str) -> ApiResult<String>;
    fn get_insights(&self, campaign_id: &str) -> ApiResult<AdsInsights>;
    fn get_product_sets(&self, catalog_id: &str) -> ApiResult<Vec<ProductSet>>;

    fn get_ad_previews(&self, ad_id: &str, format: &str) -> ApiResult<AdPreview>;
    fn generate_ad_preview(
        &self,
        account_id: &str,
        format: &str,
        spec: &CreativeSpec,
    ) -> ApiResult<AdPreview>;

    /// Accessor/mutator for the active access token, used only by the
    /// page-token swap during Instagram actor resolution.
    fn access_token(&self) -> String;
    fn set_access_token(&self, token: &str);
}
