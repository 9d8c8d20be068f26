use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `ASC_MANAGER__`. Identifiers here are the merchant-side
/// settings the lifecycle needs to address the remote ad account; tokens are
/// assumed already acquired.
#[derive(Debug, Clone, Deserialize)]
pub struct AscConfig {
    /// Remote ad account id (the `act_…` object).
    #[serde(default)]
    pub ad_account_id: String,
    /// Facebook page the ads are published under.
    #[serde(default)]
    pub page_id: String,
    /// Pixel installed on the storefront.
    #[serde(default)]
    pub pixel_id: String,
    /// Product catalog backing dynamic ads.
    #[serde(default)]
    pub catalog_id: String,
    #[serde(default = "default_store_name")]
    pub store_name: String,
    #[serde(default = "default_store_url")]
    pub store_url: String,
    /// User access token handed to the ads client at startup.
    #[serde(default)]
    pub access_token: String,
}

fn default_store_name() -> String {
    "Storefront".to_string()
}

fn default_store_url() -> String {
    "https://storefront.example".to_string()
}

impl Default for AscConfig {
    fn default() -> Self {
        Self {
            ad_account_id: String::new(),
            page_id: String::new(),
            pixel_id: String::new(),
            catalog_id: String::new(),
            store_name: default_store_name(),
            store_url: default_store_url(),
            access_token: String::new(),
        }
    }
}

impl AscConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ASC_MANAGER")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AscConfig::default();
        assert_eq!(config.store_name, "Storefront");
        assert!(config.ad_account_id.is_empty());
    }
}
