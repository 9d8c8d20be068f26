use thiserror::Error;

pub type AscResult<T> = Result<T, AscError>;

/// Domain-level error taxonomy for the campaign lifecycle. Remote-API
/// failures arrive as `Api` after being logged at the call site; the typed
/// variants carry setup conditions the caller is expected to branch on.
#[derive(Error, Debug)]
pub enum AscError {
    #[error("Ad account has no valid payment method configured")]
    InvalidPaymentInformation,

    #[error("Automated shopping campaigns are not available for this ad account")]
    AscNotSupported,

    #[error("The non-discrimination policy has not been accepted for this ad account")]
    NonDiscriminationNotAccepted,

    #[error("No Instagram account is linked to the configured Facebook page")]
    InstagramActorNotFound,

    #[error("Unknown property name: {0}")]
    InvalidPropertyName(String),

    #[error("Campaign is not running")]
    CampaignNotRunning,

    #[error("Remote ads API error: {0}")]
    Api(String),

    #[error("Campaign store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
