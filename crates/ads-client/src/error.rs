use thiserror::Error;

pub type ApiResult<T> = Result<T, AdsApiError>;

/// Error carried by every remote call: a numeric code where the API provides
/// one, plus the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("remote ads API error (code {code:?}): {message}")]
pub struct AdsApiError {
    pub code: Option<i64>,
    pub message: String,
}

impl AdsApiError {
    pub fn new(code: impl Into<Option<i64>>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Code 2 signals the requested feature is unavailable for the account.
    pub fn is_feature_unavailable(&self) -> bool {
        self.code == Some(2)
    }

    /// The compliance gate for dynamic ads surfaces only through the message
    /// text. The matching strategy lives here so call sites survive a move
    /// to a structured subcode.
    pub fn is_non_discrimination(&self) -> bool {
        self.message.to_ascii_lowercase().contains("non-discrimination")
    }
}
