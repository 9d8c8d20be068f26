pub mod api;
pub mod entities;
pub mod error;
pub mod in_memory;
pub mod token;

pub use api::AdsApi;
pub use error::{AdsApiError, ApiResult};
pub use in_memory::InMemoryAdsApi;
pub use token::{with_access_token, AccessTokenGuard};
