//! Scoped access-token swapping. Page-scoped calls run under a page token;
//! the previous token must come back no matter how the scope exits.

use crate::api::AdsApi;

/// Swaps the client's active access token and restores the previous one on
/// drop. Holding the guard is the scope; `?`-exits and panics both unwind
/// through the restore.
pub struct AccessTokenGuard<'a> {
    api: &'a dyn AdsApi,
    previous: String,
}

impl<'a> AccessTokenGuard<'a> {
    pub fn swap(api: &'a dyn AdsApi, token: &str) -> Self {
        let previous = api.access_token();
        api.set_access_token(token);
        Self { api, previous }
    }
}

impl Drop for AccessTokenGuard<'_> {
    fn drop(&mut self) {
        self.api.set_access_token(&self.previous);
    }
}

/// Runs `f` with `token` active, restoring the previous token afterward.
pub fn with_access_token<T>(api: &dyn AdsApi, token: &str, f: impl FnOnce() -> T) -> T {
    let _guard = AccessTokenGuard::swap(api, token);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryAdsApi;

    #[test]
    fn test_token_restored_on_normal_exit() {
        let api = InMemoryAdsApi::new("user-token");
        let seen = with_access_token(&api, "page-token", || api.access_token());
        assert_eq!(seen, "page-token");
        assert_eq!(api.access_token(), "user-token");
    }

    #[test]
    fn test_token_restored_on_early_return() {
        let api = InMemoryAdsApi::new("user-token");
        let result: Result<(), &str> = (|| {
            let _guard = AccessTokenGuard::swap(&api, "page-token");
            Err("lookup failed")?;
            Ok(())
        })();
        assert!(result.is_err());
        assert_eq!(api.access_token(), "user-token");
    }
}
