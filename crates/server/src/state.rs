//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RatingsConfig;
use crate::db::Repository;
use crate::services::tokens::{TokenError, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// storage backend, the token service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RatingsConfig,
    repo: Arc<dyn Repository>,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the token secret cannot key an HMAC.
    pub fn new(config: RatingsConfig, repo: Arc<dyn Repository>) -> Result<Self, TokenError> {
        let tokens = TokenService::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                repo,
                tokens,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &RatingsConfig {
        &self.inner.config
    }

    /// Get the storage backend.
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    /// Get the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }
}
