//! Environment-driven activation.
//!
//! The hosting platform advertises itself through a boolean-like variable
//! and publishes the externally reachable base URL in a second one. Both
//! background schedulers start only when the first is set.

use url::Url;

use crate::config::schema::PlatformConfig;

/// What the environment says about where we are running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlatformEnv {
    /// Running under the target hosting platform.
    pub active: bool,

    /// Externally reachable base address, if published.
    pub external_url: Option<Url>,
}

impl PlatformEnv {
    pub fn from_env(config: &PlatformConfig) -> Self {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(config: &PlatformConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let active = lookup(&config.activation_env)
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let external_url = lookup(&config.external_url_env)
            .filter(|v| !v.trim().is_empty())
            .and_then(|v| match Url::parse(v.trim()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(
                        variable = %config.external_url_env,
                        error = %e,
                        "Ignoring malformed external URL"
                    );
                    None
                }
            });

        Self { active, external_url }
    }
}

/// Non-empty and not an explicit "off" spelling.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !matches!(
            value.to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
}
