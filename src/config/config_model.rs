use chrono::Duration;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub entitlements: EntitlementPolicy,
    /// Problems found while loading, for the caller to log once tracing is up.
    pub warnings: Vec<String>,
}

/// Default lifetimes used when callers do not supply their own.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitlementPolicy {
    /// How long a pending order stays visible.
    pub order_ttl: Duration,
    pub gift_code_duration: Duration,
    pub password_reset_ttl: Duration,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self {
            order_ttl: Duration::days(30),
            gift_code_duration: Duration::days(30),
            password_reset_ttl: Duration::days(2),
        }
    }
}
