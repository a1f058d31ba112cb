use anyhow::{Context, Result};
use chrono::Duration;

use super::{
    config_model::{DotEnvyConfig, EntitlementPolicy},
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = EntitlementPolicy::default();

    let entitlements = EntitlementPolicy {
        order_ttl: days_or(&lookup, "ORDER_TTL_DAYS", defaults.order_ttl)?,
        gift_code_duration: days_or(&lookup, "GIFT_CODE_DEFAULT_DAYS", defaults.gift_code_duration)?,
        password_reset_ttl: days_or(&lookup, "PASSWORD_RESET_TTL_DAYS", defaults.password_reset_ttl)?,
    };

    let mut warnings = Vec::new();
    let stage = match lookup("STAGE") {
        Some(raw) if !raw.trim().is_empty() => Stage::try_from(&raw).unwrap_or_else(|_| {
            warnings.push(format!(
                "STAGE is invalid (value: {raw}); defaulting to {:?}",
                Stage::default()
            ));
            Stage::default()
        }),
        _ => Stage::default(),
    };

    Ok(DotEnvyConfig {
        stage,
        entitlements,
        warnings,
    })
}

fn days_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(default);
    };

    let days: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} is invalid"))?;
    if days < 0 {
        anyhow::bail!("{key} must not be negative");
    }

    Duration::try_days(days).with_context(|| format!("{key} is out of range"))
}
