use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::domain::value_objects::random_codes::random_access_token;

#[derive(Debug, Clone, PartialEq)]
pub struct PasswordResetTokenEntity {
    pub account_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetTokenEntity {
    pub fn issue<R: Rng + ?Sized>(
        rng: &mut R,
        account_id: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            token: random_access_token(rng),
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
