use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountEntity {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    /// Hex text of the 96-byte salted password blob.
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub signup_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub paid_until: Option<DateTime<Utc>>,
    pub referrer_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertAccountEntity {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub signup_date: DateTime<Utc>,
    pub referrer_id: Option<Uuid>,
}

/// Paid-time state of one account, written together with the order or gift
/// code that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitlementUpdateEntity {
    pub account_id: Uuid,
    pub paid_until: Option<DateTime<Utc>>,
    pub referrer_id: Option<Uuid>,
}

impl From<&AccountEntity> for EntitlementUpdateEntity {
    fn from(account: &AccountEntity) -> Self {
        Self {
            account_id: account.id,
            paid_until: account.paid_until,
            referrer_id: account.referrer_id,
        }
    }
}

impl AccountEntity {
    /// Strictly after `now`; an expiry equal to `now` is already unpaid.
    pub fn is_paid(&self, now: DateTime<Utc>) -> bool {
        matches!(self.paid_until, Some(paid_until) if paid_until > now)
    }

    /// Stacks `duration` on the current expiry, or on `now` when the account
    /// is not paid. Leaves the account untouched if the sum is not
    /// representable.
    pub fn extend_paid_time(&mut self, duration: Duration, now: DateTime<Utc>) {
        let base = match self.paid_until {
            Some(paid_until) if paid_until > now => paid_until,
            _ => now,
        };

        if let Some(new_paid_until) = base.checked_add_signed(duration) {
            self.paid_until = Some(new_paid_until);
        }
    }

    pub fn paid_time_left(&self, now: DateTime<Utc>) -> Duration {
        match self.paid_until {
            Some(paid_until) if paid_until > now => paid_until - now,
            _ => Duration::zero(),
        }
    }

    /// Whole days plus the fraction contributed by leftover seconds, rounded
    /// half to even. Any remaining paid time reports at least one day.
    pub fn paid_days_left(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_paid(now) {
            return 0;
        }

        let left = self.paid_time_left(now);
        let days = left.num_days();
        let seconds = left.num_seconds() - days * SECONDS_PER_DAY;
        let total_days = days as f64 + seconds as f64 / SECONDS_PER_DAY as f64;

        (total_days.round_ties_even() as i64).max(1)
    }
}
