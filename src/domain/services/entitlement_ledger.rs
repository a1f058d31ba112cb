//! Paid-time bookkeeping for accounts: order settlement, gift-code redemption
//! and the one-time referral bonus.
//!
//! Everything here is synchronous and works on values handed in by the
//! caller. The caller owns the transaction that loads and stores them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    accounts::AccountEntity, gift_codes::GiftCodeEntity, orders::OrderEntity,
};

pub const REFERRAL_BONUS_DAYS: i64 = 14;

pub fn referral_bonus() -> Duration {
    Duration::days(REFERRAL_BONUS_DAYS)
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("order has not been paid in full")]
    NotPaid,
    #[error("gift code has already been redeemed")]
    AlreadyRedeemed,
}

/// Resolves the referrer of a settling account. Missing ids yield `None`.
pub trait AccountLookup {
    fn find_account_mut(&mut self, account_id: Uuid) -> Option<&mut AccountEntity>;
}

impl AccountLookup for HashMap<Uuid, AccountEntity> {
    fn find_account_mut(&mut self, account_id: Uuid) -> Option<&mut AccountEntity> {
        self.get_mut(&account_id)
    }
}

impl AccountLookup for Option<AccountEntity> {
    fn find_account_mut(&mut self, account_id: Uuid) -> Option<&mut AccountEntity> {
        self.as_mut().filter(|account| account.id == account_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    NoReferrer,
    Granted(Uuid),
    ReferrerMissing(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub order_id: Uuid,
    pub account_id: Uuid,
    pub paid_until: Option<DateTime<Utc>>,
    pub referral: ReferralOutcome,
}

/// Marks `order` as settled and grants its duration to `account`.
///
/// Rejects orders that are not paid in full unless `force` is set; in that
/// case nothing is modified. A pending referral is consumed whether or not
/// the referrer still exists. Calling this twice on the same order grants the
/// time twice.
pub fn settle_order<L>(
    order: &mut OrderEntity,
    account: &mut AccountEntity,
    referrers: &mut L,
    force: bool,
    now: DateTime<Utc>,
) -> Result<Settlement, LedgerError>
where
    L: AccountLookup + ?Sized,
{
    debug_assert_eq!(order.account_id, account.id);

    if !order.is_paid() && !force {
        return Err(LedgerError::NotPaid);
    }

    order.paid = true;
    account.extend_paid_time(order.duration, now);

    let referral = match account.referrer_id.take() {
        None => ReferralOutcome::NoReferrer,
        Some(referrer_id) if referrer_id == account.id => {
            account.extend_paid_time(referral_bonus(), now);
            ReferralOutcome::Granted(referrer_id)
        }
        Some(referrer_id) => match referrers.find_account_mut(referrer_id) {
            Some(referrer) => {
                referrer.extend_paid_time(referral_bonus(), now);
                ReferralOutcome::Granted(referrer_id)
            }
            None => ReferralOutcome::ReferrerMissing(referrer_id),
        },
    };

    Ok(Settlement {
        order_id: order.id,
        account_id: account.id,
        paid_until: account.paid_until,
        referral,
    })
}

/// Applies `code` to `account`.
///
/// `reuse` lifts the one-shot restriction (the last redeemer is recorded) but
/// never the free-only restriction.
pub fn redeem_gift_code(
    code: &mut GiftCodeEntity,
    account: &mut AccountEntity,
    reuse: bool,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    if code.is_redeemed() && !reuse {
        return Err(LedgerError::AlreadyRedeemed);
    }
    if code.free_only && account.is_paid(now) {
        return Err(LedgerError::AlreadyRedeemed);
    }

    code.redeemed_by = Some(account.id);
    account.extend_paid_time(code.granted_duration, now);
    Ok(())
}
