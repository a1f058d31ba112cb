use std::sync::Arc;

use chrono::Duration;
use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::interfaces::clock::Clock,
    config::config_model::EntitlementPolicy,
    domain::{
        entities::{
            accounts::{AccountEntity, EntitlementUpdateEntity},
            gift_codes::{GiftCodeEntity, InsertGiftCodeEntity},
            orders::{InsertOrderEntity, OrderEntity},
        },
        repositories::{
            accounts::AccountRepository, gift_codes::GiftCodeRepository,
            orders::OrderRepository,
        },
        services::entitlement_ledger::{self, LedgerError, ReferralOutcome, Settlement},
        value_objects::{
            entitlements::{EntitlementStatusDto, OrderDto},
            enums::payment_methods::PaymentMethod,
        },
    },
};

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("account not found")]
    AccountNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("gift code not found")]
    GiftCodeNotFound,
    #[error("payment amount is invalid")]
    InvalidPayment,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, EntitlementError>;

/// Loads entities, applies the ledger rules and writes the result back.
///
/// Settlement and redemption each end in a single composite repository write,
/// so a failure leaves nothing half-applied.
pub struct EntitlementUseCase<A, O, G, C>
where
    A: AccountRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: GiftCodeRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    account_repo: Arc<A>,
    order_repo: Arc<O>,
    gift_code_repo: Arc<G>,
    clock: Arc<C>,
    policy: EntitlementPolicy,
}

impl<A, O, G, C> EntitlementUseCase<A, O, G, C>
where
    A: AccountRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    G: GiftCodeRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(
        account_repo: Arc<A>,
        order_repo: Arc<O>,
        gift_code_repo: Arc<G>,
        clock: Arc<C>,
        policy: EntitlementPolicy,
    ) -> Self {
        Self {
            account_repo,
            order_repo,
            gift_code_repo,
            clock,
            policy,
        }
    }

    pub async fn entitlement_status(&self, account_id: Uuid) -> UseCaseResult<EntitlementStatusDto> {
        let account = self.load_account(account_id).await?;
        Ok(EntitlementStatusDto::from_account(&account, self.clock.now()))
    }

    pub async fn place_order(
        &self,
        account_id: Uuid,
        amount: Decimal,
        duration: Duration,
        method: PaymentMethod,
        paid_amount: Decimal,
        ttl: Option<Duration>,
    ) -> UseCaseResult<Uuid> {
        self.load_account(account_id).await?;

        let order = InsertOrderEntity::new(
            account_id,
            amount,
            duration,
            method,
            paid_amount,
            ttl.unwrap_or(self.policy.order_ttl),
            self.clock.now(),
        );

        let order_id = self.order_repo.insert(order).await.map_err(|err| {
            error!(
                %account_id,
                db_error = ?err,
                "entitlements: failed to insert order"
            );
            EntitlementError::Internal(err)
        })?;

        info!(
            %account_id,
            %order_id,
            %amount,
            %method,
            "entitlements: order placed"
        );
        Ok(order_id)
    }

    /// Adds `amount` to what the order has received. Settlement is a separate
    /// step. Negative amounts are refused.
    pub async fn record_payment(&self, order_id: Uuid, amount: Decimal) -> UseCaseResult<OrderDto> {
        if amount < Decimal::ZERO {
            warn!(%order_id, %amount, "entitlements: refusing negative payment");
            return Err(EntitlementError::InvalidPayment);
        }

        let mut order = self.load_order(order_id).await?;
        let paid_amount = order.paid_amount.checked_add(amount).ok_or_else(|| {
            warn!(
                %order_id,
                %amount,
                paid_amount = %order.paid_amount,
                "entitlements: paid amount out of range"
            );
            EntitlementError::InvalidPayment
        })?;
        order.paid_amount = paid_amount;

        self.order_repo
            .update_paid_amount(order_id, order.paid_amount)
            .await
            .map_err(|err| {
                error!(
                    %order_id,
                    db_error = ?err,
                    "entitlements: failed to update paid amount"
                );
                EntitlementError::Internal(err)
            })?;

        info!(
            %order_id,
            %amount,
            paid_amount = %order.paid_amount,
            fully_paid = order.is_paid(),
            "entitlements: payment recorded"
        );
        Ok(OrderDto::from(order))
    }

    pub async fn settle_order(&self, order_id: Uuid, force: bool) -> UseCaseResult<Settlement> {
        let mut order = self.load_order(order_id).await?;
        let mut account = self.load_account(order.account_id).await?;
        let account_id = account.id;

        let mut referrer = match account.referrer_id {
            Some(referrer_id) if referrer_id != account_id => self
                .account_repo
                .find_by_id(referrer_id)
                .await
                .map_err(|err| {
                    error!(
                        %account_id,
                        %referrer_id,
                        db_error = ?err,
                        "entitlements: failed to load referrer"
                    );
                    EntitlementError::Internal(err)
                })?,
            _ => None,
        };

        let now = self.clock.now();
        let settlement =
            entitlement_ledger::settle_order(&mut order, &mut account, &mut referrer, force, now)
                .map_err(|err| {
                    warn!(
                        %order_id,
                        %account_id,
                        amount = %order.amount,
                        paid_amount = %order.paid_amount,
                        "entitlements: refusing to settle unpaid order"
                    );
                    EntitlementError::Ledger(err)
                })?;

        let referrer_update = match settlement.referral {
            ReferralOutcome::Granted(referrer_id) => referrer
                .as_ref()
                .filter(|r| r.id == referrer_id)
                .map(EntitlementUpdateEntity::from),
            _ => None,
        };

        self.order_repo
            .apply_settlement(
                order_id,
                EntitlementUpdateEntity::from(&account),
                referrer_update,
            )
            .await
            .map_err(|err| {
                error!(
                    %order_id,
                    %account_id,
                    db_error = ?err,
                    "entitlements: failed to store settlement"
                );
                EntitlementError::Internal(err)
            })?;

        match settlement.referral {
            ReferralOutcome::Granted(referrer_id) => {
                info!(%account_id, %referrer_id, "entitlements: referral bonus granted");
            }
            ReferralOutcome::ReferrerMissing(referrer_id) => {
                warn!(
                    %account_id,
                    %referrer_id,
                    "entitlements: referrer no longer exists, referral dropped"
                );
            }
            ReferralOutcome::NoReferrer => {}
        }

        info!(
            %order_id,
            %account_id,
            forced = force,
            paid_until = ?settlement.paid_until,
            "entitlements: order settled"
        );
        Ok(settlement)
    }

    pub async fn issue_gift_code<R>(
        &self,
        rng: &mut R,
        duration: Option<Duration>,
        free_only: bool,
    ) -> UseCaseResult<GiftCodeEntity>
    where
        R: Rng + Send + ?Sized,
    {
        let gift_code = InsertGiftCodeEntity::generate(
            rng,
            duration.unwrap_or(self.policy.gift_code_duration),
            free_only,
        );

        let gift_code_id = self
            .gift_code_repo
            .insert(gift_code.clone())
            .await
            .map_err(|err| {
                error!(db_error = ?err, "entitlements: failed to insert gift code");
                EntitlementError::Internal(err)
            })?;

        info!(
            %gift_code_id,
            free_only,
            granted_days = gift_code.granted_duration.num_days(),
            "entitlements: gift code issued"
        );
        Ok(gift_code.into_entity(gift_code_id))
    }

    pub async fn redeem_gift_code(
        &self,
        code: &str,
        account_id: Uuid,
        reuse: bool,
    ) -> UseCaseResult<EntitlementStatusDto> {
        let mut gift_code = self
            .gift_code_repo
            .find_by_code(code.to_string())
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "entitlements: failed to load gift code");
                EntitlementError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%account_id, "entitlements: unknown gift code");
                EntitlementError::GiftCodeNotFound
            })?;
        let mut account = self.load_account(account_id).await?;

        let now = self.clock.now();
        entitlement_ledger::redeem_gift_code(&mut gift_code, &mut account, reuse, now).map_err(
            |err| {
                warn!(
                    %account_id,
                    gift_code_id = %gift_code.id,
                    reuse,
                    free_only = gift_code.free_only,
                    "entitlements: gift code rejected"
                );
                EntitlementError::Ledger(err)
            },
        )?;

        self.gift_code_repo
            .apply_redemption(gift_code.id, EntitlementUpdateEntity::from(&account))
            .await
            .map_err(|err| {
                error!(
                    %account_id,
                    gift_code_id = %gift_code.id,
                    db_error = ?err,
                    "entitlements: failed to store gift code redemption"
                );
                EntitlementError::Internal(err)
            })?;

        info!(
            %account_id,
            gift_code_id = %gift_code.id,
            paid_until = ?account.paid_until,
            "entitlements: gift code redeemed"
        );
        Ok(EntitlementStatusDto::from_account(&account, now))
    }

    async fn load_account(&self, account_id: Uuid) -> UseCaseResult<AccountEntity> {
        self.account_repo
            .find_by_id(account_id)
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "entitlements: failed to load account");
                EntitlementError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%account_id, "entitlements: account not found");
                EntitlementError::AccountNotFound
            })
    }

    async fn load_order(&self, order_id: Uuid) -> UseCaseResult<OrderEntity> {
        self.order_repo
            .find_by_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "entitlements: failed to load order");
                EntitlementError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%order_id, "entitlements: order not found");
                EntitlementError::OrderNotFound
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::predicate::eq;
    use rand::{SeedableRng, rngs::StdRng};

    use crate::{
        application::interfaces::clock::MockClock,
        domain::repositories::{
            accounts::MockAccountRepository, gift_codes::MockGiftCodeRepository,
            orders::MockOrderRepository,
        },
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn sample_account(paid_until: Option<DateTime<Utc>>) -> AccountEntity {
        AccountEntity {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
            email: Some("bob@example.com".to_string()),
            password_hash: String::new(),
            is_active: true,
            is_admin: false,
            signup_date: now() - Duration::days(10),
            last_login: None,
            paid_until,
            referrer_id: None,
        }
    }

    fn sample_order(account_id: Uuid, amount: i64, paid_amount: i64) -> OrderEntity {
        OrderEntity {
            id: Uuid::new_v4(),
            account_id,
            start_date: now() - Duration::hours(1),
            close_date: Some(now() + Duration::days(30)),
            amount: Decimal::new(amount, 0),
            paid_amount: Decimal::new(paid_amount, 0),
            duration: Duration::days(30),
            method: PaymentMethod::Paypal,
            paid: false,
        }
    }

    fn sample_gift_code(free_only: bool, redeemed_by: Option<Uuid>) -> GiftCodeEntity {
        GiftCodeEntity {
            id: Uuid::new_v4(),
            code: "GIFTCODE12345678".to_string(),
            granted_duration: Duration::days(30),
            free_only,
            redeemed_by,
        }
    }

    fn fixed_clock() -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now().return_const(now());
        clock
    }

    fn expect_account(repo: &mut MockAccountRepository, account: &AccountEntity) {
        let account = account.clone();
        repo.expect_find_by_id()
            .with(eq(account.id))
            .returning(move |_| {
                let account = account.clone();
                Box::pin(async move { Ok(Some(account)) })
            });
    }

    fn expect_order(repo: &mut MockOrderRepository, order: &OrderEntity) {
        let order = order.clone();
        repo.expect_find_by_id()
            .with(eq(order.id))
            .returning(move |_| {
                let order = order.clone();
                Box::pin(async move { Ok(Some(order)) })
            });
    }

    fn use_case(
        account_repo: MockAccountRepository,
        order_repo: MockOrderRepository,
        gift_code_repo: MockGiftCodeRepository,
    ) -> EntitlementUseCase<MockAccountRepository, MockOrderRepository, MockGiftCodeRepository, MockClock>
    {
        EntitlementUseCase::new(
            Arc::new(account_repo),
            Arc::new(order_repo),
            Arc::new(gift_code_repo),
            Arc::new(fixed_clock()),
            EntitlementPolicy::default(),
        )
    }

    fn update(account_id: Uuid, paid_until: DateTime<Utc>) -> EntitlementUpdateEntity {
        EntitlementUpdateEntity {
            account_id,
            paid_until: Some(paid_until),
            referrer_id: None,
        }
    }

    #[tokio::test]
    async fn settles_paid_order_in_one_write() {
        let account = sample_account(None);
        let order = sample_order(account.id, 100, 100);
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        expect_order(&mut order_repo, &order);

        order_repo
            .expect_apply_settlement()
            .with(
                eq(order.id),
                eq(update(account_id, now() + Duration::days(30))),
                eq(None::<EntitlementUpdateEntity>),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let settlement = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await
            .unwrap();

        assert_eq!(settlement.account_id, account_id);
        assert_eq!(settlement.referral, ReferralOutcome::NoReferrer);
    }

    #[tokio::test]
    async fn failed_settlement_write_reports_error() {
        let referrer = sample_account(None);
        let mut account = sample_account(None);
        account.referrer_id = Some(referrer.id);
        let order = sample_order(account.id, 100, 100);

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        expect_account(&mut account_repo, &referrer);
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_apply_settlement()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Err(anyhow::anyhow!("deadlock detected")) }));
        order_repo.expect_update_paid_amount().never();
        account_repo.expect_insert().never();
        account_repo.expect_update_last_login().never();

        let result = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await;

        assert!(matches!(result, Err(EntitlementError::Internal(_))));
    }

    #[tokio::test]
    async fn unpaid_order_is_not_persisted() {
        let account = sample_account(None);
        let order = sample_order(account.id, 100, 50);

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        expect_order(&mut order_repo, &order);
        order_repo.expect_apply_settlement().never();

        let result = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await;

        assert!(matches!(
            result,
            Err(EntitlementError::Ledger(LedgerError::NotPaid))
        ));
    }

    #[tokio::test]
    async fn forced_settlement_ignores_missing_payment() {
        let account = sample_account(None);
        let order = sample_order(account.id, 100, 0);

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_apply_settlement()
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let settlement = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, true)
            .await
            .unwrap();

        assert_eq!(settlement.paid_until, Some(now() + Duration::days(30)));
    }

    #[tokio::test]
    async fn settlement_grants_referrer_and_clears_referral() {
        let referrer = sample_account(Some(now() + Duration::days(1)));
        let mut account = sample_account(None);
        account.referrer_id = Some(referrer.id);
        let order = sample_order(account.id, 10, 10);
        let (account_id, referrer_id) = (account.id, referrer.id);

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        expect_account(&mut account_repo, &referrer);
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_apply_settlement()
            .with(
                eq(order.id),
                eq(update(account_id, now() + Duration::days(30))),
                eq(Some(update(referrer_id, now() + Duration::days(15)))),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let settlement = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await
            .unwrap();

        assert_eq!(settlement.referral, ReferralOutcome::Granted(referrer_id));
    }

    #[tokio::test]
    async fn self_referral_credits_the_buyer_without_a_second_lookup() {
        let mut account = sample_account(None);
        account.referrer_id = Some(account.id);
        let order = sample_order(account.id, 10, 10);
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        let loaded = account.clone();
        account_repo
            .expect_find_by_id()
            .with(eq(account_id))
            .times(1)
            .returning(move |_| {
                let account = loaded.clone();
                Box::pin(async move { Ok(Some(account)) })
            });
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_apply_settlement()
            .with(
                eq(order.id),
                eq(update(account_id, now() + Duration::days(44))),
                eq(None::<EntitlementUpdateEntity>),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let settlement = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await
            .unwrap();

        assert_eq!(settlement.referral, ReferralOutcome::Granted(account_id));
        assert_eq!(settlement.paid_until, Some(now() + Duration::days(44)));
    }

    #[tokio::test]
    async fn stale_referrer_is_dropped_without_bonus() {
        let stale_id = Uuid::new_v4();
        let mut account = sample_account(None);
        account.referrer_id = Some(stale_id);
        let order = sample_order(account.id, 10, 10);
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        account_repo
            .expect_find_by_id()
            .with(eq(stale_id))
            .returning(|_| Box::pin(async { Ok(None) }));
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_apply_settlement()
            .with(
                eq(order.id),
                eq(update(account_id, now() + Duration::days(30))),
                eq(None::<EntitlementUpdateEntity>),
            )
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(()) }));

        let settlement = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .settle_order(order.id, false)
            .await
            .unwrap();

        assert_eq!(settlement.referral, ReferralOutcome::ReferrerMissing(stale_id));
    }

    #[tokio::test]
    async fn settling_unknown_order_fails() {
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let result = use_case(MockAccountRepository::new(), order_repo, MockGiftCodeRepository::new())
            .settle_order(Uuid::new_v4(), false)
            .await;

        assert!(matches!(result, Err(EntitlementError::OrderNotFound)));
    }

    #[tokio::test]
    async fn repository_failures_surface_as_internal() {
        let mut account_repo = MockAccountRepository::new();
        account_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));

        let result = use_case(account_repo, MockOrderRepository::new(), MockGiftCodeRepository::new())
            .entitlement_status(Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(EntitlementError::Internal(_))));
    }

    #[tokio::test]
    async fn places_order_with_default_ttl() {
        let account = sample_account(None);
        let account_id = account.id;
        let order_id = Uuid::new_v4();

        let mut account_repo = MockAccountRepository::new();
        let mut order_repo = MockOrderRepository::new();
        expect_account(&mut account_repo, &account);
        order_repo
            .expect_insert()
            .withf(move |order| {
                order.account_id == account_id
                    && order.start_date == now()
                    && order.close_date == Some(now() + Duration::days(30))
                    && !order.paid
            })
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(order_id) }));

        let placed = use_case(account_repo, order_repo, MockGiftCodeRepository::new())
            .place_order(
                account_id,
                Decimal::new(9, 0),
                Duration::days(30),
                PaymentMethod::Stripe,
                Decimal::ZERO,
                None,
            )
            .await
            .unwrap();

        assert_eq!(placed, order_id);
    }

    #[tokio::test]
    async fn recording_payment_does_not_settle() {
        let order = sample_order(Uuid::new_v4(), 100, 40);
        let order_id = order.id;

        let mut order_repo = MockOrderRepository::new();
        expect_order(&mut order_repo, &order);
        order_repo
            .expect_update_paid_amount()
            .with(eq(order_id), eq(Decimal::new(100, 0)))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));
        order_repo.expect_apply_settlement().never();

        let dto = use_case(MockAccountRepository::new(), order_repo, MockGiftCodeRepository::new())
            .record_payment(order_id, Decimal::new(60, 0))
            .await
            .unwrap();

        assert!(dto.fully_paid);
        assert!(!dto.settled);
    }

    #[tokio::test]
    async fn negative_payment_is_refused() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().never();
        order_repo.expect_update_paid_amount().never();

        let result = use_case(MockAccountRepository::new(), order_repo, MockGiftCodeRepository::new())
            .record_payment(Uuid::new_v4(), Decimal::new(-5, 0))
            .await;

        assert!(matches!(result, Err(EntitlementError::InvalidPayment)));
    }

    #[tokio::test]
    async fn payment_overflow_is_refused() {
        let mut order = sample_order(Uuid::new_v4(), 100, 0);
        order.paid_amount = Decimal::MAX;
        let order_id = order.id;

        let mut order_repo = MockOrderRepository::new();
        expect_order(&mut order_repo, &order);
        order_repo.expect_update_paid_amount().never();

        let result = use_case(MockAccountRepository::new(), order_repo, MockGiftCodeRepository::new())
            .record_payment(order_id, Decimal::ONE)
            .await;

        assert!(matches!(result, Err(EntitlementError::InvalidPayment)));
    }

    #[tokio::test]
    async fn issues_gift_code_with_policy_duration() {
        let gift_code_id = Uuid::new_v4();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        gift_code_repo
            .expect_insert()
            .withf(|code| code.code.len() == 16 && code.granted_duration == Duration::days(30))
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(gift_code_id) }));

        let issued = use_case(MockAccountRepository::new(), MockOrderRepository::new(), gift_code_repo)
            .issue_gift_code(&mut StdRng::seed_from_u64(9), None, true)
            .await
            .unwrap();

        assert_eq!(issued.id, gift_code_id);
        assert!(issued.free_only);
        assert_eq!(issued.redeemed_by, None);
    }

    fn expect_gift_code(repo: &mut MockGiftCodeRepository, gift_code: &GiftCodeEntity) {
        let gift_code = gift_code.clone();
        repo.expect_find_by_code()
            .with(eq(gift_code.code.clone()))
            .returning(move |_| {
                let gift_code = gift_code.clone();
                Box::pin(async move { Ok(Some(gift_code)) })
            });
    }

    #[tokio::test]
    async fn redeems_gift_code_in_one_write() {
        let account = sample_account(Some(now() + Duration::days(2)));
        let gift_code = sample_gift_code(false, None);
        let (account_id, gift_code_id) = (account.id, gift_code.id);

        let mut account_repo = MockAccountRepository::new();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        expect_account(&mut account_repo, &account);
        expect_gift_code(&mut gift_code_repo, &gift_code);
        gift_code_repo
            .expect_apply_redemption()
            .with(
                eq(gift_code_id),
                eq(update(account_id, now() + Duration::days(32))),
            )
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let status = use_case(account_repo, MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("GIFTCODE12345678", account_id, false)
            .await
            .unwrap();

        assert!(status.is_paid);
        assert_eq!(status.paid_days_left, 32);
    }

    #[tokio::test]
    async fn failed_redemption_write_reports_error() {
        let account = sample_account(None);
        let gift_code = sample_gift_code(false, None);
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        expect_account(&mut account_repo, &account);
        expect_gift_code(&mut gift_code_repo, &gift_code);
        gift_code_repo
            .expect_apply_redemption()
            .times(1)
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        gift_code_repo.expect_insert().never();
        account_repo.expect_update_last_login().never();

        let result = use_case(account_repo, MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("GIFTCODE12345678", account_id, false)
            .await;

        assert!(matches!(result, Err(EntitlementError::Internal(_))));
    }

    #[tokio::test]
    async fn reused_code_records_the_new_redeemer() {
        let account = sample_account(None);
        let gift_code = sample_gift_code(false, Some(Uuid::new_v4()));
        let (account_id, gift_code_id) = (account.id, gift_code.id);

        let mut account_repo = MockAccountRepository::new();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        expect_account(&mut account_repo, &account);
        expect_gift_code(&mut gift_code_repo, &gift_code);
        gift_code_repo
            .expect_apply_redemption()
            .with(
                eq(gift_code_id),
                eq(update(account_id, now() + Duration::days(30))),
            )
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let status = use_case(account_repo, MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("GIFTCODE12345678", account_id, true)
            .await
            .unwrap();

        assert_eq!(status.paid_until, Some(now() + Duration::days(30)));
    }

    #[tokio::test]
    async fn redeemed_code_is_refused_without_reuse() {
        let account = sample_account(None);
        let gift_code = sample_gift_code(false, Some(Uuid::new_v4()));
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        expect_account(&mut account_repo, &account);
        expect_gift_code(&mut gift_code_repo, &gift_code);
        gift_code_repo.expect_apply_redemption().never();

        let result = use_case(account_repo, MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("GIFTCODE12345678", account_id, false)
            .await;

        assert!(matches!(
            result,
            Err(EntitlementError::Ledger(LedgerError::AlreadyRedeemed))
        ));
    }

    #[tokio::test]
    async fn free_only_code_is_refused_for_paid_account() {
        let account = sample_account(Some(now() + Duration::days(2)));
        let gift_code = sample_gift_code(true, None);
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        let mut gift_code_repo = MockGiftCodeRepository::new();
        expect_account(&mut account_repo, &account);
        expect_gift_code(&mut gift_code_repo, &gift_code);
        gift_code_repo.expect_apply_redemption().never();

        let result = use_case(account_repo, MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("GIFTCODE12345678", account_id, true)
            .await;

        assert!(matches!(
            result,
            Err(EntitlementError::Ledger(LedgerError::AlreadyRedeemed))
        ));
    }

    #[tokio::test]
    async fn unknown_gift_code_fails() {
        let mut gift_code_repo = MockGiftCodeRepository::new();
        gift_code_repo
            .expect_find_by_code()
            .returning(|_| Box::pin(async { Ok(None) }));

        let result = use_case(MockAccountRepository::new(), MockOrderRepository::new(), gift_code_repo)
            .redeem_gift_code("NOPE", Uuid::new_v4(), false)
            .await;

        assert!(matches!(result, Err(EntitlementError::GiftCodeNotFound)));
    }

    #[tokio::test]
    async fn reports_entitlement_status() {
        let account = sample_account(Some(now() + Duration::hours(30)));
        let account_id = account.id;

        let mut account_repo = MockAccountRepository::new();
        expect_account(&mut account_repo, &account);

        let status = use_case(account_repo, MockOrderRepository::new(), MockGiftCodeRepository::new())
            .entitlement_status(account_id)
            .await
            .unwrap();

        assert!(status.is_paid);
        assert_eq!(status.paid_days_left, 1);
        assert_eq!(status.paid_until, Some(now() + Duration::hours(30)));
    }
}
