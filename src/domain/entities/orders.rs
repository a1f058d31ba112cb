use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::enums::payment_methods::PaymentMethod;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntity {
    pub id: Uuid,
    pub account_id: Uuid,
    pub start_date: DateTime<Utc>,
    /// Cutoff after which a pending order is no longer shown. Not a
    /// settlement deadline.
    pub close_date: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub duration: Duration,
    pub method: PaymentMethod,
    /// Settled flag. Independent from `is_paid()`: an order can be fully paid
    /// and still waiting for settlement.
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrderEntity {
    pub account_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub duration: Duration,
    pub method: PaymentMethod,
    pub paid: bool,
}

impl InsertOrderEntity {
    pub fn new(
        account_id: Uuid,
        amount: Decimal,
        duration: Duration,
        method: PaymentMethod,
        paid_amount: Decimal,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            start_date: now,
            close_date: now.checked_add_signed(ttl),
            amount,
            paid_amount,
            duration,
            method,
            paid: paid_amount >= amount,
        }
    }

    pub fn into_entity(self, id: Uuid) -> OrderEntity {
        OrderEntity {
            id,
            account_id: self.account_id,
            start_date: self.start_date,
            close_date: self.close_date,
            amount: self.amount,
            paid_amount: self.paid_amount,
            duration: self.duration,
            method: self.method,
            paid: self.paid,
        }
    }
}

impl OrderEntity {
    /// Whether enough money has been received. Does not mean the order has
    /// been settled; see `paid`.
    pub fn is_paid(&self) -> bool {
        self.paid_amount >= self.amount
    }

    pub fn currency(&self) -> &'static str {
        self.method.currency()
    }

    pub fn is_displayable(&self, now: DateTime<Utc>) -> bool {
        self.paid || self.close_date.is_none_or(|close_date| close_date > now)
    }
}
