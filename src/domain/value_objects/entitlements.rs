use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::{accounts::AccountEntity, orders::OrderEntity},
    value_objects::enums::payment_methods::PaymentMethod,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitlementStatusDto {
    pub account_id: Uuid,
    pub is_paid: bool,
    pub paid_until: Option<DateTime<Utc>>,
    pub paid_days_left: i64,
}

impl EntitlementStatusDto {
    pub fn from_account(account: &AccountEntity, now: DateTime<Utc>) -> Self {
        Self {
            account_id: account.id,
            is_paid: account.is_paid(now),
            paid_until: account.paid_until,
            paid_days_left: account.paid_days_left(now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDto {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub currency: String,
    pub duration_seconds: i64,
    pub method: PaymentMethod,
    pub settled: bool,
    pub fully_paid: bool,
    pub start_date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
}

impl From<OrderEntity> for OrderDto {
    fn from(value: OrderEntity) -> Self {
        Self {
            id: value.id,
            account_id: value.account_id,
            fully_paid: value.is_paid(),
            currency: value.currency().to_string(),
            amount: value.amount,
            paid_amount: value.paid_amount,
            duration_seconds: value.duration.num_seconds(),
            method: value.method,
            settled: value.paid,
            start_date: value.start_date,
            close_date: value.close_date,
        }
    }
}
