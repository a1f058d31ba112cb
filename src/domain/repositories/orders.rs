use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::{
    accounts::EntitlementUpdateEntity,
    orders::{InsertOrderEntity, OrderEntity},
};

#[async_trait]
#[automock]
pub trait OrderRepository {
    async fn find_by_id(&self, order_id: Uuid) -> Result<Option<OrderEntity>>;

    async fn insert(&self, order: InsertOrderEntity) -> Result<Uuid>;

    async fn update_paid_amount(&self, order_id: Uuid, paid_amount: Decimal) -> Result<()>;

    /// Marks the order settled and stores the buyer's and, when granted, the
    /// referrer's paid time in one transaction. Either every write lands or
    /// none does.
    async fn apply_settlement(
        &self,
        order_id: Uuid,
        account: EntitlementUpdateEntity,
        referrer: Option<EntitlementUpdateEntity>,
    ) -> Result<()>;
}
