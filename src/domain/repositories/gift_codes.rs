use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::{
    accounts::EntitlementUpdateEntity,
    gift_codes::{GiftCodeEntity, InsertGiftCodeEntity},
};

#[async_trait]
#[automock]
pub trait GiftCodeRepository {
    async fn find_by_code(&self, code: String) -> Result<Option<GiftCodeEntity>>;

    async fn insert(&self, gift_code: InsertGiftCodeEntity) -> Result<Uuid>;

    /// Records `account.account_id` as the redeemer and stores its new paid
    /// time in one transaction.
    async fn apply_redemption(
        &self,
        gift_code_id: Uuid,
        account: EntitlementUpdateEntity,
    ) -> Result<()>;
}
