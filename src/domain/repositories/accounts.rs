use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::accounts::{AccountEntity, InsertAccountEntity};

#[async_trait]
#[automock]
pub trait AccountRepository {
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountEntity>>;

    async fn find_by_username(&self, username: String) -> Result<Option<AccountEntity>>;

    /// Counts accounts whose username matches case-insensitively and accounts
    /// using `email`, in that order.
    async fn count_username_and_email(
        &self,
        username: String,
        email: Option<String>,
    ) -> Result<(i64, i64)>;

    async fn insert(&self, account: InsertAccountEntity) -> Result<Uuid>;

    async fn update_last_login(&self, account_id: Uuid, last_login: DateTime<Utc>) -> Result<()>;
}
