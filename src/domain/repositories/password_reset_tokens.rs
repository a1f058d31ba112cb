use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::password_reset_tokens::PasswordResetTokenEntity;

#[async_trait]
#[automock]
pub trait PasswordResetTokenRepository {
    async fn insert(&self, token: PasswordResetTokenEntity) -> Result<()>;
}
