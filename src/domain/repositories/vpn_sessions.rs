use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::vpn_sessions::{
    CloseVpnSessionEntity, InsertVpnSessionEntity, VpnSessionEntity,
};

#[async_trait]
#[automock]
pub trait VpnSessionRepository {
    async fn find_by_id(&self, session_id: Uuid) -> Result<Option<VpnSessionEntity>>;

    async fn insert(&self, session: InsertVpnSessionEntity) -> Result<Uuid>;

    /// Sessions of `account_id` that have no disconnect date yet.
    async fn list_online(&self, account_id: Uuid) -> Result<Vec<VpnSessionEntity>>;

    async fn close(&self, session_id: Uuid, close: CloseVpnSessionEntity) -> Result<()>;
}
