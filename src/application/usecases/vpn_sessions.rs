use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::interfaces::clock::Clock,
    domain::{
        entities::vpn_sessions::{CloseVpnSessionEntity, InsertVpnSessionEntity, VpnSessionEntity},
        repositories::{accounts::AccountRepository, vpn_sessions::VpnSessionRepository},
    },
};

#[derive(Debug, Error)]
pub enum VpnSessionError {
    #[error("account not found")]
    AccountNotFound,
    #[error("session not found")]
    SessionNotFound,
    #[error("session is already closed")]
    AlreadyClosed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, VpnSessionError>;

#[derive(Debug, Clone)]
pub struct ConnectSessionModel {
    pub account_id: Uuid,
    pub gateway_id: Uuid,
    pub gateway_version: i32,
    pub profile_id: Option<Uuid>,
    pub remote_addr: String,
    pub internal_ip4: Option<String>,
    pub internal_ip6: Option<String>,
}

pub struct VpnSessionUseCase<S, A, C>
where
    S: VpnSessionRepository + Send + Sync + 'static,
    A: AccountRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    session_repo: Arc<S>,
    account_repo: Arc<A>,
    clock: Arc<C>,
}

impl<S, A, C> VpnSessionUseCase<S, A, C>
where
    S: VpnSessionRepository + Send + Sync + 'static,
    A: AccountRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(session_repo: Arc<S>, account_repo: Arc<A>, clock: Arc<C>) -> Self {
        Self {
            session_repo,
            account_repo,
            clock,
        }
    }

    /// Opens a session stamped with the current time.
    pub async fn connect(&self, connect_model: ConnectSessionModel) -> UseCaseResult<VpnSessionEntity> {
        let account_id = connect_model.account_id;
        let account = self.account_repo.find_by_id(account_id).await.map_err(|err| {
            error!(%account_id, db_error = ?err, "vpn_sessions: failed to load account");
            VpnSessionError::Internal(err)
        })?;
        if account.is_none() {
            warn!(%account_id, "vpn_sessions: connect for unknown account");
            return Err(VpnSessionError::AccountNotFound);
        }

        let session = InsertVpnSessionEntity {
            account_id,
            gateway_id: connect_model.gateway_id,
            gateway_version: connect_model.gateway_version,
            profile_id: connect_model.profile_id,
            connect_date: self.clock.now(),
            remote_addr: connect_model.remote_addr,
            internal_ip4: connect_model.internal_ip4,
            internal_ip6: connect_model.internal_ip6,
        };

        let session_id = self.session_repo.insert(session.clone()).await.map_err(|err| {
            error!(%account_id, db_error = ?err, "vpn_sessions: failed to insert session");
            VpnSessionError::Internal(err)
        })?;

        info!(
            %account_id,
            %session_id,
            gateway_id = %session.gateway_id,
            "vpn_sessions: session opened"
        );
        Ok(session.into_entity(session_id))
    }

    /// Closes an online session and stores its traffic counters.
    pub async fn disconnect(
        &self,
        session_id: Uuid,
        bytes_up: Option<i64>,
        bytes_down: Option<i64>,
    ) -> UseCaseResult<VpnSessionEntity> {
        let mut session = self
            .session_repo
            .find_by_id(session_id)
            .await
            .map_err(|err| {
                error!(%session_id, db_error = ?err, "vpn_sessions: failed to load session");
                VpnSessionError::Internal(err)
            })?
            .ok_or(VpnSessionError::SessionNotFound)?;

        if !session.is_online() {
            warn!(%session_id, "vpn_sessions: session already closed");
            return Err(VpnSessionError::AlreadyClosed);
        }

        let close = CloseVpnSessionEntity {
            disconnect_date: self.clock.now(),
            bytes_up,
            bytes_down,
        };
        self.session_repo
            .close(session_id, close.clone())
            .await
            .map_err(|err| {
                error!(%session_id, db_error = ?err, "vpn_sessions: failed to close session");
                VpnSessionError::Internal(err)
            })?;
        session.close(close);

        info!(
            %session_id,
            account_id = %session.account_id,
            duration_secs = session.duration().map(|d| d.num_seconds()),
            "vpn_sessions: session closed"
        );
        Ok(session)
    }

    pub async fn online_sessions(&self, account_id: Uuid) -> UseCaseResult<Vec<VpnSessionEntity>> {
        self.session_repo.list_online(account_id).await.map_err(|err| {
            error!(%account_id, db_error = ?err, "vpn_sessions: failed to list sessions");
            VpnSessionError::Internal(err)
        })
    }
}
