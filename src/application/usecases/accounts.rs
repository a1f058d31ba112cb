use std::sync::Arc;

use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::interfaces::clock::Clock,
    config::config_model::EntitlementPolicy,
    domain::{
        entities::{
            accounts::{AccountEntity, InsertAccountEntity},
            password_reset_tokens::PasswordResetTokenEntity,
        },
        repositories::{
            accounts::AccountRepository, password_reset_tokens::PasswordResetTokenRepository,
        },
        value_objects::{
            credentials::{validate_email, validate_password, validate_username},
            passwords::{PasswordHash, verify_stored_password},
        },
    },
};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("username is already taken")]
    UsernameTaken,
    #[error("e-mail is already used")]
    EmailTaken,
    #[error("account not found")]
    AccountNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type UseCaseResult<T> = std::result::Result<T, AccountError>;

#[derive(Debug, Clone)]
pub struct RegisterAccountModel {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub referrer_id: Option<Uuid>,
}

pub struct AccountUseCase<A, T, C>
where
    A: AccountRepository + Send + Sync + 'static,
    T: PasswordResetTokenRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    account_repo: Arc<A>,
    token_repo: Arc<T>,
    clock: Arc<C>,
    policy: EntitlementPolicy,
}

impl<A, T, C> AccountUseCase<A, T, C>
where
    A: AccountRepository + Send + Sync + 'static,
    T: PasswordResetTokenRepository + Send + Sync + 'static,
    C: Clock + 'static,
{
    pub fn new(
        account_repo: Arc<A>,
        token_repo: Arc<T>,
        clock: Arc<C>,
        policy: EntitlementPolicy,
    ) -> Self {
        Self {
            account_repo,
            token_repo,
            clock,
            policy,
        }
    }

    /// Creates an account. A referrer id that no longer resolves is dropped
    /// rather than rejected.
    pub async fn register<R>(
        &self,
        rng: &mut R,
        register_model: RegisterAccountModel,
    ) -> UseCaseResult<Uuid>
    where
        R: RngCore + CryptoRng + Send + ?Sized,
    {
        let RegisterAccountModel {
            username,
            email,
            password,
            referrer_id,
        } = register_model;

        validate_username(&username).map_err(|err| AccountError::InvalidInput(err.to_string()))?;
        if let Some(email) = email.as_deref() {
            validate_email(email).map_err(|err| AccountError::InvalidInput(err.to_string()))?;
        }
        validate_password(&password).map_err(|err| AccountError::InvalidInput(err.to_string()))?;

        let (username_count, email_count) = self
            .account_repo
            .count_username_and_email(username.clone(), email.clone())
            .await
            .map_err(|err| {
                error!(%username, db_error = ?err, "accounts: failed to check username and email");
                AccountError::Internal(err)
            })?;
        if username_count > 0 {
            return Err(AccountError::UsernameTaken);
        }
        if email.is_some() && email_count > 0 {
            return Err(AccountError::EmailTaken);
        }

        let referrer_id = match referrer_id {
            Some(referrer_id) => {
                let referrer = self.account_repo.find_by_id(referrer_id).await.map_err(|err| {
                    error!(%referrer_id, db_error = ?err, "accounts: failed to load referrer");
                    AccountError::Internal(err)
                })?;
                if referrer.is_none() {
                    warn!(%username, %referrer_id, "accounts: unknown referrer ignored");
                }
                referrer.map(|referrer| referrer.id)
            }
            None => None,
        };

        let password_hash = PasswordHash::new(rng, &password).to_hex();
        let account_id = self
            .account_repo
            .insert(InsertAccountEntity {
                username: username.clone(),
                email,
                password_hash,
                signup_date: self.clock.now(),
                referrer_id,
            })
            .await
            .map_err(|err| {
                error!(%username, db_error = ?err, "accounts: failed to insert account");
                AccountError::Internal(err)
            })?;

        info!(%account_id, %username, referred = referrer_id.is_some(), "accounts: account registered");
        Ok(account_id)
    }

    /// Returns the account when the password matches. Inactive accounts never
    /// match.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> UseCaseResult<Option<AccountEntity>> {
        let account = self
            .account_repo
            .find_by_username(username.to_string())
            .await
            .map_err(|err| {
                error!(%username, db_error = ?err, "accounts: failed to load account");
                AccountError::Internal(err)
            })?;

        let Some(mut account) = account else {
            info!(%username, "accounts: unknown username");
            return Ok(None);
        };

        if !account.is_active || !verify_stored_password(&account.password_hash, password) {
            info!(account_id = %account.id, "accounts: credentials rejected");
            return Ok(None);
        }

        let now = self.clock.now();
        self.account_repo
            .update_last_login(account.id, now)
            .await
            .map_err(|err| {
                error!(account_id = %account.id, db_error = ?err, "accounts: failed to update last login");
                AccountError::Internal(err)
            })?;
        account.last_login = Some(now);

        Ok(Some(account))
    }

    pub async fn issue_password_reset<R>(
        &self,
        rng: &mut R,
        account_id: Uuid,
    ) -> UseCaseResult<PasswordResetTokenEntity>
    where
        R: RngCore + Send + ?Sized,
    {
        let account = self
            .account_repo
            .find_by_id(account_id)
            .await
            .map_err(|err| {
                error!(%account_id, db_error = ?err, "accounts: failed to load account");
                AccountError::Internal(err)
            })?
            .ok_or(AccountError::AccountNotFound)?;

        let token = PasswordResetTokenEntity::issue(
            rng,
            account.id,
            self.policy.password_reset_ttl,
            self.clock.now(),
        );

        self.token_repo.insert(token.clone()).await.map_err(|err| {
            error!(%account_id, db_error = ?err, "accounts: failed to store reset token");
            AccountError::Internal(err)
        })?;

        info!(%account_id, expires_at = %token.expires_at, "accounts: password reset issued");
        Ok(token)
    }
}
