use std::sync::Arc;

use anyhow::Context as _;
use chrono::{Duration, Utc};

use echosavvy_auth_types::token::{TokenSecret, issue_session_token};
use echosavvy_domain::credential::CredentialId;
use echosavvy_domain::id::UserId;

use crate::domain::repository::UserRepository;
use crate::domain::types::{CHALLENGE_TTL_SECS, NewUser};
use crate::domain::webauthn::{
    Assertion, CredentialPublicKey, RegistrationOptions, RelyingParty, new_challenge,
};
use crate::error::ShopServiceError;

// ── Register challenge ────────────────────────────────────────────────────────

pub struct RegisterChallengeOutput {
    pub challenge: String,
    pub options: RegistrationOptions,
}

pub struct RegisterChallengeUseCase {
    pub relying_party: Arc<RelyingParty>,
}

impl RegisterChallengeUseCase {
    /// Creation challenges are not stored: signup trusts the first key it sees.
    pub fn execute(&self, username: Option<&str>) -> RegisterChallengeOutput {
        let challenge = new_challenge();
        let options = self.relying_party.registration_options(&challenge, username);
        RegisterChallengeOutput { challenge, options }
    }
}

// ── Signup ────────────────────────────────────────────────────────────────────

pub struct SignupInput {
    pub username: String,
    pub phone: String,
    pub credential_id: String,
    pub public_key: String,
}

pub struct SignupUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> SignupUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: SignupInput) -> Result<UserId, ShopServiceError> {
        let credential_id = CredentialId::parse(&input.credential_id)
            .map_err(|_| ShopServiceError::InvalidCredentialId)?;
        let public_key = CredentialPublicKey::from_registration(&input.public_key)
            .map_err(|e| {
                tracing::debug!(reason = %e, "rejected signup public key");
                ShopServiceError::InvalidPublicKey
            })?
            .to_base64url()
            .map_err(|_| ShopServiceError::InvalidPublicKey)?;

        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(ShopServiceError::UsernameTaken);
        }

        let user_id = self
            .users
            .create(&NewUser {
                username: input.username,
                phone: input.phone,
                credential_id,
                public_key,
            })
            .await?;
        tracing::info!(user_id = %user_id, "signup");
        Ok(user_id)
    }
}

// ── Get challenge ─────────────────────────────────────────────────────────────

pub struct GetChallengeOutput {
    pub challenge: String,
    pub credential_id: CredentialId,
}

pub struct GetChallengeUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
}

impl<U> GetChallengeUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, username: &str) -> Result<GetChallengeOutput, ShopServiceError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(ShopServiceError::UserNotFound)?;

        let challenge = new_challenge();
        let expires_at = Utc::now() + Duration::seconds(CHALLENGE_TTL_SECS);
        self.users
            .set_challenge(user.id, &challenge, expires_at)
            .await?;
        tracing::debug!(user_id = %user.id, "login challenge issued");

        Ok(GetChallengeOutput {
            challenge,
            credential_id: user.credential_id,
        })
    }
}

// ── Login ─────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub username: String,
    pub credential_id: String,
    pub authenticator_data: String,
    pub client_data_json: String,
    pub signature: String,
}

pub struct LoginOutput {
    pub token: String,
    pub user_id: UserId,
}

pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
    pub relying_party: Arc<RelyingParty>,
    pub jwt_secret: TokenSecret,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: LoginInput) -> Result<LoginOutput, ShopServiceError> {
        let user = self
            .users
            .find_by_username(&input.username)
            .await?
            .ok_or(ShopServiceError::InvalidCredential)?;

        let presented = CredentialId::parse(&input.credential_id)
            .map_err(|_| ShopServiceError::InvalidCredential)?;
        if presented != user.credential_id {
            return Err(ShopServiceError::InvalidCredential);
        }

        let now = Utc::now();
        let challenge = user
            .live_challenge(now)
            .ok_or(ShopServiceError::ChallengeExpired)?
            .to_owned();
        // Burn the challenge before verifying so a failed attempt cannot be retried.
        if !self.users.consume_challenge(user.id, &challenge, now).await? {
            return Err(ShopServiceError::ChallengeExpired);
        }

        let assertion = Assertion::decode(
            &input.authenticator_data,
            &input.client_data_json,
            &input.signature,
        )
        .map_err(|_| ShopServiceError::InvalidAssertion)?;
        let key = CredentialPublicKey::from_stored(&user.public_key)
            .with_context(|| format!("stored public key for user {}", user.id))?;
        self.relying_party
            .verify(&key, &assertion, &challenge)
            .map_err(|e| {
                tracing::info!(user_id = %user.id, reason = %e, "assertion rejected");
                ShopServiceError::InvalidAssertion
            })?;

        let (token, _exp) = issue_session_token(user.id, &user.username, &self.jwt_secret)
            .context("sign session token")?;
        self.users.set_token(user.id, &token).await?;
        tracing::info!(user_id = %user.id, "login");

        Ok(LoginOutput {
            token,
            user_id: user.id,
        })
    }
}
