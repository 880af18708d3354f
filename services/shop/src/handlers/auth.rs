use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use echosavvy_domain::credential::CredentialId;
use echosavvy_domain::id::UserId;

use crate::domain::webauthn::RegistrationOptions;
use crate::error::ShopServiceError;
use crate::extract::ApiJson;
use crate::handlers::required;
use crate::state::AppState;
use crate::usecase::auth::{
    GetChallengeUseCase, LoginInput, LoginUseCase, RegisterChallengeUseCase, SignupInput,
    SignupUseCase,
};

// ── POST /api/register-challenge ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterChallengeRequest {
    pub username: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterChallengeResponse {
    pub success: bool,
    pub challenge: String,
    pub options: RegistrationOptions,
}

pub async fn register_challenge(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterChallengeRequest>,
) -> Json<RegisterChallengeResponse> {
    let usecase = RegisterChallengeUseCase {
        relying_party: state.relying_party.clone(),
    };
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let out = usecase.execute(username);
    Json(RegisterChallengeResponse {
        success: true,
        challenge: out.challenge,
        options: out.options,
    })
}

// ── POST /api/signup ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub credential_id: Option<String>,
    pub public_key: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<Json<MessageResponse>, ShopServiceError> {
    let input = SignupInput {
        username: required(body.username, "username")?,
        phone: required(body.phone, "phone")?,
        credential_id: required(body.credential_id, "credential_id")?,
        public_key: required(body.public_key, "public_key")?,
    };
    let usecase = SignupUseCase {
        users: state.user_repo(),
    };
    usecase.execute(input).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "user registered",
    }))
}

// ── POST /api/get-challenge ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GetChallengeRequest {
    pub username: Option<String>,
}

#[derive(Serialize)]
pub struct GetChallengeResponse {
    pub success: bool,
    pub challenge: String,
    pub credential_id: CredentialId,
}

pub async fn get_challenge(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GetChallengeRequest>,
) -> Result<Json<GetChallengeResponse>, ShopServiceError> {
    let username = required(body.username, "username")?;
    let usecase = GetChallengeUseCase {
        users: state.user_repo(),
    };
    let out = usecase.execute(&username).await?;
    Ok(Json(GetChallengeResponse {
        success: true,
        challenge: out.challenge,
        credential_id: out.credential_id,
    }))
}

// ── POST /api/login ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub credential_id: Option<String>,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: Option<String>,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Option<String>,
    pub signature: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user_id: UserId,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ShopServiceError> {
    let input = LoginInput {
        username: required(body.username, "username")?,
        credential_id: required(body.credential_id, "credential_id")?,
        authenticator_data: required(body.authenticator_data, "authenticatorData")?,
        client_data_json: required(body.client_data_json, "clientDataJSON")?,
        signature: required(body.signature, "signature")?,
    };
    let usecase = LoginUseCase {
        users: state.user_repo(),
        relying_party: state.relying_party.clone(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase.execute(input).await?;
    Ok(Json(LoginResponse {
        success: true,
        token: out.token,
        user_id: out.user_id,
    }))
}
