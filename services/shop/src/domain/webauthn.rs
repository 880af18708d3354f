//! Credential keys and login assertion verification.
//!
//! Signup stores a single ES256 (P-256) or RS256 (RSA PKCS#1 v1.5) public key
//! per user. Login checks a `webauthn.get` assertion against it: client data,
//! relying-party hash, flags, then the signature over
//! `authenticatorData ‖ SHA-256(clientDataJSON)`.

use std::collections::BTreeMap;

use minicbor::Decoder;
use minicbor::data::Type;
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use rand::RngExt;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::{Origin, Url};

use echosavvy_domain::credential::{EncodingError, decode_base64_lenient, encode_base64url};

const RP_NAME: &str = "EchoSavvy";
const CEREMONY_GET: &str = "webauthn.get";
/// Ceremony timeout advertised to the client, in milliseconds.
const CEREMONY_TIMEOUT_MS: u32 = 60_000;

const FLAG_USER_PRESENT: u8 = 0x01;
const FLAG_ATTESTED_CREDENTIAL_DATA: u8 = 0x40;

/// rpIdHash (32) + flags (1) + signCount (4).
const AUTH_DATA_MIN_LEN: usize = 37;
/// Offset of the credential id length in attested credential data (after the AAGUID).
const CREDENTIAL_ID_LEN_OFFSET: usize = 53;

const COSE_KTY_EC2: i64 = 2;
const COSE_KTY_RSA: i64 = 3;
const COSE_ALG_ES256: i64 = -7;
const COSE_ALG_RS256: i64 = -257;
const COSE_CRV_P256: i64 = 1;

/// Smallest RSA modulus accepted, in bytes (2048 bits).
const RSA_MIN_MODULUS_LEN: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("malformed attestation object")]
    Cbor(#[from] minicbor::decode::Error),
    #[error("unsupported key format")]
    Unsupported,
    #[error("invalid public key")]
    InvalidKey,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssertionError {
    #[error("client data is not valid JSON")]
    ClientData,
    #[error("unexpected ceremony type {0:?}")]
    CeremonyType(String),
    #[error("challenge mismatch")]
    Challenge,
    #[error("origin {0:?} not allowed")]
    Origin(String),
    #[error("authenticator data too short")]
    AuthenticatorData,
    #[error("relying party id hash mismatch")]
    RpIdHash,
    #[error("user presence flag not set")]
    UserNotPresent,
    #[error("signature is not DER encoded")]
    SignatureEncoding,
    #[error("signature does not verify")]
    Signature,
}

/// A user's credential public key.
#[derive(Debug, Clone)]
pub enum CredentialPublicKey {
    Es256(VerifyingKey),
    Rs256(RsaPublicKey),
}

impl CredentialPublicKey {
    /// Accept what the frontend sends at signup: the SPKI DER returned by
    /// `getPublicKey()`, or the raw attestation object when that is unavailable.
    pub fn from_registration(value: &str) -> Result<Self, KeyError> {
        let bytes = decode_base64_lenient(value)?;
        match Self::from_spki(&bytes) {
            Ok(key) => Ok(key),
            Err(KeyError::Unsupported) => key_from_attestation_object(&bytes),
            Err(e) => Err(e),
        }
    }

    /// Load a key persisted by [`Self::to_base64url`].
    pub fn from_stored(value: &str) -> Result<Self, KeyError> {
        Self::from_spki(&decode_base64_lenient(value)?)
    }

    fn from_spki(der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(key) = VerifyingKey::from_public_key_der(der) {
            return Ok(Self::Es256(key));
        }
        match RsaPublicKey::from_public_key_der(der) {
            Ok(key) => Self::rsa(key),
            Err(_) => Err(KeyError::Unsupported),
        }
    }

    fn rsa(key: RsaPublicKey) -> Result<Self, KeyError> {
        if key.size() < RSA_MIN_MODULUS_LEN {
            return Err(KeyError::InvalidKey);
        }
        Ok(Self::Rs256(key))
    }

    /// COSE algorithm identifier of this key.
    pub fn algorithm(&self) -> i64 {
        match self {
            Self::Es256(_) => COSE_ALG_ES256,
            Self::Rs256(_) => COSE_ALG_RS256,
        }
    }

    /// SPKI DER, base64url.
    pub fn to_base64url(&self) -> Result<String, KeyError> {
        let der = match self {
            Self::Es256(key) => key.to_public_key_der(),
            Self::Rs256(key) => key.to_public_key_der(),
        }
        .map_err(|_| KeyError::InvalidKey)?;
        Ok(encode_base64url(der.as_bytes()))
    }

    fn verify_signature(&self, message: &[u8], signature: &[u8]) -> Result<(), AssertionError> {
        match self {
            Self::Es256(key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| AssertionError::SignatureEncoding)?;
                p256::ecdsa::signature::Verifier::verify(key, message, &signature)
            }
            Self::Rs256(key) => {
                let signature = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| AssertionError::SignatureEncoding)?;
                let key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone());
                rsa::signature::Verifier::verify(&key, message, &signature)
            }
        }
        .map_err(|_| AssertionError::Signature)
    }
}

fn key_from_attestation_object(bytes: &[u8]) -> Result<CredentialPublicKey, KeyError> {
    // https://www.w3.org/TR/webauthn-2/#sctn-attestation
    let mut decoder = Decoder::new(bytes);
    let entries = decoder.map()?.ok_or(KeyError::Unsupported)?;

    let mut auth_data = None;
    for _ in 0..entries {
        if decoder.str()? == "authData" {
            auth_data = Some(decoder.bytes()?);
        } else {
            decoder.skip()?;
        }
    }
    let auth_data = auth_data.ok_or(KeyError::Unsupported)?;

    if auth_data.len() < CREDENTIAL_ID_LEN_OFFSET + 2
        || auth_data[32] & FLAG_ATTESTED_CREDENTIAL_DATA == 0
    {
        return Err(KeyError::Unsupported);
    }
    let id_len = u16::from_be_bytes([
        auth_data[CREDENTIAL_ID_LEN_OFFSET],
        auth_data[CREDENTIAL_ID_LEN_OFFSET + 1],
    ]) as usize;
    let cose_key = auth_data
        .get(CREDENTIAL_ID_LEN_OFFSET + 2 + id_len..)
        .ok_or(KeyError::Unsupported)?;
    key_from_cose(cose_key)
}

fn key_from_cose(bytes: &[u8]) -> Result<CredentialPublicKey, KeyError> {
    // EC2: https://www.rfc-editor.org/rfc/rfc9053.html#section-7.1.1
    // RSA: https://www.rfc-editor.org/rfc/rfc8230.html#section-4
    let mut decoder = Decoder::new(bytes);
    let entries = decoder.map()?.ok_or(KeyError::Unsupported)?;

    // Parameter -1 is an integer (crv) for EC2 but a byte string (n) for RSA.
    let mut ints = BTreeMap::new();
    let mut byte_params = BTreeMap::new();
    for _ in 0..entries {
        let label = decoder.i64()?;
        match decoder.datatype()? {
            Type::Bytes => {
                byte_params.insert(label, decoder.bytes()?);
            }
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64 => {
                ints.insert(label, decoder.i64()?);
            }
            _ => decoder.skip()?,
        }
    }

    match (ints.get(&1).copied(), ints.get(&3).copied()) {
        (Some(COSE_KTY_EC2), Some(COSE_ALG_ES256)) => {
            if ints.get(&-1).copied() != Some(COSE_CRV_P256) {
                return Err(KeyError::Unsupported);
            }
            let (x, y) = byte_params
                .get(&-2)
                .zip(byte_params.get(&-3))
                .ok_or(KeyError::Unsupported)?;
            if x.len() != 32 || y.len() != 32 {
                return Err(KeyError::InvalidKey);
            }
            let mut sec1 = Vec::with_capacity(65);
            sec1.push(0x04);
            sec1.extend_from_slice(x);
            sec1.extend_from_slice(y);
            VerifyingKey::from_sec1_bytes(&sec1)
                .map(CredentialPublicKey::Es256)
                .map_err(|_| KeyError::InvalidKey)
        }
        (Some(COSE_KTY_RSA), Some(COSE_ALG_RS256)) => {
            let (n, e) = byte_params
                .get(&-1)
                .zip(byte_params.get(&-2))
                .ok_or(KeyError::Unsupported)?;
            let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))
                .map_err(|_| KeyError::InvalidKey)?;
            CredentialPublicKey::rsa(key)
        }
        _ => Err(KeyError::Unsupported),
    }
}

/// Decoded `AuthenticatorAssertionResponse`.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Assertion {
    /// Decode the three base64 fields (either alphabet).
    pub fn decode(
        authenticator_data: &str,
        client_data_json: &str,
        signature: &str,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            authenticator_data: decode_base64_lenient(authenticator_data)?,
            client_data_json: decode_base64_lenient(client_data_json)?,
            signature: decode_base64_lenient(signature)?,
        })
    }
}

#[derive(Deserialize)]
struct CollectedClientData {
    #[serde(rename = "type")]
    ceremony: String,
    challenge: String,
    origin: String,
}

/// Creation parameters returned by `register-challenge`, shaped for
/// `navigator.credentials.create({ publicKey })` once the base64url fields are
/// decoded to buffers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub challenge: String,
    pub rp: RelyingPartyEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserEntity>,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    pub authenticator_selection: AuthenticatorSelection,
    pub timeout: u32,
    pub attestation: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RelyingPartyEntity {
    pub id: String,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Random user handle, base64url.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub alg: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub user_verification: &'static str,
    pub resident_key: &'static str,
}

/// 32 random bytes, base64url.
pub fn new_challenge() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    encode_base64url(&bytes)
}

fn new_user_handle() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    encode_base64url(&bytes)
}

/// The relying party this service acts as.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    id: String,
    origins: Vec<Origin>,
}

impl RelyingParty {
    pub fn new<S: AsRef<str>>(id: impl Into<String>, origins: &[S]) -> Result<Self, url::ParseError> {
        let origins = origins
            .iter()
            .map(|origin| Url::parse(origin.as_ref()).map(|url| url.origin()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: id.into(),
            origins,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn registration_options(
        &self,
        challenge: &str,
        username: Option<&str>,
    ) -> RegistrationOptions {
        RegistrationOptions {
            challenge: challenge.to_owned(),
            rp: RelyingPartyEntity {
                id: self.id.clone(),
                name: RP_NAME,
            },
            user: username.map(|name| UserEntity {
                id: new_user_handle(),
                name: name.to_owned(),
                display_name: name.to_owned(),
            }),
            pub_key_cred_params: [COSE_ALG_ES256, COSE_ALG_RS256]
                .into_iter()
                .map(|alg| CredentialParameter {
                    kind: "public-key",
                    alg,
                })
                .collect(),
            authenticator_selection: AuthenticatorSelection {
                user_verification: "required",
                resident_key: "required",
            },
            timeout: CEREMONY_TIMEOUT_MS,
            attestation: "none",
        }
    }

    /// Verify a login assertion for `expected_challenge`.
    pub fn verify(
        &self,
        key: &CredentialPublicKey,
        assertion: &Assertion,
        expected_challenge: &str,
    ) -> Result<(), AssertionError> {
        let client: CollectedClientData = serde_json::from_slice(&assertion.client_data_json)
            .map_err(|_| AssertionError::ClientData)?;

        if client.ceremony != CEREMONY_GET {
            return Err(AssertionError::CeremonyType(client.ceremony));
        }
        if !same_challenge(&client.challenge, expected_challenge) {
            return Err(AssertionError::Challenge);
        }
        let allowed = Url::parse(&client.origin)
            .map(|url| self.origins.contains(&url.origin()))
            .unwrap_or(false);
        if !allowed {
            return Err(AssertionError::Origin(client.origin));
        }

        let auth_data = &assertion.authenticator_data;
        if auth_data.len() < AUTH_DATA_MIN_LEN {
            return Err(AssertionError::AuthenticatorData);
        }
        if auth_data[..32] != Sha256::digest(self.id.as_bytes())[..] {
            return Err(AssertionError::RpIdHash);
        }
        if auth_data[32] & FLAG_USER_PRESENT == 0 {
            return Err(AssertionError::UserNotPresent);
        }

        let mut message = auth_data.clone();
        message.extend_from_slice(&Sha256::digest(&assertion.client_data_json));
        key.verify_signature(&message, &assertion.signature)
    }
}

fn same_challenge(received: &str, expected: &str) -> bool {
    match (
        decode_base64_lenient(received),
        decode_base64_lenient(expected),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
