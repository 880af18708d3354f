//! Software ES256 / RS256 authenticator.
//!
//! Produces the same artifacts a platform authenticator hands the frontend: an
//! SPKI public key (or a `none`-format attestation object) at signup, and a signed
//! assertion at login. Keys are fixed (a seeded P-256 scalar, or a bundled RSA
//! 2048 key) so test failures are reproducible.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use minicbor::Encoder;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::EncodePublicKey;
use rsa::RsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use sha2::{Digest, Sha256};

use echosavvy_domain::credential::encode_base64url;

/// Flags byte: user present (0x01) | user verified (0x04).
pub const FLAGS_UP_UV: u8 = 0x05;
/// Flags byte for attested credential data (0x40) on top of UP | UV.
const FLAGS_ATTESTED: u8 = 0x45;

pub const TEST_RP_ID: &str = "localhost";
pub const TEST_ORIGIN: &str = "http://localhost:5173";

const RS256_TEST_KEY_PEM: &str = include_str!("rs256_test_key.pem");

/// Base64 fields of a login assertion, as the frontend posts them.
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    pub authenticator_data: String,
    pub client_data_json: String,
    pub signature: String,
}

impl SignedAssertion {
    /// Login request body for `username` presenting `credential_id`.
    pub fn login_body(&self, username: &str, credential_id: &str) -> serde_json::Value {
        serde_json::json!({
            "username": username,
            "credential_id": credential_id,
            "authenticatorData": self.authenticator_data,
            "clientDataJSON": self.client_data_json,
            "signature": self.signature,
        })
    }
}

enum TestKey {
    Es256(SigningKey),
    Rs256(Box<RsaPrivateKey>),
}

pub struct TestAuthenticator {
    key: TestKey,
    credential_id: Vec<u8>,
    pub flags: u8,
    pub sign_count: u32,
}

impl TestAuthenticator {
    /// Deterministic authenticator; different seeds give different keys.
    pub fn new(seed: u8) -> Self {
        let key = SigningKey::from_slice(&[seed.max(1); 32]).expect("valid scalar");
        Self::with_key(TestKey::Es256(key), seed)
    }

    /// RS256 authenticator, as Windows Hello typically registers.
    pub fn rs256() -> Self {
        let key = RsaPrivateKey::from_pkcs8_pem(RS256_TEST_KEY_PEM).expect("bundled rsa key");
        Self::with_key(TestKey::Rs256(Box::new(key)), 0xa5)
    }

    fn with_key(key: TestKey, seed: u8) -> Self {
        Self {
            key,
            credential_id: vec![seed, 0xfb, 0xff, 0x10, 0x20, 0x30, 0x40, 0x50],
            flags: FLAGS_UP_UV,
            sign_count: 1,
        }
    }

    /// Credential id as `PublicKeyCredential.id` spells it (base64url).
    pub fn credential_id(&self) -> String {
        encode_base64url(&self.credential_id)
    }

    /// Credential id as a client that encodes `rawId` itself spells it.
    pub fn credential_id_standard(&self) -> String {
        STANDARD.encode(&self.credential_id)
    }

    /// `AuthenticatorAttestationResponse.getPublicKey()`, base64url.
    pub fn public_key_spki(&self) -> String {
        let der = match &self.key {
            TestKey::Es256(key) => key.verifying_key().to_public_key_der(),
            TestKey::Rs256(key) => key.to_public_key().to_public_key_der(),
        }
        .expect("encode spki");
        encode_base64url(der.as_bytes())
    }

    /// A `none`-format attestation object carrying the COSE public key, base64url.
    pub fn attestation_object(&self, rp_id: &str) -> String {
        let cose = self.cose_key();

        let mut auth_data = self.authenticator_data(rp_id, FLAGS_ATTESTED);
        auth_data.extend_from_slice(&[0u8; 16]);
        auth_data.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
        auth_data.extend_from_slice(&self.credential_id);
        auth_data.extend_from_slice(&cose);

        let mut att = Encoder::new(Vec::new());
        att.map(3)
            .and_then(|e| e.str("fmt")?.str("none")?.str("attStmt")?.map(0))
            .and_then(|e| e.str("authData")?.bytes(&auth_data))
            .expect("encode attestation object");
        encode_base64url(&att.into_writer())
    }

    fn cose_key(&self) -> Vec<u8> {
        let mut cose = Encoder::new(Vec::new());
        match &self.key {
            TestKey::Es256(key) => {
                let point = key.verifying_key().to_encoded_point(false);
                let x = point.x().expect("uncompressed x");
                let y = point.y().expect("uncompressed y");
                cose.map(5)
                    .and_then(|e| e.i8(1)?.i8(2)?.i8(3)?.i8(-7)?.i8(-1)?.i8(1))
                    .and_then(|e| e.i8(-2)?.bytes(x)?.i8(-3)?.bytes(y))
                    .expect("encode cose key");
            }
            TestKey::Rs256(key) => {
                let n = key.n().to_bytes_be();
                let e = key.e().to_bytes_be();
                cose.map(4)
                    .and_then(|c| c.i8(1)?.i8(3)?.i8(3)?.i16(-257))
                    .and_then(|c| c.i8(-1)?.bytes(&n)?.i8(-2)?.bytes(&e))
                    .expect("encode cose key");
            }
        }
        cose.into_writer()
    }

    /// Sign a `webauthn.get` ceremony for `challenge`.
    pub fn assert(&self, challenge: &str, origin: &str, rp_id: &str) -> SignedAssertion {
        self.assert_with_type("webauthn.get", challenge, origin, rp_id)
    }

    pub fn assert_with_type(
        &self,
        ceremony: &str,
        challenge: &str,
        origin: &str,
        rp_id: &str,
    ) -> SignedAssertion {
        let client_data = serde_json::json!({
            "type": ceremony,
            "challenge": challenge,
            "origin": origin,
            "crossOrigin": false,
        })
        .to_string()
        .into_bytes();
        let auth_data = self.authenticator_data(rp_id, self.flags);

        let mut signed = auth_data.clone();
        signed.extend_from_slice(&Sha256::digest(&client_data));
        let signature = match &self.key {
            TestKey::Es256(key) => {
                let signature: Signature = key.sign(&signed);
                signature.to_der().as_bytes().to_vec()
            }
            TestKey::Rs256(key) => {
                let key = rsa::pkcs1v15::SigningKey::<Sha256>::new((**key).clone());
                let signature = rsa::signature::Signer::sign(&key, &signed);
                rsa::signature::SignatureEncoding::to_vec(&signature)
            }
        };

        SignedAssertion {
            authenticator_data: STANDARD.encode(&auth_data),
            client_data_json: STANDARD.encode(&client_data),
            signature: STANDARD.encode(signature),
        }
    }

    fn authenticator_data(&self, rp_id: &str, flags: u8) -> Vec<u8> {
        let mut data = Sha256::digest(rp_id.as_bytes()).to_vec();
        data.push(flags);
        data.extend_from_slice(&self.sign_count.to_be_bytes());
        data
    }
}
