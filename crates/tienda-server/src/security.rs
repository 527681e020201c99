// SPDX-License-Identifier: Apache-2.0

//! Password hashing (PBKDF2-HMAC-SHA256) and HS256 bearer tokens.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use subtle::ConstantTimeEq;
use tienda_model::User;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecurityError {
    MalformedToken,
    UnsupportedAlgorithm(String),
    BadSignature,
    Expired,
    MissingSubject,
    InvalidKey,
    Encoding(String),
}

impl Display for SecurityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported token algorithm: {alg}"),
            Self::BadSignature => write!(f, "token signature mismatch"),
            Self::Expired => write!(f, "token expired"),
            Self::MissingSubject => write!(f, "token has no subject"),
            Self::InvalidKey => write!(f, "invalid signing key"),
            Self::Encoding(msg) => write!(f, "token encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for SecurityError {}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_BYTES] {
    let mut out = [0_u8; HASH_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hashes a password with a fresh random salt. The result is self-describing:
/// `pbkdf2-sha256$<iterations>$<salt>$<hash>`.
#[must_use]
pub fn hash_password(password: &str, iterations: u32) -> String {
    let mut salt = [0_u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);
    let hash = derive(password, &salt, iterations);
    format!(
        "{HASH_SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    )
}

/// Constant-time check of a password against a stored hash. Unparseable
/// hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(HASH_SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(expected))
    else {
        return false;
    };
    if iterations == 0 || expected.len() != HASH_BYTES {
        return false;
    }
    let actual = derive(password, &salt, iterations);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub id: i64,
    pub is_admin: bool,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies HS256 JWTs with a single shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(key: Vec<u8>, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    fn mac(&self, signing_input: &str) -> Result<Hmac<Sha256>, SecurityError> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.key).map_err(|_| SecurityError::InvalidKey)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, SecurityError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user.email.as_str().to_string(),
            id: user.id.get(),
            is_admin: user.is_admin,
            exp: now.timestamp().saturating_add(ttl),
        };
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, SecurityError> {
        let payload =
            serde_json::to_vec(claims).map_err(|e| SecurityError::Encoding(e.to_string()))?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.mac(&signing_input)?.finalize().into_bytes();
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, SecurityError> {
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or(SecurityError::MalformedToken)?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or(SecurityError::MalformedToken)?;
        if payload.contains('.') {
            return Err(SecurityError::MalformedToken);
        }
        let header: Header = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(SecurityError::MalformedToken)?;
        if header.alg != "HS256" {
            return Err(SecurityError::UnsupportedAlgorithm(header.alg));
        }
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SecurityError::MalformedToken)?;
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| SecurityError::BadSignature)?;
        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(SecurityError::MalformedToken)?;
        if claims.exp <= now.timestamp() {
            return Err(SecurityError::Expired);
        }
        if claims.sub.trim().is_empty() {
            return Err(SecurityError::MissingSubject);
        }
        Ok(claims)
    }
}
