//! Signed session cookie
//!
//! The CMS token is stored as `<token>.<signature>` where the signature is
//! the unpadded base64url HMAC-SHA256 of the token. A cookie whose signature
//! does not verify is treated as absent.

use axum::http::{header, HeaderMap, HeaderValue};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::SessionConfig;

type HmacSha256 = Hmac<Sha256>;

/// Issues, reads and clears the session cookie
#[derive(Clone)]
pub struct SessionCookie {
    name: String,
    mac: HmacSha256,
    max_age_secs: u64,
    secure: bool,
}

impl SessionCookie {
    pub fn new(
        name: impl Into<String>,
        secret: &[u8],
        max_age_secs: u64,
        secure: bool,
    ) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;
        Ok(Self {
            name: name.into(),
            mac,
            max_age_secs,
            secure,
        })
    }

    /// Build from configuration, generating a per-process secret if none is set
    pub fn from_config(config: &SessionConfig) -> anyhow::Result<Self> {
        let secret = match config.secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!(
                    "No session secret configured; sessions will not survive a restart"
                );
                ephemeral_secret()
            }
        };
        Self::new(&config.cookie_name, &secret, config.max_age_secs, config.secure)
    }

    fn signature(&self, token: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Cookie value for a token
    pub fn sign(&self, token: &str) -> String {
        format!("{}.{}", token, BASE64URL_NOPAD.encode(&self.signature(token)))
    }

    /// Token carried by a cookie value, if the signature verifies
    pub fn verify(&self, value: &str) -> Option<String> {
        let (token, signature) = value.rsplit_once('.')?;
        if token.is_empty() {
            return None;
        }
        let signature = BASE64URL_NOPAD.decode(signature.as_bytes()).ok()?;

        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(token.to_string())
    }

    /// Verified token from the request's `Cookie` headers
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == self.name)
            .find_map(|(_, value)| self.verify(value))
    }

    /// `Set-Cookie` value storing `token`
    pub fn issue(&self, token: &str) -> Option<HeaderValue> {
        self.header(&self.sign(token), self.max_age_secs)
    }

    /// `Set-Cookie` value removing the session
    pub fn clear(&self) -> Option<HeaderValue> {
        self.header("", 0)
    }

    fn header(&self, value: &str, max_age: u64) -> Option<HeaderValue> {
        let secure = if self.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{}={}; HttpOnly{}; SameSite=Strict; Path=/; Max-Age={}",
            self.name, value, secure, max_age
        );
        HeaderValue::from_str(&cookie).ok()
    }
}

fn ephemeral_secret() -> Vec<u8> {
    let mut secret = Uuid::new_v4().as_bytes().to_vec();
    secret.extend_from_slice(Uuid::new_v4().as_bytes());
    secret
}
