//! Alist download signatures
//!
//! `sign = base64url(HMAC-SHA256(secret, "{path}:{expiry}")) + ":" + expiry`.
//! An expiry of `0` produces a link that never times out.

use std::fmt;

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use sha2::Sha256;

use super::error::AlistError;

type HmacSha256 = Hmac<Sha256>;

/// Characters escaped when a storage path is placed in a URL. `/` is kept.
const PATH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Signature over a storage path and expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrlToken {
    pub path: String,
    pub expiry: i64,
    pub signature: String,
}

impl SignedUrlToken {
    /// Sign `path` with `secret`.
    pub fn sign(secret: &str, path: &str, expiry: i64) -> Result<Self, AlistError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AlistError::Signing(e.to_string()))?;
        mac.update(format!("{path}:{expiry}").as_bytes());
        let signature = base64::engine::general_purpose::URL_SAFE.encode(mac.finalize().into_bytes());

        Ok(Self {
            path: path.to_string(),
            expiry,
            signature,
        })
    }
}

/// Value of the `sign` query parameter.
impl fmt::Display for SignedUrlToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.signature, self.expiry)
    }
}

/// Build `/d{path}?sign={token}` for a storage-relative path.
#[must_use]
pub fn download_path(path: &str, token: &SignedUrlToken) -> String {
    format!("/d{}?sign={}", utf8_percent_encode(path, PATH_ENCODE_SET), token)
}
