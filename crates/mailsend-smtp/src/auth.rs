//! SASL responses for SMTP `AUTH`.
//!
//! Implements:
//! - PLAIN (RFC 4616) - credentials in a single initial response
//! - LOGIN - username and password answered to two 334 prompts
//! - CRAM-MD5 (RFC 2195) - HMAC-MD5 keyed digest over a server challenge

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;

use crate::error::{Error, Result};

type HmacMd5 = Hmac<Md5>;

/// Generates the PLAIN initial response.
///
/// Format: `\0<username>\0<password>` (base64 encoded). The empty
/// authorization identity means "act as the authenticated user".
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    let auth_string = format!("\0{username}\0{password}");
    STANDARD.encode(auth_string.as_bytes())
}

/// Encodes one LOGIN answer (the username or the password).
#[must_use]
pub fn login_response(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Answers a CRAM-MD5 challenge.
///
/// `challenge` is the base64 text of the 334 reply. The answer is
/// `base64("<username> <hex hmac-md5(password, challenge)>")`.
///
/// # Errors
///
/// Returns an error if the challenge is not valid base64.
pub fn cram_md5_response(username: &str, password: &str, challenge: &str) -> Result<String> {
    let challenge = STANDARD
        .decode(challenge.trim())
        .map_err(|e| Error::Protocol(format!("Invalid CRAM-MD5 challenge: {e}")))?;

    let digest = cram_md5_digest(password, &challenge)?;
    Ok(STANDARD.encode(format!("{username} {digest}")))
}

/// Computes the lowercase hex HMAC-MD5 digest used by CRAM-MD5.
///
/// # Errors
///
/// Returns an error if the key is rejected by the HMAC implementation.
pub fn cram_md5_digest(password: &str, challenge: &[u8]) -> Result<String> {
    let mut mac = HmacMd5::new_from_slice(password.as_bytes())
        .map_err(|e| Error::Protocol(format!("Invalid CRAM-MD5 key: {e}")))?;
    mac.update(challenge);
    Ok(hex::encode(mac.finalize().into_bytes()))
}
