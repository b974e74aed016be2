//! Cookie Codec
//!
//! Turns a [`CookiePayload`] into a tamper-evident cookie value and back.
//!
//! ## Token format
//! `b64(field_1).b64(field_2)...b64(field_n).b64(mac)` where every segment is
//! unpadded base64url (so `.` never appears inside a segment) and
//! `mac = HMAC-SHA256(secret, purpose || "|" || encoded_fields)`.
//!
//! Payloads are signed, not encrypted: email, expiry, nonce and redirect
//! target are readable by the client but cannot be altered.

use chrono::{DateTime, Utc};
use platform::crypto::{Secret, from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};
use thiserror::Error;

use crate::domain::payload::CookiePayload;

const SEGMENT_DELIMITER: char = '.';

/// Why a cookie value was not accepted
///
/// Callers map every variant to the same client-visible response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("cookie missing")]
    Missing,

    #[error("cookie malformed")]
    Malformed,

    #[error("cookie signature mismatch")]
    Tampered,

    #[error("cookie expired")]
    Expired,
}

/// Signs and verifies cookie payloads with the process secret
#[derive(Debug, Clone)]
pub struct CookieCodec {
    secret: Secret,
}

impl CookieCodec {
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    /// Encode and sign a payload
    pub fn sign<P: CookiePayload>(&self, payload: &P) -> String {
        let encoded = payload
            .to_fields()
            .iter()
            .map(|field| to_base64url(field.as_bytes()))
            .collect::<Vec<_>>()
            .join(".");

        let mac = hmac_sha256(self.secret.expose(), &mac_input(P::PURPOSE, &encoded));
        format!("{}{}{}", encoded, SEGMENT_DELIMITER, to_base64url(&mac))
    }

    /// Verify a token against the current time
    pub fn verify<P: CookiePayload>(&self, token: &str) -> Result<P, CookieError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`
    ///
    /// Checks run in order: shape, MAC, field decoding, expiry. A payload is
    /// expired once `now` is strictly past its expiry second.
    pub fn verify_at<P: CookiePayload>(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<P, CookieError> {
        let (encoded, mac_b64) = token
            .rsplit_once(SEGMENT_DELIMITER)
            .ok_or(CookieError::Malformed)?;

        let segments: Vec<&str> = encoded.split(SEGMENT_DELIMITER).collect();
        if segments.len() != P::FIELD_COUNT {
            return Err(CookieError::Malformed);
        }

        let mac = from_base64url(mac_b64).map_err(|_| CookieError::Malformed)?;
        if !verify_hmac_sha256(self.secret.expose(), &mac_input(P::PURPOSE, encoded), &mac) {
            return Err(CookieError::Tampered);
        }

        let fields = segments
            .into_iter()
            .map(decode_field)
            .collect::<Result<Vec<_>, _>>()?;
        let payload = P::from_fields(fields)?;

        if now.timestamp() > payload.expires_at_secs() {
            return Err(CookieError::Expired);
        }

        Ok(payload)
    }
}

fn mac_input(purpose: &str, encoded: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(purpose.len() + 1 + encoded.len());
    input.extend_from_slice(purpose.as_bytes());
    input.push(b'|');
    input.extend_from_slice(encoded.as_bytes());
    input
}

fn decode_field(segment: &str) -> Result<String, CookieError> {
    let bytes = from_base64url(segment).map_err(|_| CookieError::Malformed)?;
    String::from_utf8(bytes).map_err(|_| CookieError::Malformed)
}
