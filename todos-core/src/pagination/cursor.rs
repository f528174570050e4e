//! Signed, opaque pagination cursors.
//!
//! A cursor identifies the last item of a page by its `(created_at, id)` pair.
//! On the wire it is `<payload>.<tag>` where `payload` is the url-safe base64
//! encoding of `{"datetime": <RFC3339>, "id": <int>}` and `tag` is the url-safe
//! base64 encoding of `HMAC-SHA256(secret, payload)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor must consist of a payload and a signature separated by '.'")]
    InvalidFormat,

    #[error("cursor signature does not match")]
    InvalidSignature,

    #[error("cursor payload is malformed: {0}")]
    Malformed(String),
}

/// The decoded content of a cursor: the sort key of the last item on a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CursorPosition {
    pub datetime: String,
    pub id: i64,
}

impl CursorPosition {
    /// Parse the boundary timestamp. Only RFC3339 is accepted.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, CursorError> {
        DateTime::parse_from_rfc3339(&self.datetime)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CursorError::Malformed(format!("invalid datetime: {e}")))
    }
}

/// Render a timestamp the way it is stored and embedded in cursors.
///
/// The output is fixed width (microsecond precision, `Z` suffix), so plain
/// string comparison orders timestamps chronologically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Encodes and verifies cursors with a process-wide secret.
///
/// Rotating the secret invalidates every outstanding cursor.
#[derive(Clone)]
pub struct CursorCodec {
    secret: Vec<u8>,
}

impl std::fmt::Debug for CursorCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorCodec")
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl CursorCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn encode(&self, datetime: &str, id: i64) -> String {
        let json = serde_json::json!({ "datetime": datetime, "id": id }).to_string();
        let payload = URL_SAFE_NO_PAD.encode(json.as_bytes());
        let tag = self.sign(&payload);
        format!("{payload}{SEPARATOR}{tag}")
    }

    /// Convenience for minting a cursor straight from a row's sort key.
    pub fn encode_position(&self, created_at: &DateTime<Utc>, id: i64) -> String {
        self.encode(&format_timestamp(created_at), id)
    }

    pub fn decode(&self, token: &str) -> Result<CursorPosition, CursorError> {
        let parts: Vec<&str> = token.split(SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(CursorError::InvalidFormat);
        }
        let (payload, tag) = (parts[0], parts[1]);

        let expected = self.sign(payload);
        if !bool::from(expected.as_bytes().ct_eq(tag.as_bytes())) {
            return Err(CursorError::InvalidSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| CursorError::Malformed(format!("invalid base64: {e}")))?;
        let position: CursorPosition = serde_json::from_slice(&json)
            .map_err(|e| CursorError::Malformed(format!("invalid json: {e}")))?;

        if position.id <= 0 {
            return Err(CursorError::Malformed(format!(
                "id must be positive, got {}",
                position.id
            )));
        }

        Ok(position)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec() -> CursorCodec {
        CursorCodec::new("test-cursor-secret")
    }

    #[test]
    fn test_encode_decode_preserves_position() {
        let codec = codec();
        let token = codec.encode("2024-03-01T10:15:00.000000Z", 42);
        let position = codec.decode(&token).unwrap();

        assert_eq!(position.datetime, "2024-03-01T10:15:00.000000Z");
        assert_eq!(position.id, 42);
    }

    #[test]
    fn test_token_uses_url_safe_alphabet_and_single_separator() {
        let token = codec().encode("2024-03-01T10:15:00+02:00", i64::MAX);

        assert_eq!(token.matches('.').count(), 1);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));
    }

    #[test]
    fn test_tampered_tag_is_rejected() {
        let codec = codec();
        let token = codec.encode("2024-03-01T10:15:00.000000Z", 7);
        let (payload, tag) = token.split_once('.').unwrap();

        let mut tag_bytes = tag.as_bytes().to_vec();
        tag_bytes[0] = if tag_bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{payload}.{}", String::from_utf8(tag_bytes).unwrap());

        assert_eq!(codec.decode(&tampered), Err(CursorError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.encode("2024-03-01T10:15:00.000000Z", 7);
        let (_, tag) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"datetime":"2099-01-01T00:00:00Z","id":1}"#);

        assert_eq!(
            codec.decode(&format!("{forged_payload}.{tag}")),
            Err(CursorError::InvalidSignature)
        );
    }

    #[test]
    fn test_separator_count_is_enforced() {
        let codec = codec();
        let token = codec.encode("2024-03-01T10:15:00.000000Z", 7);

        assert_eq!(codec.decode("invalid-cursor"), Err(CursorError::InvalidFormat));
        assert_eq!(codec.decode(""), Err(CursorError::InvalidFormat));
        assert_eq!(
            codec.decode(&format!("{token}.extra")),
            Err(CursorError::InvalidFormat)
        );
    }

    #[test]
    fn test_other_secret_cannot_verify() {
        let token = codec().encode("2024-03-01T10:15:00.000000Z", 7);
        let other = CursorCodec::new("rotated-secret");

        assert_eq!(other.decode(&token), Err(CursorError::InvalidSignature));
    }

    #[test]
    fn test_signed_garbage_is_malformed() {
        let codec = codec();

        let not_base64 = "***";
        let token = format!("{not_base64}.{}", codec.sign(not_base64));
        assert!(matches!(codec.decode(&token), Err(CursorError::Malformed(_))));

        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        let token = format!("{not_json}.{}", codec.sign(&not_json));
        assert!(matches!(codec.decode(&token), Err(CursorError::Malformed(_))));

        let negative = URL_SAFE_NO_PAD.encode(br#"{"datetime":"2024-03-01T10:15:00Z","id":-3}"#);
        let token = format!("{negative}.{}", codec.sign(&negative));
        assert!(matches!(codec.decode(&token), Err(CursorError::Malformed(_))));
    }

    #[test]
    fn test_position_timestamp_requires_rfc3339() {
        let codec = codec();

        let ok = codec.decode(&codec.encode("2024-03-01T10:15:00+02:00", 3)).unwrap();
        assert_eq!(
            ok.timestamp().unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap()
        );

        let bad = codec.decode(&codec.encode("yesterday", 3)).unwrap();
        assert!(matches!(bad.timestamp(), Err(CursorError::Malformed(_))));
    }

    #[test]
    fn test_format_timestamp_is_fixed_width_and_sortable() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1500);

        let a = format_timestamp(&earlier);
        let b = format_timestamp(&later);

        assert_eq!(a, "2024-01-01T00:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&b).unwrap(), later);
    }
}
