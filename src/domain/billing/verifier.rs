//! Billing webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"` with constant-time comparison
//! and a timestamp freshness window to block replayed deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::BillingEvent;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<hex signature>`. Unknown keys are ignored
    /// for forward compatibility.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MalformedSignatureHeader` if the header format
    /// is invalid. An unparseable header is a signature-gate failure (400),
    /// never a payload failure.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                WebhookError::MalformedSignatureHeader("invalid header format".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedSignatureHeader("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::MalformedSignatureHeader(
                            "invalid v1 signature hex".to_string(),
                        )
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            WebhookError::MalformedSignatureHeader("missing timestamp".to_string())
        })?;
        let v1_signature = v1_signature.ok_or_else(|| {
            WebhookError::MalformedSignatureHeader("missing v1 signature".to_string())
        })?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Verifier for billing webhook signatures.
pub struct WebhookVerifier {
    /// The signing secret shared with the billing provider.
    secret: String,
}

impl WebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// Steps: parse the header, check the timestamp window, recompute the
    /// HMAC over the raw body, compare in constant time, and only then
    /// deserialize the payload. The raw body bytes are signed, so they must
    /// not be re-serialized or trimmed before this call.
    ///
    /// # Errors
    ///
    /// - `MalformedSignatureHeader` - unparseable signature header
    /// - `TimestampOutOfRange` - outside the freshness window
    /// - `InvalidSignature` - HMAC mismatch
    /// - `ParseError` - payload fails to deserialize after verification
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<BillingEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected_signature = self.compute_signature(header.timestamp, payload);
        if !constant_time_compare(&expected_signature, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: BillingEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        // Future-dated beyond clock skew tolerance
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the given timestamp and payload.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a valid hex signature for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_timestamp_and_v1() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={}", signature);

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={},v2=future,scheme=hmac", signature);

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let signature = "a".repeat(64);
        let result = SignatureHeader::parse(&format!("v1={}", signature));
        assert!(matches!(result, Err(WebhookError::MalformedSignatureHeader(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("t=1234567890");
        assert!(matches!(result, Err(WebhookError::MalformedSignatureHeader(_))));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let signature = "a".repeat(64);
        let result = SignatureHeader::parse(&format!("t=not_a_number,v1={}", signature));
        assert!(matches!(result, Err(WebhookError::MalformedSignatureHeader(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("t=1234567890,v1=not_valid_hex");
        assert!(matches!(result, Err(WebhookError::MalformedSignatureHeader(_))));
    }

    #[test]
    fn parse_header_no_equals_fails() {
        let result = SignatureHeader::parse("t1234567890");
        assert!(matches!(result, Err(WebhookError::MalformedSignatureHeader(_))));
    }

    #[test]
    fn parse_header_failure_is_a_signature_gate_failure() {
        let err = SignatureHeader::parse("t=garbage,v1=zzzz").unwrap_err();
        assert!(matches!(err, WebhookError::MalformedSignatureHeader(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = r#"{"id":"evt_test123","type":"customer.subscription.updated","created":1704067200,"data":{"object":{}},"livemode":false}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let event = verifier.verify_and_parse(payload.as_bytes(), &header).unwrap();

        assert_eq!(event.id, "evt_test123");
        assert_eq!(event.event_type, "customer.subscription.updated");
    }

    #[test]
    fn verify_invalid_signature_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", timestamp, "a".repeat(64));

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let verifier = WebhookVerifier::new("wrong_secret");
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let original_payload = r#"{"id":"evt_test"}"#;
        let tampered_payload = r#"{"id":"evt_hacked"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, original_payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier.verify_and_parse(tampered_payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_within_range_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 120;

        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_too_old_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 600;

        let result = verifier.validate_timestamp(timestamp);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn timestamp_at_boundary_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 300;

        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_just_past_boundary_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() - 301;

        let result = verifier.validate_timestamp(timestamp);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn timestamp_from_future_with_skew_succeeds() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 30;

        assert!(verifier.validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn timestamp_from_future_beyond_skew_fails() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let timestamp = chrono::Utc::now().timestamp() + 120;

        let result = verifier.validate_timestamp(timestamp);

        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    // ══════════════════════════════════════════════════════════════
    // JSON Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn valid_signature_over_invalid_json_fails_parse() {
        let verifier = WebhookVerifier::new(TEST_SECRET);
        let payload = "not valid json";
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }

    #[test]
    fn constant_time_compare_empty_slices() {
        assert!(constant_time_compare(&[], &[]));
    }
}
