//! Redirect payment provider collaborator. Builds the signed pay-page URL at
//! checkout and verifies the checksum on the provider's return callback.
//! An unverifiable callback must never reach reconciliation.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AppConfig;

/// Characters that would corrupt a query string (or its decoded
/// canonicalization) if left raw in a value.
const QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'=')
    .add(b'?')
    .add(b'/')
    .add(b':');

pub const PARAM_TXN_REF: &str = "txn_ref";
pub const PARAM_AMOUNT: &str = "amount";
pub const PARAM_ORDER_INFO: &str = "order_info";
pub const PARAM_TRANSACTION_NO: &str = "transaction_no";
pub const PARAM_RESPONSE_CODE: &str = "response_code";
pub const PARAM_RETURN_URL: &str = "return_url";
pub const PARAM_CHECKSUM: &str = "checksum";

/// Provider-reported outcome of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    /// The provider is still processing; the booking stays payment-pending.
    Processing,
    Failed,
}

impl CallbackOutcome {
    /// "00" is the provider's success code, "07" its mid-processing code.
    pub fn from_response_code(code: &str) -> Self {
        match code {
            "00" => CallbackOutcome::Success,
            "07" => CallbackOutcome::Processing,
            _ => CallbackOutcome::Failed,
        }
    }
}

/// Build the redirect URL for a booking. Amount is in the provider's minor
/// unit (x100). The checksum covers the raw values; the rendered query
/// percent-encodes them, and the provider decodes before verifying (as our
/// own return route does via the axum query extractor).
pub fn build_payment_url(
    config: &AppConfig,
    booking_id: Uuid,
    booking_code: &str,
    total_amount: i64,
) -> String {
    let mut params = BTreeMap::new();
    params.insert(PARAM_TXN_REF.to_string(), booking_id.to_string());
    params.insert(PARAM_AMOUNT.to_string(), (total_amount * 100).to_string());
    params.insert(PARAM_ORDER_INFO.to_string(), booking_code.to_string());
    params.insert(
        PARAM_RETURN_URL.to_string(),
        config.payment_return_url.clone(),
    );

    let checksum = checksum_for(&config.payment_secret, &params);
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, QUERY_ENCODE_SET)))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}?{}&{}={}",
        config.payment_base_url, query, PARAM_CHECKSUM, checksum
    )
}

/// Verify a callback's checksum over every param except the checksum itself.
/// Returns false on a missing or mismatched checksum.
pub fn verify_callback(secret: &str, params: &BTreeMap<String, String>) -> bool {
    let Some(received) = params.get(PARAM_CHECKSUM) else {
        return false;
    };
    let mut signed: BTreeMap<String, String> = params.clone();
    signed.remove(PARAM_CHECKSUM);
    let expected = checksum_for(secret, &signed);
    // Hex digests are fixed-length, so a simple comparison leaks nothing useful.
    expected == received.to_lowercase()
}

/// Checksum over a param set (which must not already contain the checksum
/// field). Shared by the URL builder, the verifier, and callback simulators.
pub fn checksum_for(secret: &str, params: &BTreeMap<String, String>) -> String {
    sign(secret, &canonical_query(params))
}

/// Sorted `k=v&k=v` string; BTreeMap iteration gives the canonical order.
fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// SHA-256 over secret||'|'||query, hex-encoded. The upstream provider's
/// exact HMAC scheme is not published; this keeps verification mandatory
/// while remaining a one-function swap if the real scheme lands.
fn sign(secret: &str, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b"|");
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(return_url: &str) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt_secret: "jwt".into(),
            payment_secret: "s3cret".into(),
            payment_base_url: "https://pay.example.test/pay".into(),
            payment_return_url: return_url.into(),
        }
    }

    #[test]
    fn return_url_is_encoded_in_the_redirect() {
        let config = test_config("https://shop.example/return?a=1&b=2");
        let url = build_payment_url(&config, Uuid::new_v4(), "BK-20260901-ABCDEF12", 1000);
        let (_, query) = url.split_once('?').expect("query string");
        // Exactly five pairs: txn_ref, amount, order_info, return_url, checksum.
        // An unencoded '&' in the return URL would split it into six.
        assert_eq!(query.split('&').count(), 5);
        assert!(
            query.contains("return_url=https%3A%2F%2Fshop.example%2Freturn%3Fa%3D1%26b%3D2"),
            "got {query}"
        );
    }

    #[test]
    fn redirect_checksum_verifies_over_decoded_values() {
        let booking_id = Uuid::new_v4();
        let config = test_config("https://shop.example/return?a=1&b=2");
        let url = build_payment_url(&config, booking_id, "BK-20260901-ABCDEF12", 1000);
        // What the provider (or our own return route) sees after decoding.
        let mut params = BTreeMap::new();
        params.insert(PARAM_TXN_REF.to_string(), booking_id.to_string());
        params.insert(PARAM_AMOUNT.to_string(), "100000".to_string());
        params.insert(
            PARAM_ORDER_INFO.to_string(),
            "BK-20260901-ABCDEF12".to_string(),
        );
        params.insert(
            PARAM_RETURN_URL.to_string(),
            config.payment_return_url.clone(),
        );
        let expected = checksum_for(&config.payment_secret, &params);
        assert!(url.ends_with(&format!("{PARAM_CHECKSUM}={expected}")));
    }

    fn params_for(booking_id: Uuid, secret: &str) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert(PARAM_TXN_REF.to_string(), booking_id.to_string());
        params.insert(PARAM_AMOUNT.to_string(), "240000000".to_string());
        params.insert(PARAM_RESPONSE_CODE.to_string(), "00".to_string());
        params.insert(
            PARAM_TRANSACTION_NO.to_string(),
            "VNP14422574".to_string(),
        );
        let checksum = checksum_for(secret, &params);
        params.insert(PARAM_CHECKSUM.to_string(), checksum);
        params
    }

    #[test]
    fn valid_callback_verifies() {
        let params = params_for(Uuid::new_v4(), "s3cret");
        assert!(verify_callback("s3cret", &params));
    }

    #[test]
    fn tampered_amount_fails_verification() {
        let mut params = params_for(Uuid::new_v4(), "s3cret");
        params.insert(PARAM_AMOUNT.to_string(), "1".to_string());
        assert!(!verify_callback("s3cret", &params));
    }

    #[test]
    fn wrong_secret_and_missing_checksum_fail() {
        let mut params = params_for(Uuid::new_v4(), "s3cret");
        assert!(!verify_callback("other", &params));
        params.remove(PARAM_CHECKSUM);
        assert!(!verify_callback("s3cret", &params));
    }

    #[test]
    fn response_codes_map_to_outcomes() {
        assert_eq!(
            CallbackOutcome::from_response_code("00"),
            CallbackOutcome::Success
        );
        assert_eq!(
            CallbackOutcome::from_response_code("07"),
            CallbackOutcome::Processing
        );
        assert_eq!(
            CallbackOutcome::from_response_code("24"),
            CallbackOutcome::Failed
        );
    }
}
