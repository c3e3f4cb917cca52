use crate::error::PaymentsError;
use crate::paystack::Transaction;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;

/// Header carrying the hex HMAC-SHA512 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Event type that settles a booking.
pub const CHARGE_SUCCESS: &str = "charge.success";

type HmacSha512 = Hmac<Sha512>;

/// A webhook payload. `data` stays raw until the event type is known.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WebhookEvent {
    /// The transaction of a `charge.success` event; `None` for every other event.
    ///
    /// # Errors
    /// Returns [`PaymentsError::MalformedEvent`] if a `charge.success` payload has no usable transaction.
    pub fn successful_charge(self) -> Result<Option<Transaction>, PaymentsError> {
        if self.event != CHARGE_SUCCESS {
            return Ok(None);
        }
        serde_json::from_value(self.data).map(Some).map_err(|e| PaymentsError::MalformedEvent {
            message: e.to_string().into(),
            context: Some("charge.success payload".into()),
        })
    }
}

/// Checks `signature` against the body in constant time.
///
/// # Errors
/// Returns [`PaymentsError::Signature`] for a missing key, a malformed or a wrong signature.
pub fn verify_signature(secret_key: &str, body: &[u8], signature: &str) -> Result<(), PaymentsError> {
    let rejected = |reason: &'static str| PaymentsError::Signature { context: Some(reason.into()) };

    if secret_key.is_empty() {
        return Err(rejected("no secret key configured"));
    }
    let expected = hex::decode(signature.trim()).map_err(|_| rejected("not hex"))?;
    let mut mac =
        HmacSha512::new_from_slice(secret_key.as_bytes()).map_err(|_| rejected("unusable key"))?;
    mac.update(body);
    mac.verify_slice(&expected).map_err(|_| rejected("mismatch"))
}

/// Hex HMAC-SHA512 of `body`, as Paystack computes it.
///
/// # Errors
/// Returns [`PaymentsError::Internal`] if the key is rejected by the MAC.
pub fn sign(secret_key: &str, body: &[u8]) -> Result<String, PaymentsError> {
    let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())
        .map_err(|e| PaymentsError::from(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paystack::TransactionStatus;
    use serde_json::json;

    const KEY: &str = "sk_test_wayfare";

    #[test]
    fn matching_signature_is_accepted() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign(KEY, body).unwrap();

        assert_eq!(signature.len(), 128);
        verify_signature(KEY, body, &signature).unwrap();
        verify_signature(KEY, body, &signature.to_uppercase()).unwrap();
    }

    #[test]
    fn tampered_or_foreign_signatures_are_rejected() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = sign(KEY, body).unwrap();

        assert!(verify_signature(KEY, br#"{"event":"charge.failed"}"#, &signature).is_err());
        assert!(verify_signature("sk_test_other", body, &signature).is_err());
        assert!(verify_signature(KEY, body, "zz-not-hex").is_err());
        assert!(verify_signature(KEY, body, &signature[..64]).is_err());
        assert!(verify_signature("", body, &sign("", body).unwrap()).is_err());
    }

    #[test]
    fn only_charge_success_carries_a_transaction() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "event": "charge.success",
            "data": {
                "reference": "WF-1-abc",
                "status": "success",
                "amount": 250_000,
                "currency": "NGN",
                "customer": { "email": "ada@example.com" }
            }
        }))
        .unwrap();
        let transaction = event.successful_charge().unwrap().unwrap();
        assert_eq!(transaction.status, TransactionStatus::Success);

        let event: WebhookEvent =
            serde_json::from_value(json!({ "event": "transfer.success", "data": {} })).unwrap();
        assert!(event.successful_charge().unwrap().is_none());

        let event: WebhookEvent =
            serde_json::from_value(json!({ "event": "charge.success", "data": {} })).unwrap();
        assert!(matches!(event.successful_charge(), Err(PaymentsError::MalformedEvent { .. })));
    }
}
