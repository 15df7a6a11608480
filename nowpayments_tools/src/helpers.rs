//! IPN signature helpers.
//!
//! NOWPayments signs each callback with HMAC-SHA512, keyed with the IPN secret, over a canonical serialization of the
//! JSON body: object keys sorted at every depth, no insignificant whitespace, and non-ASCII characters written as
//! UTF-8 rather than escaped. The hex digest is sent in the `x-nowpayments-sig` header.
use hmac::{Hmac, Mac};
use log::*;
use serde_json::Value;
use sha2::Sha512;
use spg_common::Secret;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("No IPN secret is configured")]
    NoSecret,
    #[error("The payload is not valid JSON")]
    InvalidPayload,
    #[error("The signature is not a hex string")]
    MalformedSignature,
    #[error("Invalid signature")]
    Mismatch,
}

/// Serializes `value` with object keys sorted at every depth and compact separators.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries = map.iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        },
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn mac_for(secret: &Secret<String>, value: &Value) -> Result<HmacSha512, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::NoSecret);
    }
    let mut mac = HmacSha512::new_from_slice(secret.reveal().as_bytes()).map_err(|_| SignatureError::NoSecret)?;
    mac.update(canonical_json(value).as_bytes());
    Ok(mac)
}

/// The hex-encoded HMAC-SHA512 signature of `value`.
pub fn sign_ipn_payload(secret: &Secret<String>, value: &Value) -> Result<String, SignatureError> {
    let mac = mac_for(secret, value)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature` against the raw callback body, and returns the parsed payload if it matches.
///
/// The comparison is constant-time. An empty secret rejects everything, and a body that is not JSON is treated as a
/// signature failure.
pub fn verify_ipn_signature(secret: &Secret<String>, body: &[u8], signature: &str) -> Result<Value, SignatureError> {
    let payload = serde_json::from_slice::<Value>(body).map_err(|e| {
        debug!("🔐️ IPN body is not JSON. {e}");
        SignatureError::InvalidPayload
    })?;
    let expected = hex::decode(signature.trim()).map_err(|_| SignatureError::MalformedSignature)?;
    let mac = mac_for(secret, &payload)?;
    mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)?;
    trace!("🔐️ IPN signature is valid");
    Ok(payload)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn secret() -> Secret<String> {
        Secret::new("ipn-secret".to_string())
    }

    #[test]
    fn keys_are_sorted_at_every_depth() {
        let v = json!({"b": 1, "a": {"z": [3, {"y": true, "x": null}], "c": "ü"}});
        assert_eq!(canonical_json(&v), r#"{"a":{"c":"ü","z":[3,{"x":null,"y":true}]},"b":1}"#);
    }

    #[test]
    fn strings_are_escaped_like_json() {
        let v = json!({"q": "say \"hi\"\n", "slash": "a/b"});
        assert_eq!(canonical_json(&v), r#"{"q":"say \"hi\"\n","slash":"a/b"}"#);
    }

    #[test]
    fn key_order_does_not_affect_the_signature() {
        let a = json!({"order_id": "O1", "payment_status": "finished", "price_amount": 5.4});
        let b: Value = serde_json::from_str(r#"{"price_amount":5.4,"payment_status":"finished","order_id":"O1"}"#).unwrap();
        assert_eq!(sign_ipn_payload(&secret(), &a).unwrap(), sign_ipn_payload(&secret(), &b).unwrap());
    }

    #[test]
    fn verify_round_trip() {
        let body = br#"{"payment_status":"finished","order_id":"O1"}"#;
        let payload: Value = serde_json::from_slice(body).unwrap();
        let sig = sign_ipn_payload(&secret(), &payload).unwrap();
        assert_eq!(sig.len(), 128);
        let verified = verify_ipn_signature(&secret(), body, &sig).unwrap();
        assert_eq!(verified["order_id"], "O1");
        // Upper case hex is accepted too
        assert!(verify_ipn_signature(&secret(), body, &sig.to_uppercase()).is_ok());
    }

    #[test]
    fn tampered_bodies_are_rejected() {
        let body = br#"{"payment_status":"waiting","order_id":"O1"}"#;
        let payload: Value = serde_json::from_slice(body).unwrap();
        let sig = sign_ipn_payload(&secret(), &payload).unwrap();
        let tampered = br#"{"payment_status":"finished","order_id":"O1"}"#;
        assert_eq!(verify_ipn_signature(&secret(), tampered, &sig), Err(SignatureError::Mismatch));
        let other = Secret::new("other".to_string());
        assert_eq!(verify_ipn_signature(&other, body, &sig), Err(SignatureError::Mismatch));
    }

    #[test]
    fn rejections() {
        let body = br#"{"order_id":"O1"}"#;
        assert_eq!(verify_ipn_signature(&Secret::default(), body, "00"), Err(SignatureError::NoSecret));
        assert_eq!(verify_ipn_signature(&secret(), b"not json", "00"), Err(SignatureError::InvalidPayload));
        assert_eq!(verify_ipn_signature(&secret(), body, "xyz"), Err(SignatureError::MalformedSignature));
        assert_eq!(verify_ipn_signature(&secret(), body, "abcd"), Err(SignatureError::Mismatch));
    }
}
