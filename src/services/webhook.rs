// src/services/webhook.rs

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::common::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const RAZORPAY_SIGNATURE_HEADER: &str = "x-razorpay-signature";
pub const STRIPE_TOLERANCE_SECS: i64 = 300;

/// O que um webhook diz sobre um pagamento nosso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    Succeeded { reference: String },
    Failed { reference: String },
    Ignored { event_type: String },
}

fn mac_for(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("chave HMAC inválida: {}", e)))
}

/// `Stripe-Signature: t=<unix>,v1=<hex>[,v1=<hex>...]`, HMAC sobre `"{t}.{payload}"`.
pub fn verify_stripe_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now_unix: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(AppError::InvalidWebhookSignature)?;
    if now_unix.abs_diff(timestamp) > STRIPE_TOLERANCE_SECS.unsigned_abs() {
        tracing::warn!("Webhook Stripe fora da janela de tolerância (t={})", timestamp);
        return Err(AppError::InvalidWebhookSignature);
    }

    let matches = signatures.iter().any(|signature| {
        mac_for(secret)
            .map(|mut mac| {
                mac.update(timestamp.to_string().as_bytes());
                mac.update(b".");
                mac.update(payload);
                mac.verify_slice(signature).is_ok()
            })
            .unwrap_or(false)
    });

    if matches { Ok(()) } else { Err(AppError::InvalidWebhookSignature) }
}

/// `X-Razorpay-Signature`: HMAC-SHA256 em hex do corpo cru.
pub fn verify_razorpay_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), AppError> {
    let expected = hex::decode(signature.trim()).map_err(|_| AppError::InvalidWebhookSignature)?;
    let mut mac = mac_for(secret)?;
    mac.update(payload);
    mac.verify_slice(&expected).map_err(|_| AppError::InvalidWebhookSignature)
}

// ---
// Eventos
// ---

#[derive(Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize)]
struct StripeEventData {
    object: StripeObject,
}

#[derive(Deserialize)]
struct StripeObject {
    id: String,
}

pub fn parse_stripe_event(payload: &[u8]) -> Result<PaymentEvent, AppError> {
    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::PaymentProvider(format!("evento Stripe ilegível: {}", e)))?;

    let reference = event.data.object.id;
    Ok(match event.event_type.as_str() {
        "payment_intent.succeeded" => PaymentEvent::Succeeded { reference },
        "payment_intent.payment_failed" | "payment_intent.canceled" => {
            PaymentEvent::Failed { reference }
        }
        _ => PaymentEvent::Ignored { event_type: event.event_type },
    })
}

#[derive(Deserialize)]
struct RazorpayEvent {
    event: String,
    payload: RazorpayPayload,
}

#[derive(Deserialize)]
struct RazorpayPayload {
    payment: Option<RazorpayEntityWrapper>,
    order: Option<RazorpayEntityWrapper>,
}

#[derive(Deserialize)]
struct RazorpayEntityWrapper {
    entity: RazorpayEntity,
}

#[derive(Deserialize)]
struct RazorpayEntity {
    id: String,
    order_id: Option<String>,
}

pub fn parse_razorpay_event(payload: &[u8]) -> Result<PaymentEvent, AppError> {
    let event: RazorpayEvent = serde_json::from_slice(payload)
        .map_err(|e| AppError::PaymentProvider(format!("evento Razorpay ilegível: {}", e)))?;

    // Nossa referência é o id da order.
    let order_id = event
        .payload
        .order
        .map(|o| o.entity.id)
        .or_else(|| event.payload.payment.and_then(|p| p.entity.order_id));

    Ok(match (event.event.as_str(), order_id) {
        ("order.paid" | "payment.captured", Some(reference)) => PaymentEvent::Succeeded { reference },
        ("payment.failed", Some(reference)) => PaymentEvent::Failed { reference },
        _ => PaymentEvent::Ignored { event_type: event.event },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_teste";

    fn sign(secret: &str, message: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }

    fn stripe_header(t: i64, payload: &[u8], secret: &str) -> String {
        let mut message = format!("{}.", t).into_bytes();
        message.extend_from_slice(payload);
        format!("t={},v1={}", t, sign(secret, &message))
    }

    #[test]
    fn accepts_a_fresh_stripe_signature() {
        let payload = br#"{"type":"payment_intent.succeeded"}"#;
        let header = stripe_header(1_700_000_000, payload, SECRET);
        assert!(verify_stripe_signature(payload, &header, SECRET, 1_700_000_060).is_ok());
    }

    #[test]
    fn rejects_stripe_signature_with_wrong_secret() {
        let payload = b"{}";
        let header = stripe_header(1_700_000_000, payload, "outro");
        assert!(matches!(
            verify_stripe_signature(payload, &header, SECRET, 1_700_000_000),
            Err(AppError::InvalidWebhookSignature)
        ));
    }

    #[test]
    fn rejects_stale_stripe_timestamps() {
        let payload = b"{}";
        let header = stripe_header(1_700_000_000, payload, SECRET);
        let later = 1_700_000_000 + STRIPE_TOLERANCE_SECS + 1;
        assert!(verify_stripe_signature(payload, &header, SECRET, later).is_err());
    }

    #[test]
    fn rejects_extreme_stripe_timestamps_without_panicking() {
        for header in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
            assert!(matches!(
                verify_stripe_signature(b"{}", header, SECRET, 1_700_000_000),
                Err(AppError::InvalidWebhookSignature)
            ));
        }
    }

    #[test]
    fn rejects_tampered_stripe_payload() {
        let header = stripe_header(1_700_000_000, b"{\"a\":1}", SECRET);
        assert!(verify_stripe_signature(b"{\"a\":2}", &header, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn razorpay_signature_round_trip() {
        let payload = br#"{"event":"order.paid"}"#;
        let signature = sign(SECRET, payload);
        assert!(verify_razorpay_signature(payload, &signature, SECRET).is_ok());
        assert!(verify_razorpay_signature(payload, &signature, "outro").is_err());
        assert!(verify_razorpay_signature(payload, "não-é-hex", SECRET).is_err());
    }

    #[test]
    fn stripe_events_map_to_payment_outcomes() {
        let ok = br#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        assert_eq!(parse_stripe_event(ok).unwrap(), PaymentEvent::Succeeded { reference: "pi_1".into() });

        let other = br#"{"type":"customer.created","data":{"object":{"id":"cus_1"}}}"#;
        assert!(matches!(parse_stripe_event(other).unwrap(), PaymentEvent::Ignored { .. }));
    }

    #[test]
    fn razorpay_payment_events_use_the_order_id() {
        let captured = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_9"}}}}"#;
        assert_eq!(
            parse_razorpay_event(captured).unwrap(),
            PaymentEvent::Succeeded { reference: "order_9".into() }
        );

        let failed = br#"{"event":"payment.failed","payload":{"payment":{"entity":{"id":"pay_2","order_id":"order_9"}}}}"#;
        assert_eq!(
            parse_razorpay_event(failed).unwrap(),
            PaymentEvent::Failed { reference: "order_9".into() }
        );
    }
}
