use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
/// API version pinned for ephemeral keys; the mobile SDK requires one.
const EPHEMERAL_KEY_API_VERSION: &str = "2022-11-15";
/// Signed webhook timestamps older than this are refused as replays.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Minimal Stripe client built on reqwest.
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub created: Option<i64>,
    pub livemode: Option<bool>,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub amount_received: i64,
    pub client_secret: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

/// Arguments for a payment intent backing a mobile payment sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub customer_id: String,
    pub receipt_email: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl StripeClient {
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            webhook_secret,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        error!(
            status = %status,
            stripe_request_id = ?request_id,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            stripe_error_param = ?details.as_ref().and_then(|d| d.param.as_deref()),
            stripe_error_message = ?details.as_ref().and_then(|d| d.message.as_deref()),
            context = %context,
            "payments: stripe api request failed"
        );

        bail!(
            "Stripe API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// https://stripe.com/docs/api/customers/create
    pub async fn create_customer(&self, email: Option<&str>) -> Result<String> {
        let mut body: Vec<(&str, String)> = Vec::new();
        if let Some(email) = email {
            body.push(("email", email.to_string()));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/customers"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create customer").await?;

        #[derive(Deserialize)]
        struct CustomerResp {
            id: String,
        }

        let parsed: CustomerResp = resp.json().await?;
        Ok(parsed.id)
    }

    /// Returns the secret of a new ephemeral key scoped to `customer_id`.
    pub async fn create_ephemeral_key(&self, customer_id: &str) -> Result<String> {
        let body = [("customer", customer_id.to_string())];

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/ephemeral_keys"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("Stripe-Version", EPHEMERAL_KEY_API_VERSION)
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create ephemeral key").await?;

        #[derive(Deserialize)]
        struct EphemeralKeyResp {
            secret: String,
        }

        let parsed: EphemeralKeyResp = resp.json().await?;
        Ok(parsed.secret)
    }

    /// https://stripe.com/docs/api/payment_intents/create
    pub async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<StripePaymentIntent> {
        let mut body: Vec<(String, String)> = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency),
            ("customer".to_string(), request.customer_id),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];

        if let Some(email) = request.receipt_email {
            body.push(("receipt_email".to_string(), email));
        }

        for (key, value) in request.metadata {
            body.push((format!("metadata[{}]", key), value));
        }

        let resp = self
            .http
            .post(format!("{STRIPE_API_BASE}/payment_intents"))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create payment intent").await?;

        let intent: StripePaymentIntent = resp.json().await?;
        Ok(intent)
    }

    /// Verifies the webhook signature. https://stripe.com/docs/webhooks/signatures
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent> {
        verify_signed_payload(
            &self.webhook_secret,
            payload,
            signature_header,
            Utc::now().timestamp(),
        )?;

        let event: StripeEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }

    pub fn extract_payment_intent(event: &StripeEvent) -> Option<StripePaymentIntent> {
        serde_json::from_value(event.data.object.clone()).ok()
    }
}

fn verify_signed_payload(
    secret: &str,
    payload: &[u8],
    signature_header: &str,
    now: i64,
) -> Result<()> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = Some(rest);
        } else if let Some(rest) = part.strip_prefix("v1=") {
            signatures.push(rest);
        }
    }

    let timestamp = timestamp.ok_or_else(|| anyhow!("missing timestamp in stripe-signature"))?;
    if signatures.is_empty() {
        bail!("missing v1 in stripe-signature");
    }

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| anyhow!("malformed timestamp in stripe-signature"))?;
    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        bail!("webhook timestamp outside tolerance");
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Rolled secrets produce several v1 entries; any one may match.
    let matched = signatures.iter().any(|candidate| match hex::decode(candidate) {
        Ok(provided) => mac.clone().verify_slice(&provided).is_ok(),
        Err(_) => false,
    });

    if !matched {
        bail!("invalid webhook signature");
    }

    Ok(())
}
