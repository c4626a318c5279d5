//! # UBCH Credit-Bureau Adapter
//!
//! Second consumer of the correlation gateway. The provider speaks a
//! base64-encoded JSON sub-envelope riding inside the gateway payload;
//! every leg (sync subscribe, fire-and-forget subscribe, unsubscribe,
//! async confirmation callback) goes through the one codec below, so
//! the encodings cannot drift apart.

use crate::modifier::SubscriptionModifier;
use crate::store::SubscriptionStore;
use crate::strategy::{require_param, SubscriptionParams, SubscriptionStrategy};
use crate::{EVENT_UBCH_REQUEST, PROVIDER_UBCH};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use correlation_gateway::{Gateway, InboundHandler};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::envelope::InboundEnvelope;
use shared_types::{CoreError, CoreResult, SubscriptionRecord, UserId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The one registration method UBCH exposes.
const UBCH_METHOD: &str = "Rega";
/// HTTP-status-like success code in decoded responses.
const STATUS_OK: i64 = 200;

/// Provider sub-envelope. `refagr` carries the external subscription id
/// and is present only on unsubscribe requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UbchEnvelope {
    pub method: String,
    pub session: String,
    pub personal_identifier: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refagr: Option<String>,
}

/// Decoded provider response.
#[derive(Debug, Clone, Deserialize)]
pub struct UbchResponse {
    pub status: i64,
    #[serde(default)]
    pub data: Option<UbchResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UbchResponseData {
    #[serde(default)]
    pub refagr: Option<String>,
}

/// Asynchronous confirmation pushed by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UbchCallback {
    pub status: i64,
    pub personal_identifier: String,
    #[serde(default)]
    pub refagr: Option<String>,
}

fn encode_payload<T: Serialize>(payload: &T) -> CoreResult<Value> {
    Ok(Value::String(STANDARD.encode(serde_json::to_vec(payload)?)))
}

fn decode_payload<T: DeserializeOwned>(value: &Value) -> CoreResult<T> {
    let text = value
        .as_str()
        .ok_or_else(|| CoreError::validation("provider payload is not a base64 string"))?;
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| CoreError::validation(format!("provider payload is not base64: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn check_status(response: &UbchResponse, raw: &Value) -> CoreResult<()> {
    if response.status == STATUS_OK {
        return Ok(());
    }
    error!(
        status = response.status,
        payload = %raw,
        "UBCH provider returned a non-OK status"
    );
    Err(CoreError::Provider {
        code: response.status,
        message: format!("ubch provider returned status {}", response.status),
    })
}

/// Port to the UBCH provider. Selected once at construction: the
/// gateway-backed implementation in production, the mock in tests and
/// sandboxed environments.
#[async_trait]
pub trait UbchProvider: Send + Sync {
    /// Register and wait for the external subscription id.
    async fn subscribe(&self, personal_identifier: &str) -> CoreResult<String>;

    /// Register intent without waiting for the external id. The id
    /// arrives later through the confirmation callback.
    async fn subscribe_deferred(&self, personal_identifier: &str) -> CoreResult<()>;

    /// Cancel an existing registration.
    async fn unsubscribe(&self, personal_identifier: &str, external_id: &str) -> CoreResult<()>;
}

/// Gateway-backed provider.
pub struct GatewayUbchProvider {
    gateway: Arc<Gateway>,
    session: String,
    language: String,
}

impl GatewayUbchProvider {
    /// Wire the provider with its session and language defaults.
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, session: String, language: String) -> Self {
        Self {
            gateway,
            session,
            language,
        }
    }

    fn envelope(&self, personal_identifier: &str, refagr: Option<String>) -> UbchEnvelope {
        UbchEnvelope {
            method: UBCH_METHOD.to_owned(),
            session: self.session.clone(),
            personal_identifier: personal_identifier.to_owned(),
            language: self.language.clone(),
            refagr,
        }
    }

    async fn send_checked(&self, envelope: &UbchEnvelope) -> CoreResult<UbchResponse> {
        let raw = self
            .gateway
            .send(EVENT_UBCH_REQUEST, encode_payload(envelope)?, None)
            .await?;
        let response: UbchResponse = decode_payload(&raw)?;
        check_status(&response, &raw)?;
        Ok(response)
    }
}

#[async_trait]
impl UbchProvider for GatewayUbchProvider {
    async fn subscribe(&self, personal_identifier: &str) -> CoreResult<String> {
        let response = self
            .send_checked(&self.envelope(personal_identifier, None))
            .await?;
        response
            .data
            .and_then(|d| d.refagr)
            .ok_or_else(|| CoreError::validation("ubch response is missing the subscription id"))
    }

    async fn subscribe_deferred(&self, personal_identifier: &str) -> CoreResult<()> {
        let payload = encode_payload(&self.envelope(personal_identifier, None))?;
        let (correlation_id, accepted) = self.gateway.publish(EVENT_UBCH_REQUEST, payload).await;
        if !accepted {
            return Err(CoreError::service_unavailable(EVENT_UBCH_REQUEST));
        }
        debug!(%correlation_id, "UBCH registration intent published");
        Ok(())
    }

    async fn unsubscribe(&self, personal_identifier: &str, external_id: &str) -> CoreResult<()> {
        self.send_checked(&self.envelope(personal_identifier, Some(external_id.to_owned())))
            .await?;
        Ok(())
    }
}

/// In-process stand-in. Hands out deterministic ids so tests can assert
/// convergence without a transport.
#[derive(Debug, Default)]
pub struct MockUbchProvider;

#[async_trait]
impl UbchProvider for MockUbchProvider {
    async fn subscribe(&self, personal_identifier: &str) -> CoreResult<String> {
        Ok(format!("mock-{personal_identifier}"))
    }

    async fn subscribe_deferred(&self, _personal_identifier: &str) -> CoreResult<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _personal_identifier: &str, _external_id: &str) -> CoreResult<()> {
        Ok(())
    }
}

/// Credit-history strategy backed by the UBCH provider.
pub struct UbchStrategy {
    provider: Arc<dyn UbchProvider>,
}

impl UbchStrategy {
    /// Wrap the selected provider.
    #[must_use]
    pub fn new(provider: Arc<dyn UbchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl SubscriptionStrategy for UbchStrategy {
    async fn subscribe(
        &self,
        record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let personal = require_param(&params.personal_identifier, "personalIdentifier")?;
        if record.provider_ids.contains_key(PROVIDER_UBCH) {
            debug!(user = %record.user, "UBCH subscription already registered");
            return Ok(None);
        }
        let external_id = self.provider.subscribe(personal).await?;
        Ok(Some(
            SubscriptionModifier::new().set_provider_id(PROVIDER_UBCH, external_id),
        ))
    }

    async fn publish_subscription(
        &self,
        record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let personal = require_param(&params.personal_identifier, "personalIdentifier")?;
        if record.provider_ids.contains_key(PROVIDER_UBCH) {
            debug!(user = %record.user, "UBCH subscription already registered");
            return Ok(None);
        }
        // Intent only; the stored id arrives through the callback.
        self.provider.subscribe_deferred(personal).await?;
        Ok(None)
    }

    async fn unsubscribe(
        &self,
        record: &SubscriptionRecord,
        params: &SubscriptionParams,
    ) -> CoreResult<Option<SubscriptionModifier>> {
        let personal = require_param(&params.personal_identifier, "personalIdentifier")?;
        let external_id = record
            .provider_ids
            .get(PROVIDER_UBCH)
            .ok_or_else(|| CoreError::NotFound("no ubch subscription to cancel".to_owned()))?;
        self.provider.unsubscribe(personal, external_id).await?;
        Ok(Some(
            SubscriptionModifier::new().clear_provider_id(PROVIDER_UBCH),
        ))
    }
}

/// Handles asynchronous UBCH confirmations.
///
/// Persists through the same modifier path as the synchronous leg, so
/// whichever leg lands last converges to the same single stored id.
pub struct UbchCallbackHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl UbchCallbackHandler {
    /// Wrap the subscription store.
    #[must_use]
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InboundHandler for UbchCallbackHandler {
    async fn handle(&self, envelope: InboundEnvelope) -> CoreResult<()> {
        let payload = match envelope.outcome {
            Ok(payload) => payload,
            Err(remote) => {
                warn!(
                    correlation_id = %envelope.uuid,
                    code = remote.code,
                    message = %remote.message,
                    "UBCH callback delivered as an error"
                );
                return Err(CoreError::Provider {
                    code: remote.code,
                    message: remote.message,
                });
            }
        };
        let callback: UbchCallback = decode_payload(&payload)?;
        if callback.status != STATUS_OK {
            error!(
                status = callback.status,
                payload = %payload,
                "UBCH callback carried a non-OK status"
            );
            return Err(CoreError::Provider {
                code: callback.status,
                message: format!("ubch callback carried status {}", callback.status),
            });
        }
        let external_id = callback
            .refagr
            .ok_or_else(|| CoreError::validation("ubch callback is missing the subscription id"))?;

        let user = UserId::from(callback.personal_identifier.as_str());
        let modifier = SubscriptionModifier::new().set_provider_id(PROVIDER_UBCH, external_id);
        let stored = self.store.apply(&user, &modifier).await?;
        info!(
            user = %user,
            external_id = ?stored.provider_ids.get(PROVIDER_UBCH),
            "UBCH subscription confirmed"
        );
        Ok(())
    }
}
