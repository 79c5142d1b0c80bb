//! Outbound calls to the provider's REST API.

use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::crypto::hmac::HMacSigner;
use crate::crypto::params::{ParamValue, SignableRequest};
use crate::crypto::signer::Signer;
use crate::error::{Error, Result, UpstreamError};
use crate::provider::request::{self, Identifier};
use crate::provider::target::{Endpoint, ProviderTarget};

/// Signs requests and posts them to the provider.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ProdamusClient {
    http: Client,
    scheme: String,
}

impl ProdamusClient {
    /// Creates a client with a pooled HTTP connection and a total request
    /// timeout of `timeout`. Connecting is bounded separately at 10 seconds.
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, scheme: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            scheme: scheme.into(),
        })
    }

    /// Signs `params` with `secret_key` and posts them to `target` as
    /// `application/x-www-form-urlencoded`.
    ///
    /// Returns the provider's JSON body as-is; a body that is not JSON comes
    /// back as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] on transport failure, timeout, or a non-2xx status.
    #[instrument(skip(self, params, secret_key), fields(endpoint = %target.endpoint(), domain = target.domain()))]
    pub async fn dispatch(
        &self,
        target: &ProviderTarget,
        params: SignableRequest,
        secret_key: &str,
    ) -> Result<Value, UpstreamError> {
        let signature = HMacSigner::new(secret_key.as_bytes()).sign(&params);
        let signed = params.into_signed(signature);
        let url = target.url(&self.scheme);

        info!(%url, "sending provider request");
        debug!(params = ?signed.form_pairs(), "provider request data");

        let response = self
            .http
            .post(&url)
            .form(&signed.form_pairs())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body = parse_body(text);

        if !status.is_success() {
            warn!(status = status.as_u16(), body = ?body, "provider rejected request");
            return Err(UpstreamError {
                status: Some(status.as_u16()),
                message: format!("provider returned status {status}"),
                body,
            });
        }

        info!(status = status.as_u16(), "provider request succeeded");
        debug!(?body, "provider response");
        Ok(body.unwrap_or(Value::Null))
    }

    /// Activates or deactivates a subscription.
    pub async fn set_activity(
        &self,
        prodamus_url: &str,
        secret_key: &str,
        subscription: impl Into<ParamValue>,
        identifier: &Identifier,
        is_active: bool,
    ) -> Result<Value> {
        let target = ProviderTarget::new(prodamus_url, Endpoint::SetActivity)?;
        let params = request::activate_subscription(subscription, identifier, is_active)?;
        Ok(self.dispatch(&target, params, secret_key).await?)
    }

    /// Sets the discount applied to future subscription payments.
    pub async fn set_subscription_discount(
        &self,
        prodamus_url: &str,
        secret_key: &str,
        subscription: impl Into<ParamValue>,
        discount: ParamValue,
    ) -> Result<Value> {
        let target = ProviderTarget::new(prodamus_url, Endpoint::SetSubscriptionDiscount)?;
        let params = request::set_discount(subscription, discount)?;
        Ok(self.dispatch(&target, params, secret_key).await?)
    }

    /// Moves the next subscription payment to `date` (`YYYY-MM-DD HH:MM`).
    pub async fn set_subscription_payment_date(
        &self,
        prodamus_url: &str,
        secret_key: &str,
        subscription: impl Into<ParamValue>,
        date: &str,
        identifier: &Identifier,
        now: NaiveDateTime,
    ) -> Result<Value> {
        let target = ProviderTarget::new(prodamus_url, Endpoint::SetSubscriptionPaymentDate)?;
        let params = request::set_payment_date(subscription, date, identifier, now)?;
        Ok(self.dispatch(&target, params, secret_key).await?)
    }
}

fn parse_body(text: String) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_body_keeps_json() {
        assert_eq!(
            parse_body(r#"{"success":true}"#.into()),
            Some(json!({"success": true}))
        );
    }

    #[test]
    fn parse_body_wraps_plain_text() {
        assert_eq!(parse_body("OK".into()), Some(json!("OK")));
    }

    #[test]
    fn parse_body_empty_is_none() {
        assert_eq!(parse_body("  ".into()), None);
    }

    #[tokio::test]
    async fn invalid_provider_url_fails_before_sending() {
        let client = ProdamusClient::new(Duration::from_secs(1), "https").unwrap();
        let identifier = Identifier::new(crate::provider::request::IdentifierKind::Phone, "+7900");
        let result = client.set_activity("https://", "key", "1", &identifier, true).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_upstream_error() {
        let client = ProdamusClient::new(Duration::from_secs(2), "http").unwrap();
        let target = ProviderTarget::new("127.0.0.1:1", Endpoint::SetActivity).unwrap();
        let error = client
            .dispatch(&target, SignableRequest::new().with("subscription", "1"), "key")
            .await
            .unwrap_err();
        assert_eq!(error.status, None);
        assert!(error.body.is_none());
    }
}
