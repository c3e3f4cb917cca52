//! Minimal Paystack REST client.
//!
//! Every Paystack response is wrapped in `{ "status": bool, "message": string, "data": … }`.
//! A non-2xx code or `status: false` is reported as [`PaymentsError::Gateway`] with the
//! gateway's message.

use crate::error::{PaymentsError, PaymentsErrorExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use wayfare_domain::config::PaystackConfig;

/// Body of `POST /transaction/initialize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    /// In the currency's subunit (kobo).
    pub amount: u64,
    pub reference: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    pub metadata: serde_json::Value,
}

/// `data` of a successful initialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Reversed,
    /// `ongoing`, `pending`, `queued` and anything newer.
    #[serde(other)]
    Pending,
}

/// A transaction as returned by verification and carried in webhook events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub status: TransactionStatus,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

/// Paystack API client sharing one connection pool.
#[derive(Clone)]
pub struct PaystackClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    secret_key: Arc<str>,
    callback_url: Option<Arc<str>>,
}

impl fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaystackClient")
            .field("base_url", &self.base_url)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

impl PaystackClient {
    /// # Errors
    /// Returns [`PaymentsError::Config`] for an empty base URL or a zero timeout, and
    /// [`PaymentsError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &PaystackConfig) -> Result<Self, PaymentsError> {
        let base_url = config.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(PaymentsError::Config {
                message: "paystack.base_url is required".into(),
                context: None,
            });
        }
        if config.timeout_seconds == 0 {
            return Err(PaymentsError::Config {
                message: "paystack.timeout_seconds must be greater than zero".into(),
                context: None,
            });
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("wayfare/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Building HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            secret_key: config.secret_key.trim().into(),
            callback_url: config.callback_url.as_deref().map(Into::into),
        })
    }

    /// Whether a secret key was configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }

    #[must_use]
    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Starts a checkout.
    ///
    /// # Errors
    /// [`PaymentsError::Gateway`] when unconfigured or refused, [`PaymentsError::Http`] when
    /// unreachable.
    #[instrument(skip_all, fields(reference = %request.reference, amount = request.amount))]
    pub async fn initialize(
        &self,
        request: &InitializeTransaction,
    ) -> Result<InitializedTransaction, PaymentsError> {
        self.ensure_configured()?;
        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&*self.secret_key)
            .json(request)
            .send()
            .await
            .context("POST /transaction/initialize")?;

        read_envelope(response, "transaction/initialize").await
    }

    /// Looks up the current state of a transaction.
    ///
    /// # Errors
    /// [`PaymentsError::Gateway`] when unconfigured or refused, [`PaymentsError::Http`] when
    /// unreachable.
    #[instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<Transaction, PaymentsError> {
        self.ensure_configured()?;
        let mut url = reqwest::Url::parse(&format!("{}/transaction/verify/", self.base_url))
            .map_err(|e| PaymentsError::Config {
                message: e.to_string().into(),
                context: Some("paystack.base_url".into()),
            })?;
        url.path_segments_mut()
            .map_err(|()| PaymentsError::Config {
                message: "base URL cannot have path segments".into(),
                context: Some("paystack.base_url".into()),
            })?
            .pop_if_empty()
            .push(reference);

        let response = self
            .http
            .get(url)
            .bearer_auth(&*self.secret_key)
            .send()
            .await
            .context("GET /transaction/verify")?;

        read_envelope(response, "transaction/verify").await
    }

    fn ensure_configured(&self) -> Result<(), PaymentsError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(PaymentsError::gateway("Payment gateway is not configured"))
        }
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &'static str,
) -> Result<T, PaymentsError> {
    let status = response.status();
    let envelope = match response.json::<Envelope<T>>().await {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(PaymentsError::Gateway {
                message: format!("HTTP {status}").into(),
                context: Some(endpoint.into()),
            });
        },
        Err(err) => return Err(err).context(endpoint),
    };

    if !status.is_success() || !envelope.status {
        tracing::warn!(%status, message = %envelope.message, endpoint, "Paystack refused the request");
        return Err(PaymentsError::Gateway {
            message: if envelope.message.is_empty() {
                format!("HTTP {status}").into()
            } else {
                envelope.message.into()
            },
            context: Some(endpoint.into()),
        });
    }

    envelope.data.ok_or_else(|| PaymentsError::Gateway {
        message: "Response carried no data".into(),
        context: Some(endpoint.into()),
    })
}
