//! HTTP client for the pricing service.
//!
//! Speaks the service's JSON API rooted at `{base_url}/api` with `reqwest`.
//! Caches demonstration catalog quotes using `moka`.

use std::sync::Arc;

use async_trait::async_trait;
use kashly_core::{FieldError, OrderId, PaymentMethod, ProductId, ProductUrl, ShippingAddress};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::PricingServiceConfig;

use super::cache::{SampleCache, sample_cache};
use super::types::{Cart, CartLine, Order, ProductQuote, ServiceInfo};
use super::{PricingError, PricingService};

/// Maximum number of body characters kept in logs and error messages.
const BODY_EXCERPT_LEN: usize = 200;

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Serialize)]
struct LookupRequest<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ReconcileRequest<'a> {
    items: &'a [CartLine],
}

#[derive(Serialize)]
struct PlaceOrderRequest<'a> {
    cart: &'a Cart,
    shipping: &'a ShippingAddress,
    payment_method: PaymentMethod,
}

/// Error body returned by the service: `detail` is either a message or a
/// list of field errors.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldDetail>),
}

#[derive(Debug, Deserialize)]
struct FieldDetail {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    #[serde(default)]
    msg: String,
}

impl FieldDetail {
    /// The field name is the last string segment of `loc`.
    fn into_field_error(self) -> FieldError {
        let field = self
            .loc
            .iter()
            .rev()
            .find_map(serde_json::Value::as_str)
            .unwrap_or("request")
            .to_owned();
        FieldError::new(field, self.msg)
    }
}

// =============================================================================
// PricingClient
// =============================================================================

/// Client for the pricing service.
///
/// Cheap to clone; clones share the connection pool and sample cache.
#[derive(Clone)]
pub struct PricingClient {
    inner: Arc<PricingClientInner>,
}

struct PricingClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    samples: Option<SampleCache>,
}

impl std::fmt::Debug for PricingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field(
                "api_token",
                &self.inner.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("sample_cache", &self.inner.samples.is_some())
            .finish_non_exhaustive()
    }
}

impl PricingClient {
    /// Create a new pricing service client.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(config: &PricingServiceConfig) -> Result<Self, PricingError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PricingError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let samples = (!config.sample_cache_ttl.is_zero())
            .then(|| sample_cache(config.sample_cache_ttl));

        Ok(Self {
            inner: Arc::new(PricingClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                samples,
            }),
        })
    }

    /// Build `{base_url}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, PricingError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                PricingError::Invalid(format!(
                    "backend URL cannot be a base: {}",
                    self.inner.base_url
                ))
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.inner.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, PricingError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Pricing service request failed");
            PricingError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            warn!(
                status = %status,
                body = %excerpt(&body),
                error = %err,
                "Pricing service returned non-success status"
            );
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %excerpt(&body),
                "Failed to parse pricing service response"
            );
            PricingError::Unavailable(format!("malformed response: {e}"))
        })
    }

    // =========================================================================
    // Supplementary Methods
    // =========================================================================

    /// Fetch an order by id, e.g. to check its status after placement.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::NotFound`] for an unknown order, or
    /// [`PricingError::Unavailable`] if the request fails.
    #[instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order, PricingError> {
        let url = self.endpoint(&["orders", order_id.as_str()])?;
        self.execute(self.request(Method::GET, url)).await
    }

    /// Check that the service is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Unavailable`] if the service does not answer.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<ServiceInfo, PricingError> {
        let url = self.endpoint(&[""])?;
        self.execute(self.request(Method::GET, url)).await
    }

    /// Drop all cached sample quotes.
    pub async fn invalidate_samples(&self) {
        if let Some(cache) = &self.inner.samples {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }
}

#[async_trait]
impl PricingService for PricingClient {
    #[instrument(skip(self, url), fields(url = %url))]
    async fn lookup(&self, url: &ProductUrl) -> Result<ProductQuote, PricingError> {
        let endpoint = self.endpoint(&["amazon", "lookup"])?;
        let request = self
            .request(Method::POST, endpoint)
            .json(&LookupRequest { url: url.as_str() });

        let quote: ProductQuote = self.execute(request).await?;
        debug!(asin = %quote.asin, cod_price = %quote.cod_price, "Product quoted");
        Ok(quote)
    }

    #[instrument(skip(self, product_id), fields(asin = %product_id))]
    async fn fetch_sample(&self, product_id: &ProductId) -> Result<ProductQuote, PricingError> {
        if let Some(cache) = &self.inner.samples
            && let Some(quote) = cache.get(product_id).await
        {
            debug!("Cache hit for sample quote");
            return Ok(quote);
        }

        let endpoint = self.endpoint(&["products", product_id.as_str()])?;
        let quote: ProductQuote = self.execute(self.request(Method::GET, endpoint)).await?;

        if let Some(cache) = &self.inner.samples {
            cache.insert(product_id.clone(), quote.clone()).await;
        }

        Ok(quote)
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn reconcile_cart(&self, lines: &[CartLine]) -> Result<Cart, PricingError> {
        let endpoint = self.endpoint(&["cart"])?;
        let request = self
            .request(Method::POST, endpoint)
            .json(&ReconcileRequest { items: lines });

        let cart: Cart = self.execute(request).await?;
        debug!(items = cart.item_count(), total = %cart.total, "Cart reconciled");
        Ok(cart)
    }

    #[instrument(skip(self, cart, shipping), fields(items = cart.item_count()))]
    async fn place_order(
        &self,
        cart: &Cart,
        shipping: &ShippingAddress,
    ) -> Result<Order, PricingError> {
        let endpoint = self.endpoint(&["orders"])?;
        let request = self.request(Method::POST, endpoint).json(&PlaceOrderRequest {
            cart,
            shipping,
            payment_method: PaymentMethod::CashOnDelivery,
        });

        let order: Order = self.execute(request).await?;
        debug!(order_id = %order.id, status = %order.status, "Order placed");
        Ok(order)
    }
}

// =============================================================================
// Response Mapping
// =============================================================================

/// Map a non-success response onto the error taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> PricingError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    let reason = || {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    };

    match (status, detail) {
        (StatusCode::UNPROCESSABLE_ENTITY, Some(ErrorDetail::Fields(fields))) => {
            PricingError::ValidationFailed(
                fields
                    .into_iter()
                    .map(FieldDetail::into_field_error)
                    .collect(),
            )
        }
        (StatusCode::UNPROCESSABLE_ENTITY, Some(ErrorDetail::Message(message))) => {
            PricingError::ValidationFailed(vec![FieldError::new("request", message)])
        }
        (StatusCode::UNPROCESSABLE_ENTITY, None) => PricingError::ValidationFailed(Vec::new()),
        (StatusCode::BAD_REQUEST, Some(ErrorDetail::Message(message))) => {
            PricingError::Invalid(message)
        }
        (StatusCode::BAD_REQUEST, _) => PricingError::Invalid(reason()),
        (StatusCode::NOT_FOUND, Some(ErrorDetail::Message(message))) => {
            PricingError::NotFound(message)
        }
        (StatusCode::NOT_FOUND, _) => PricingError::NotFound(reason()),
        _ => PricingError::Unavailable(format!("HTTP {status}: {}", excerpt(body))),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}
