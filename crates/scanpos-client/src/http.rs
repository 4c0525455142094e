//! HTTP implementation of the backend traits.
//!
//! | Operation       | Request                          |
//! |-----------------|----------------------------------|
//! | product lookup  | `GET  {base}api/v1/products/{code}` |
//! | trade creation  | `POST {base}api/v1/trades`          |

use async_trait::async_trait;
use reqwest::Client;
use scanpos_core::validation::validate_product_code;
use scanpos_core::{Product, TradeCreateRequest, TradeResponse};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};
use crate::{ProductCatalog, TradeGateway};

pub const PRODUCTS_PATH: &str = "api/v1/products/";
pub const TRADES_PATH: &str = "api/v1/trades";

pub struct HttpBackend {
    client: Client,
    base: Url,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> ClientResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(HttpBackend {
            client,
            base: config.base()?,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout_secs)
        } else {
            err.into()
        }
    }

    /// Decodes a success body or maps the failure.
    async fn read<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        lookup_code: Option<&str>,
    ) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::DeserializationFailed(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body, lookup_code))
    }
}

#[async_trait]
impl ProductCatalog for HttpBackend {
    async fn get_product_by_code(&self, code: &str) -> ClientResult<Product> {
        let code = code.trim();
        validate_product_code(code)?;

        let url = self.base.join(PRODUCTS_PATH)?.join(code)?;
        debug!(%url, "Looking up product");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let product: Product = self.read(response, Some(code)).await.inspect_err(|e| {
            if !e.is_not_found() {
                warn!(code, error = %e, "Product lookup failed");
            }
        })?;
        debug!(code, prd_id = product.prd_id, "Product found");
        Ok(product)
    }
}

#[async_trait]
impl TradeGateway for HttpBackend {
    async fn create_trade(&self, request: &TradeCreateRequest) -> ClientResult<TradeResponse> {
        let url = self.base.join(TRADES_PATH)?;
        debug!(%url, lines = request.trade_lines.len(), "Submitting trade");

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let trade: TradeResponse = self.read(response, None).await?;
        info!(
            trade_id = trade.trade_id,
            total_amt = trade.total_amt,
            tax_amt = trade.tax_amt,
            "Trade registered"
        );
        Ok(trade)
    }
}
