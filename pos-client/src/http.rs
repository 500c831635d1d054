//! HTTP client for the POS API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::ApiResponse;
use shared::models::{Branch, Product};
use shared::sale::{CheckoutRequest, TransactionRecord};

use crate::source::{CatalogSource, CheckoutGateway};
use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making requests to the POS API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ClientResult<T> {
        let request = self.authorize(self.client.get(self.url(path)).query(query));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Handle the HTTP response
    ///
    /// Error bodies carrying an [`ApiResponse`] envelope become
    /// [`ClientError::Api`] so the server message reaches the cashier verbatim.
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                && let Err(err) = envelope.into_result()
            {
                return Err(ClientError::Api(err));
            }
            return Err(status_error(status, text));
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Catalog API ==========

    /// `GET api/products?branchId=…`
    pub async fn products(&self, branch_id: &str) -> ClientResult<Vec<Product>> {
        let envelope: ApiResponse<Vec<Product>> = self.get("api/products", &[("branchId", branch_id)]).await?;
        Ok(envelope.into_result().map_err(ClientError::Api)?.unwrap_or_default())
    }

    /// `GET api/branches?active=true`
    pub async fn active_branches(&self) -> ClientResult<Vec<Branch>> {
        let envelope: ApiResponse<Vec<Branch>> = self.get("api/branches", &[("active", "true")]).await?;
        let branches = envelope.into_result().map_err(ClientError::Api)?.unwrap_or_default();
        Ok(branches.into_iter().filter(|b| b.is_active).collect())
    }

    // ========== Transactions API ==========

    /// `POST api/transactions`
    pub async fn create_transaction(&self, request: &CheckoutRequest) -> ClientResult<TransactionRecord> {
        let envelope: ApiResponse<TransactionRecord> = self.post("api/transactions", request).await?;
        envelope
            .into_result()
            .map_err(ClientError::Api)?
            .ok_or_else(|| ClientError::InvalidResponse("Missing transaction data".to_string()))
    }
}

fn status_error(status: StatusCode, text: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden(text),
        StatusCode::NOT_FOUND => ClientError::NotFound(text),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(text),
        _ => ClientError::Internal(text),
    }
}

#[async_trait]
impl CatalogSource for HttpClient {
    async fn fetch_products(&self, branch_id: &str) -> ClientResult<Vec<Product>> {
        self.products(branch_id).await
    }

    async fn fetch_branches(&self) -> ClientResult<Vec<Branch>> {
        self.active_branches().await
    }
}

#[async_trait]
impl CheckoutGateway for HttpClient {
    async fn submit(&self, request: &CheckoutRequest) -> ClientResult<TransactionRecord> {
        self.create_transaction(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let client = HttpClient::new(&ClientConfig::new("http://pos.local/")).unwrap();
        assert_eq!(client.url("api/products"), "http://pos.local/api/products");
        assert_eq!(client.url("/api/branches"), "http://pos.local/api/branches");
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad".to_string()),
            ClientError::Validation(msg) if msg == "bad"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, String::new()),
            ClientError::Internal(_)
        ));
    }
}
