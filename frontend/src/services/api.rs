use gloo::net::http::{Request, RequestBuilder, Response};
use serde::Deserialize;
use shared::{
    BalanceResponse, Category, CreateTransactionRequest, Transaction, TransactionId,
    TransactionType, UpdateTransactionRequest,
};
use thiserror::Error;

/// Failure taxonomy for server calls. Missing authentication is fatal and
/// blocks every call; transport failures and server rejections both feed the
/// same rollback path in the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Authentication data is missing. Please restart the app inside Telegram.")]
    MissingAuth,
    #[error("Network error: {0}")]
    Network(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Error body shape the backend returns for rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// API client for the mini-app backend. Every request carries the Telegram
/// init data in the `X-Telegram-InitData` header; the backend authenticates
/// each call from it.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    init_data: Option<String>,
    timezone_offset_minutes: i32,
}

impl ApiClient {
    pub fn new(init_data: Option<String>) -> Self {
        Self {
            base_url: String::new(),
            init_data,
            timezone_offset_minutes: js_sys::Date::new_0().get_timezone_offset() as i32,
        }
    }

    /// Mostly for tests against a local backend.
    pub fn with_base_url(base_url: String, init_data: Option<String>) -> Self {
        Self {
            base_url,
            init_data,
            timezone_offset_minutes: 0,
        }
    }

    pub fn has_auth(&self) -> bool {
        self.init_data.as_deref().map(|d| !d.is_empty()).unwrap_or(false)
    }

    pub async fn list_transactions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>, ApiError> {
        let url = format!(
            "{}/transactions?limit={}&offset={}",
            self.base_url, limit, offset
        );
        let response = self.send(Request::get(&url)).await?;
        Self::parse(response).await
    }

    pub async fn get_balance(&self) -> Result<f64, ApiError> {
        let url = format!("{}/balance", self.base_url);
        let response = self.send(Request::get(&url)).await?;
        let body: BalanceResponse = Self::parse(response).await?;
        Ok(body.balance)
    }

    /// The backend serves categories one type at a time; fetch both and
    /// merge, like the webapp always has.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut categories = self.list_categories_of(TransactionType::Expense).await?;
        categories.extend(self.list_categories_of(TransactionType::Income).await?);
        Ok(categories)
    }

    async fn list_categories_of(
        &self,
        category_type: TransactionType,
    ) -> Result<Vec<Category>, ApiError> {
        let url = format!("{}/categories?type={}", self.base_url, category_type);
        let response = self.send(Request::get(&url)).await?;
        Self::parse(response).await
    }

    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        let url = format!("{}/transactions", self.base_url);
        let builder = self.authorized(Request::post(&url))?;
        let response = builder
            .json(request)
            .map_err(|e| ApiError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse(response).await
    }

    pub async fn update_transaction(
        &self,
        id: TransactionId,
        request: &UpdateTransactionRequest,
    ) -> Result<Transaction, ApiError> {
        let url = format!("{}/transactions/{}", self.base_url, id);
        let builder = self.authorized(Request::patch(&url))?;
        let response = builder
            .json(request)
            .map_err(|e| ApiError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse(response).await
    }

    pub async fn delete_transaction(&self, id: TransactionId) -> Result<(), ApiError> {
        let url = format!("{}/transactions/{}", self.base_url, id);
        let response = self.send(Request::delete(&url)).await?;
        if response.ok() {
            Ok(())
        } else {
            Err(Self::rejection(response).await)
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorized(builder)?
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(response)
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let init_data = self
            .init_data
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(ApiError::MissingAuth)?;
        Ok(builder
            .header("X-Telegram-InitData", init_data)
            .header(
                "X-Timezone-Offset",
                &self.timezone_offset_minutes.to_string(),
            ))
    }

    async fn parse<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, ApiError> {
        if !response.ok() {
            return Err(Self::rejection(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to parse response: {}", e)))
    }

    async fn rejection(response: Response) -> ApiError {
        let status = response.status();
        if status == 403 {
            return ApiError::Rejected {
                status,
                message: "Authentication failed. Please restart the app inside Telegram."
                    .to_string(),
            };
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body
                .detail
                .or(body.message)
                .unwrap_or_else(|| format!("Server error {}", status)),
            Err(_) => format!("Server error {}", status),
        };
        ApiError::Rejected { status, message }
    }
}
