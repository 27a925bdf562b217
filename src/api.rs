use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{header, Method, Request, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{GastosError, Result};
use crate::filter::FilterSpec;
use crate::models::{ExpenseRecord, InstallmentExpense, PaymentType, RecordId, SimpleExpense};

const API_PREFIX: &str = "api/ctrl_gastos";

/// Remote CRUD store for expenses.
#[allow(async_fn_in_trait)]
pub trait ExpenseApi {
    /// Records matching `spec`; the server does the filtering.
    async fn filter(&self, spec: &FilterSpec) -> Result<Vec<ExpenseRecord>>;
    /// Create a single payment and return the id the store assigned.
    async fn create(&self, expense: &SimpleExpense) -> Result<RecordId>;
    /// Create an installment purchase.
    async fn create_installment(&self, expense: &InstallmentExpense) -> Result<()>;
    async fn delete(&self, id: &RecordId) -> Result<()>;
    async fn payment_types(&self) -> Result<Vec<PaymentType>>;
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// [`ExpenseApi`] over HTTP(S) with JSON bodies.
pub struct HttpApi {
    client: HttpsClient,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https);
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{API_PREFIX}/{endpoint}",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, method: Method, endpoint: &str, body: Option<Bytes>) -> Result<(StatusCode, Bytes)> {
        let url = self.url(endpoint);
        debug!(%method, %url, "sending request");
        let mut builder = Request::builder().method(method).uri(&url);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let req = builder
            .body(Full::new(body.unwrap_or_default()))
            .map_err(|e| GastosError::Http(e.to_string()))?;
        let res = self.client.request(req).await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            GastosError::Http(e.to_string())
        })?;
        let status = res.status();
        let bytes = res
            .into_body()
            .collect()
            .await
            .map_err(|e| GastosError::Http(e.to_string()))?
            .to_bytes();
        debug!(%url, status = status.as_u16(), len = bytes.len(), "response received");
        Ok((status, bytes))
    }

    async fn post_json<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<(StatusCode, Bytes)> {
        let payload = serde_json::to_vec(body)?;
        self.send(Method::POST, endpoint, Some(Bytes::from(payload))).await
    }
}

fn ensure_success(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        warn!(status = status.as_u16(), "server returned an error status");
        Err(GastosError::Status(status.as_u16()))
    }
}

impl ExpenseApi for HttpApi {
    async fn filter(&self, spec: &FilterSpec) -> Result<Vec<ExpenseRecord>> {
        let (status, bytes) = self.post_json("filter", &spec.to_body()).await?;
        ensure_success(status)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn create(&self, expense: &SimpleExpense) -> Result<RecordId> {
        let (status, bytes) = self.post_json("create", expense).await?;
        ensure_success(status)?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        match body.get("id") {
            Some(id) if !id.is_null() && id.as_str() != Some("") => {
                Ok(serde_json::from_value(id.clone())?)
            }
            _ => Err(GastosError::Rejected(
                "the server did not return an id for the new record".into(),
            )),
        }
    }

    async fn create_installment(&self, expense: &InstallmentExpense) -> Result<()> {
        let (status, _) = self.post_json("create_msi", expense).await?;
        ensure_success(status)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let (status, bytes) = self.post_json("delete", &json!({ "id": id })).await?;
        ensure_success(status)?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        if body["status"].as_u64() == Some(200) {
            Ok(())
        } else {
            Err(GastosError::Rejected(format!("delete of {id} was not confirmed")))
        }
    }

    async fn payment_types(&self) -> Result<Vec<PaymentType>> {
        let (status, bytes) = self.send(Method::GET, "tipo_pago", None).await?;
        ensure_success(status)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
