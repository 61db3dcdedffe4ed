use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

use crate::domain::{NewSale, SaleRecord};

use super::{SalesStore, StoreError};

/// Client for the REST sales service.
///
/// Routes, relative to the base URL:
/// - `GET /sales`
/// - `POST /sales`
/// - `PUT /sales/{buyer}/{date}`
/// - `DELETE /sales/{buyer}/{date}`
/// - `DELETE /sales/reset/{buyer}/{timestamp}`
pub struct HttpSalesStore {
    client: Client,
    base_url: Url,
}

impl HttpSalesStore {
    /// Build a client for the service at `base_url`. Every request is bounded
    /// by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Backend(anyhow::anyhow!("Invalid API URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "API URL '{}' cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?;

        Ok(Self { client, base_url })
    }

    /// `{base}/sales/{segments..}` with every segment percent-encoded.
    fn sales_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("sales").extend(segments);
        }
        url
    }

    fn sale_url(&self, buyer: &str, date: NaiveDate) -> Url {
        let day = date.format("%Y-%m-%d").to_string();
        self.sales_url(&[buyer, &day])
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Decode(err.to_string())
    } else if err.is_connect() || err.is_timeout() || err.is_request() {
        StoreError::Unreachable(err.to_string())
    } else {
        StoreError::Backend(anyhow::Error::new(err))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        StatusCode::CONFLICT => Err(StoreError::Conflict),
        _ => Err(StoreError::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

#[async_trait]
impl SalesStore for HttpSalesStore {
    async fn list(&self) -> Result<Vec<SaleRecord>, StoreError> {
        let url = self.sales_url(&[]);
        tracing::debug!(%url, "GET sales");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check_status(response)
            .await?
            .json::<Vec<SaleRecord>>()
            .await
            .map_err(transport_error)
    }

    async fn create(&self, sale: &NewSale) -> Result<(), StoreError> {
        let url = self.sales_url(&[]);
        tracing::debug!(%url, buyer = %sale.buyer, date = %sale.date, "POST sale");

        let response = self
            .client
            .post(url)
            .json(sale)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn update_quantity(
        &self,
        buyer: &str,
        date: NaiveDate,
        quantity: f64,
    ) -> Result<(), StoreError> {
        let url = self.sale_url(buyer, date);
        tracing::debug!(%url, quantity, "PUT sale quantity");

        let response = self
            .client
            .put(url)
            .json(&serde_json::json!({ "quantity": quantity }))
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, buyer: &str, date: NaiveDate) -> Result<(), StoreError> {
        let url = self.sale_url(buyer, date);
        tracing::debug!(%url, "DELETE sale");

        let response = self.client.delete(url).send().await.map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn reset(&self, buyer: &str, as_of: DateTime<Utc>) -> Result<(), StoreError> {
        let timestamp = as_of.to_rfc3339_opts(SecondsFormat::Millis, true);
        let url = self.sales_url(&["reset", buyer, &timestamp]);
        tracing::debug!(%url, "DELETE sales up to date");

        let response = self.client.delete(url).send().await.map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}
