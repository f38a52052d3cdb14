pub mod ozon;
pub mod yandex;

#[cfg(test)]
pub mod mock;

pub use ozon::OzonClient;
pub use yandex::YandexClient;

use crate::models::{OfferId, PriceUpdate, StockUpdate};
use crate::reconcile::ReconcileParams;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// How the listing endpoint signals that the last page was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingPolicy {
    /// Stop once the accumulated item count reaches the reported total.
    TotalCount,
    /// Stop when the next-page cursor comes back empty or absent.
    NextCursor,
}

/// One page of the offer listing, already reduced to offer ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPage {
    pub offer_ids: Vec<OfferId>,
    pub total: Option<u64>,
    pub next_cursor: Option<String>,
}

/// Store or account scope for catalog and update calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    pub id: String,
    pub warehouse_id: Option<String>,
}

impl Campaign {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            warehouse_id: None,
        }
    }

    pub fn with_warehouse(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }
}

/// Authenticated RPC surface of one marketplace.
///
/// Implementations own the wire schema; the update types they receive are
/// marketplace-agnostic.
#[allow(async_fn_in_trait)]
pub trait MarketplaceTransport {
    fn name(&self) -> &'static str;

    fn paging(&self) -> PagingPolicy;

    /// Warehouse, currency and timestamp policy for updates sent to `campaign`.
    fn reconcile_params(&self, campaign: &Campaign) -> ReconcileParams;

    async fn list_offers(
        &self,
        cursor: &str,
        campaign: &Campaign,
    ) -> Result<CatalogPage, TransportError>;

    async fn submit_stocks(
        &self,
        batch: &[StockUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError>;

    async fn submit_prices(
        &self,
        batch: &[PriceUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError>;
}
