use super::{Campaign, CatalogPage, MarketplaceTransport, PagingPolicy, TransportError};
use crate::models::{PriceUpdate, StockUpdate};
use crate::reconcile::ReconcileParams;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Stocks(Vec<StockUpdate>),
    Prices(Vec<PriceUpdate>),
}

/// In-memory transport that serves canned listing pages and records every call.
///
/// An empty cursor restarts the page sequence, so one mock can back several
/// catalog fetches.
pub struct MockTransport {
    paging: PagingPolicy,
    pages: Vec<CatalogPage>,
    currency: &'static str,
    next_page: Mutex<usize>,
    calls: Mutex<Vec<Call>>,
    fail_list_at: Option<usize>,
    fail_stocks_at: Option<usize>,
    fail_prices_at: Option<usize>,
}

impl MockTransport {
    pub fn new(paging: PagingPolicy) -> Self {
        Self {
            paging,
            pages: Vec::new(),
            currency: "RUB",
            next_page: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
            fail_list_at: None,
            fail_stocks_at: None,
            fail_prices_at: None,
        }
    }

    /// Single-page catalog listing `ids`.
    pub fn with_catalog(self, ids: &[&str]) -> Self {
        let page = CatalogPage {
            offer_ids: ids.iter().map(|id| id.to_string()).collect(),
            total: Some(ids.len() as u64),
            next_cursor: None,
        };
        self.with_pages(vec![page])
    }

    pub fn with_pages(mut self, pages: Vec<CatalogPage>) -> Self {
        self.pages = pages;
        self
    }

    /// Fail the `n`th listing call (0-based, counted across fetches).
    pub fn fail_list_at(mut self, n: usize) -> Self {
        self.fail_list_at = Some(n);
        self
    }

    /// Fail the `n`th stock submission (0-based).
    pub fn fail_stocks_at(mut self, n: usize) -> Self {
        self.fail_stocks_at = Some(n);
        self
    }

    /// Fail the `n`th price submission (0-based).
    pub fn fail_prices_at(mut self, n: usize) -> Self {
        self.fail_prices_at = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stock_batches(&self) -> Vec<Vec<StockUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Stocks(batch) => Some(batch),
                _ => None,
            })
            .collect()
    }

    pub fn price_batches(&self) -> Vec<Vec<PriceUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Prices(batch) => Some(batch),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let kind = std::mem::discriminant(&call);
        let seen = calls
            .iter()
            .filter(|c| std::mem::discriminant(*c) == kind)
            .count();
        calls.push(call);
        seen
    }
}

fn injected() -> TransportError {
    TransportError::Status {
        status: 500,
        body: "injected failure".into(),
    }
}

impl MarketplaceTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn paging(&self) -> PagingPolicy {
        self.paging
    }

    fn reconcile_params(&self, campaign: &Campaign) -> ReconcileParams {
        ReconcileParams {
            warehouse_id: campaign.warehouse_id.clone(),
            currency: self.currency.to_string(),
            updated_at: None,
        }
    }

    async fn list_offers(
        &self,
        cursor: &str,
        _campaign: &Campaign,
    ) -> Result<CatalogPage, TransportError> {
        let nth = self.record(Call::List(cursor.to_string()));
        if self.fail_list_at == Some(nth) {
            return Err(injected());
        }
        let mut next = self.next_page.lock().unwrap();
        if cursor.is_empty() {
            *next = 0;
        }
        let page = self.pages.get(*next).cloned().unwrap_or_default();
        *next += 1;
        Ok(page)
    }

    async fn submit_stocks(
        &self,
        batch: &[StockUpdate],
        _campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let nth = self.record(Call::Stocks(batch.to_vec()));
        if self.fail_stocks_at == Some(nth) {
            return Err(injected());
        }
        Ok(())
    }

    async fn submit_prices(
        &self,
        batch: &[PriceUpdate],
        _campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let nth = self.record(Call::Prices(batch.to_vec()));
        if self.fail_prices_at == Some(nth) {
            return Err(injected());
        }
        Ok(())
    }
}
