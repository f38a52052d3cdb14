use crate::catalog::CatalogOfferSet;
use crate::models::{OfferId, PriceUpdate, StockUpdate, SupplierRecord};
use crate::normalize::{FormatError, normalize_price, normalize_quantity};
use chrono::{DateTime, Utc};

/// Per-campaign values stamped onto every generated update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileParams {
    pub warehouse_id: Option<String>,
    pub currency: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Feed records matched against one catalog snapshot.
///
/// Quantities and prices are normalized only when the matching update list is
/// built, so a malformed price never blocks a stock upload and vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation<'a> {
    /// Feed order.
    matched: Vec<&'a SupplierRecord>,
    /// Catalog order.
    unmatched: Vec<OfferId>,
}

impl<'a> Reconciliation<'a> {
    pub fn matched(&self) -> usize {
        self.matched.len()
    }

    pub fn zeroed(&self) -> usize {
        self.unmatched.len()
    }

    /// One update per catalog offer: matched offers first, then zeroed ones.
    pub fn stock_updates(&self, params: &ReconcileParams) -> Result<Vec<StockUpdate>, FormatError> {
        let mut stocks = Vec::with_capacity(self.matched.len() + self.unmatched.len());
        for record in &self.matched {
            let count = normalize_quantity(&record.raw_quantity)?;
            stocks.push(stock_update(params, record.code.clone(), count));
        }
        stocks.extend(
            self.unmatched
                .iter()
                .map(|offer_id| stock_update(params, offer_id.clone(), 0)),
        );
        Ok(stocks)
    }

    /// Prices for matched offers only.
    pub fn price_updates(&self, params: &ReconcileParams) -> Result<Vec<PriceUpdate>, FormatError> {
        self.matched
            .iter()
            .map(|record| {
                Ok(PriceUpdate {
                    offer_id: record.code.clone(),
                    value: normalize_price(&record.raw_price)?,
                    currency: params.currency.clone(),
                })
            })
            .collect()
    }
}

/// Matches feed records against a catalog snapshot.
///
/// Each catalog offer ends up either matched or unmatched, never both. A code
/// repeated in the feed matches once; later repeats are ignored.
pub fn reconcile(records: &[SupplierRecord], mut catalog: CatalogOfferSet) -> Reconciliation<'_> {
    let matched = records
        .iter()
        .filter(|record| catalog.take(&record.code))
        .collect();
    Reconciliation {
        matched,
        unmatched: catalog.into_iter().collect(),
    }
}

fn stock_update(params: &ReconcileParams, offer_id: String, count: u32) -> StockUpdate {
    StockUpdate {
        offer_id,
        warehouse_id: params.warehouse_id.clone(),
        count,
        updated_at: params.updated_at,
    }
}
