use crate::batch::{BatchSize, partition};
use crate::catalog::fetch_offer_ids;
use crate::config::ConfigError;
use crate::marketplace::{Campaign, MarketplaceTransport, TransportError};
use crate::models::{PriceUpdate, StockUpdate, SupplierRecord};
use crate::normalize::FormatError;
use crate::reconcile::{ReconcileParams, Reconciliation, reconcile};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    #[default]
    Live,
    /// Reconcile and partition, but never call the update endpoints.
    DryRun,
}

#[derive(Debug, Clone)]
pub struct StockUploadResult {
    pub updates: Vec<StockUpdate>,
    pub matched: usize,
    pub zeroed: usize,
    pub batches: usize,
}

impl StockUploadResult {
    /// Offers left with a non-zero count after the upload.
    pub fn in_stock(&self) -> Vec<&StockUpdate> {
        self.updates.iter().filter(|update| update.count != 0).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PriceUploadResult {
    pub updates: Vec<PriceUpdate>,
    pub batches: usize,
}

/// Pushes stock counts for every catalog offer of `campaign`.
///
/// Only quantities are normalized; a bad price cell does not stop this upload.
pub async fn upload_stocks<T>(
    transport: &T,
    records: &[SupplierRecord],
    campaign: &Campaign,
    ceiling: BatchSize,
    mode: SubmitMode,
) -> Result<StockUploadResult, UploadError>
where
    T: MarketplaceTransport,
{
    let (reconciliation, params) = reconcile_campaign(transport, records, campaign).await?;
    let stocks = reconciliation.stock_updates(&params)?;
    let matched = reconciliation.matched();
    let zeroed = reconciliation.zeroed();

    let batches = submit_batches(transport.name(), "stocks", &stocks, ceiling, mode, |batch| {
        transport.submit_stocks(batch, campaign)
    })
    .await?;

    info!(
        target = "stocksync.upload",
        marketplace = transport.name(),
        campaign = %campaign.id,
        updates = stocks.len(),
        matched,
        zeroed,
        batches,
        "stocks uploaded"
    );
    Ok(StockUploadResult {
        updates: stocks,
        matched,
        zeroed,
        batches,
    })
}

/// Pushes prices for catalog offers that have a feed record.
pub async fn upload_prices<T>(
    transport: &T,
    records: &[SupplierRecord],
    campaign: &Campaign,
    ceiling: BatchSize,
    mode: SubmitMode,
) -> Result<PriceUploadResult, UploadError>
where
    T: MarketplaceTransport,
{
    let (reconciliation, params) = reconcile_campaign(transport, records, campaign).await?;
    let prices = reconciliation.price_updates(&params)?;

    let batches = submit_batches(transport.name(), "prices", &prices, ceiling, mode, |batch| {
        transport.submit_prices(batch, campaign)
    })
    .await?;

    info!(
        target = "stocksync.upload",
        marketplace = transport.name(),
        campaign = %campaign.id,
        updates = prices.len(),
        batches,
        "prices uploaded"
    );
    Ok(PriceUploadResult {
        updates: prices,
        batches,
    })
}

async fn reconcile_campaign<'a, T>(
    transport: &T,
    records: &'a [SupplierRecord],
    campaign: &Campaign,
) -> Result<(Reconciliation<'a>, ReconcileParams), TransportError>
where
    T: MarketplaceTransport,
{
    let catalog = fetch_offer_ids(transport, campaign).await?;
    let params = transport.reconcile_params(campaign);
    Ok((reconcile(records, catalog), params))
}

/// Sends `items` in order, one batch at a time; the first failure stops the rest.
async fn submit_batches<'a, I, F, Fut>(
    marketplace: &'static str,
    operation: &'static str,
    items: &'a [I],
    ceiling: BatchSize,
    mode: SubmitMode,
    mut submit: F,
) -> Result<usize, UploadError>
where
    F: FnMut(&'a [I]) -> Fut,
    Fut: Future<Output = Result<(), TransportError>>,
{
    let mut sent = 0usize;
    for (index, batch) in partition(items, ceiling.get())?.enumerate() {
        if mode == SubmitMode::Live {
            submit(batch).await?;
        }
        crate::metrics::batch_submitted(marketplace, operation, batch.len(), mode);
        debug!(
            target = "stocksync.upload",
            marketplace,
            operation,
            batch = index,
            size = batch.len(),
            dry_run = mode == SubmitMode::DryRun,
            "batch done"
        );
        sent += 1;
    }
    Ok(sent)
}
