use crate::batch::BatchSize;
use crate::config::Config;
use crate::marketplace::{Campaign, MarketplaceTransport, OzonClient, TransportError, YandexClient};
use crate::models::{FailureReport, StageReport, SupplierRecord, SyncReport};
use crate::upload::{SubmitMode, UploadError, upload_prices, upload_stocks};
use serde::Serialize;
use serde_json::{Value, json};
use std::{future::Future, time::Instant};
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

pub struct Pipeline {
    config: Config,
}

/// One campaign of one marketplace, with the ceilings used by the scheduled run.
#[derive(Debug, Clone)]
pub struct CampaignPlan {
    pub target: String,
    pub campaign: Campaign,
    pub stock_batch: BatchSize,
    pub price_batch: BatchSize,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn mode(&self) -> SubmitMode {
        if self.config.dry_run {
            SubmitMode::DryRun
        } else {
            SubmitMode::Live
        }
    }

    /// Syncs every configured campaign in turn. A failing campaign stops its
    /// own remaining stages only; the next campaign still runs.
    pub async fn run(&self, records: &[SupplierRecord]) -> SyncReport {
        let run_id = Uuid::new_v4();
        let mut report = SyncReport {
            run_id,
            dry_run: self.config.dry_run,
            stages: Vec::new(),
            failures: Vec::new(),
        };
        let span = info_span!("sync", run_id = %run_id);

        async {
            info!(
                target = "stocksync.pipeline",
                records = records.len(),
                dry_run = self.config.dry_run,
                "sync started"
            );

            if let Some(ozon) = &self.config.ozon {
                let client = OzonClient::new(ozon, &self.config.http);
                debug!(
                    target = "stocksync.pipeline",
                    stock_batch = %ozon.ceilings.stock_batch,
                    price_batch = %ozon.ceilings.run_price_batch,
                    held_price_batch = %ozon.ceilings.price_batch,
                    "ozon ceilings"
                );
                let plan = CampaignPlan {
                    target: "ozon".to_string(),
                    campaign: Campaign::new(&ozon.client_id),
                    stock_batch: ozon.ceilings.stock_batch,
                    price_batch: ozon.ceilings.run_price_batch,
                };
                self.sync_target(&client, records, &plan, &mut report).await;
            }

            if let Some(yandex) = &self.config.yandex {
                let client = YandexClient::new(yandex, &self.config.http);
                for entry in &yandex.campaigns {
                    let plan = CampaignPlan {
                        target: format!("yandex.{}", entry.label),
                        campaign: Campaign::new(&entry.campaign_id)
                            .with_warehouse(&entry.warehouse_id),
                        stock_batch: yandex.ceilings.stock_batch,
                        price_batch: yandex.ceilings.price_batch,
                    };
                    self.sync_target(&client, records, &plan, &mut report).await;
                }
            }

            info!(
                target = "stocksync.pipeline",
                stages = report.stages.len(),
                failures = report.failures.len(),
                "sync finished"
            );
        }
        .instrument(span)
        .await;

        report
    }

    async fn sync_target<T>(
        &self,
        transport: &T,
        records: &[SupplierRecord],
        plan: &CampaignPlan,
        report: &mut SyncReport,
    ) where
        T: MarketplaceTransport,
    {
        if let Err(err) =
            sync_campaign(transport, records, plan, self.mode(), &mut report.stages).await
        {
            error!(
                target = "stocksync.pipeline",
                target_name = %plan.target,
                stage = %err.stage(),
                kind = err.kind().as_str(),
                error = %err,
                "campaign sync aborted"
            );
            report.failures.push(FailureReport {
                target: plan.target.clone(),
                stage: err.stage().to_string(),
                kind: err.kind(),
                detail: err.detail().to_string(),
            });
        }
    }
}

/// Stocks then prices for one campaign; the first error skips the rest.
pub async fn sync_campaign<T>(
    transport: &T,
    records: &[SupplierRecord],
    plan: &CampaignPlan,
    mode: SubmitMode,
    stages: &mut Vec<StageReport>,
) -> Result<(), PipelineError>
where
    T: MarketplaceTransport,
{
    let stock_stage = format!("{}.stocks", plan.target);
    capture_stage(&stock_stage, stages, async {
        upload_stocks(transport, records, &plan.campaign, plan.stock_batch, mode)
            .await
            .map_err(|err| PipelineError::from_upload(&stock_stage, err))
            .map(|result| {
                json!({
                    "campaign": plan.campaign.id,
                    "updates": result.updates.len(),
                    "matched": result.matched,
                    "zeroed": result.zeroed,
                    "in_stock": result.in_stock().len(),
                    "batches": result.batches,
                    "batch_size": plan.stock_batch.get(),
                })
            })
    })
    .await?;

    let price_stage = format!("{}.prices", plan.target);
    capture_stage(&price_stage, stages, async {
        upload_prices(transport, records, &plan.campaign, plan.price_batch, mode)
            .await
            .map_err(|err| PipelineError::from_upload(&price_stage, err))
            .map(|result| {
                json!({
                    "campaign": plan.campaign.id,
                    "updates": result.updates.len(),
                    "batches": result.batches,
                    "batch_size": plan.price_batch.get(),
                })
            })
    })
    .await
}

/// Runs one stage and records its JSON summary; failed stages leave no report.
async fn capture_stage<Fut>(
    name: &str,
    stages: &mut Vec<StageReport>,
    fut: Fut,
) -> Result<(), PipelineError>
where
    Fut: Future<Output = Result<Value, PipelineError>>,
{
    let started = Instant::now();
    let output = fut.await?;
    let elapsed_ms = started.elapsed().as_millis();
    crate::metrics::stage_elapsed(name, elapsed_ms);
    stages.push(StageReport::new(name, elapsed_ms, output));
    Ok(())
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: String,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrorKind {
    Timeout,
    Connection,
    InvalidInput,
    Internal,
}

impl PipelineErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl PipelineError {
    pub fn from_upload(stage: &str, err: UploadError) -> Self {
        let kind = match &err {
            UploadError::Transport(TransportError::Timeout(_)) => PipelineErrorKind::Timeout,
            UploadError::Transport(TransportError::Connect(_)) => PipelineErrorKind::Connection,
            UploadError::Format(_) | UploadError::Config(_) => PipelineErrorKind::InvalidInput,
            UploadError::Transport(_) => PipelineErrorKind::Internal,
        };
        Self {
            stage: stage.to_string(),
            message: err.to_string(),
            kind,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}
