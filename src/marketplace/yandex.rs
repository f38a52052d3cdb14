use super::{Campaign, CatalogPage, MarketplaceTransport, PagingPolicy, TransportError};
use crate::config::{HttpSettings, YandexSettings};
use crate::http::{build_client, ensure_success};
use crate::models::{PriceUpdate, StockUpdate};
use crate::reconcile::ReconcileParams;
use chrono::{DateTime, SubsecRound, Utc};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

const PAGE_LIMIT: u32 = 200;
const CURRENCY: &str = "RUR";
const STOCK_TYPE: &str = "FIT";

/// Yandex Market Partner API, scoped per campaign (FBS or DBS store).
#[derive(Debug, Clone)]
pub struct YandexClient {
    http: Client,
    base_url: String,
    token: String,
}

impl YandexClient {
    pub fn new(settings: &YandexSettings, http: &HttpSettings) -> Self {
        Self {
            http: build_client(http),
            base_url: settings.base_url.clone(),
            token: settings.token.clone(),
        }
    }

    fn campaign_url(&self, campaign: &Campaign, tail: &str) -> String {
        format!(
            "{}/campaigns/{}/{tail}",
            self.base_url,
            encode(&campaign.id)
        )
    }

    async fn send<B>(&self, method: Method, url: String, body: &B) -> Result<(), TransportError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MappingResponse {
    result: MappingResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappingResult {
    #[serde(default)]
    paging: Option<Paging>,
    #[serde(default)]
    offer_mapping_entries: Vec<MappingEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Paging {
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MappingEntry {
    offer: MappedOffer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MappedOffer {
    shop_sku: String,
}

#[derive(Debug, Serialize)]
struct StocksRequest<'a> {
    skus: Vec<SkuStock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkuStock<'a> {
    sku: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse_id: Option<&'a str>,
    items: [StockItem; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StockItem {
    count: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct PricesRequest<'a> {
    offers: Vec<OfferPrice<'a>>,
}

#[derive(Debug, Serialize)]
struct OfferPrice<'a> {
    id: &'a str,
    price: PriceValue<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceValue<'a> {
    value: u64,
    currency_id: &'a str,
}

impl MarketplaceTransport for YandexClient {
    fn name(&self) -> &'static str {
        "yandex"
    }

    fn paging(&self) -> PagingPolicy {
        PagingPolicy::NextCursor
    }

    fn reconcile_params(&self, campaign: &Campaign) -> ReconcileParams {
        ReconcileParams {
            warehouse_id: campaign.warehouse_id.clone(),
            currency: CURRENCY.to_string(),
            updated_at: Some(Utc::now().trunc_subsecs(0)),
        }
    }

    async fn list_offers(
        &self,
        cursor: &str,
        campaign: &Campaign,
    ) -> Result<CatalogPage, TransportError> {
        let limit = PAGE_LIMIT.to_string();
        let response = self
            .http
            .get(self.campaign_url(campaign, "offer-mapping-entries"))
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[("page_token", cursor), ("limit", limit.as_str())])
            .send()
            .await?;
        let payload: MappingResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        let result = payload.result;
        Ok(CatalogPage {
            offer_ids: result
                .offer_mapping_entries
                .into_iter()
                .map(|entry| entry.offer.shop_sku)
                .collect(),
            total: None,
            next_cursor: result.paging.and_then(|paging| paging.next_page_token),
        })
    }

    async fn submit_stocks(
        &self,
        batch: &[StockUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let request = StocksRequest {
            skus: batch
                .iter()
                .map(|update| SkuStock {
                    sku: &update.offer_id,
                    warehouse_id: update.warehouse_id.as_deref(),
                    items: [StockItem {
                        count: update.count,
                        kind: STOCK_TYPE,
                        updated_at: update.updated_at,
                    }],
                })
                .collect(),
        };
        self.send(
            Method::PUT,
            self.campaign_url(campaign, "offers/stocks"),
            &request,
        )
        .await
    }

    async fn submit_prices(
        &self,
        batch: &[PriceUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let request = PricesRequest {
            offers: batch
                .iter()
                .map(|update| OfferPrice {
                    id: &update.offer_id,
                    price: PriceValue {
                        value: update.value,
                        currency_id: &update.currency,
                    },
                })
                .collect(),
        };
        self.send(
            Method::POST,
            self.campaign_url(campaign, "offer-prices/updates"),
            &request,
        )
        .await
    }
}
