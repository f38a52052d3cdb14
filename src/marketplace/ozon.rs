use super::{Campaign, CatalogPage, MarketplaceTransport, PagingPolicy, TransportError};
use crate::config::{HttpSettings, OzonSettings};
use crate::http::{build_client, ensure_success};
use crate::models::{PriceUpdate, StockUpdate};
use crate::reconcile::ReconcileParams;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

const PAGE_LIMIT: u32 = 1000;
const CURRENCY: &str = "RUB";

/// Ozon Seller API. The campaign id is the seller's `Client-Id`.
#[derive(Debug, Clone)]
pub struct OzonClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OzonClient {
    pub fn new(settings: &OzonSettings, http: &HttpSettings) -> Self {
        Self {
            http: build_client(http),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    async fn post<B, R>(&self, path: &str, campaign: &Campaign, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(url)
            .header("Client-Id", &campaign.id)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        response
            .json()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ListRequest<'a> {
    filter: ListFilter,
    last_id: &'a str,
    limit: u32,
}

#[derive(Debug, Serialize)]
struct ListFilter {
    visibility: &'static str,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    result: ListResult,
}

#[derive(Debug, Deserialize)]
struct ListResult {
    #[serde(default)]
    items: Vec<ListItem>,
    total: Option<u64>,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    offer_id: String,
}

#[derive(Debug, Serialize)]
struct StocksRequest<'a> {
    stocks: Vec<StockRow<'a>>,
}

#[derive(Debug, Serialize)]
struct StockRow<'a> {
    offer_id: &'a str,
    stock: u32,
}

#[derive(Debug, Serialize)]
struct PricesRequest<'a> {
    prices: Vec<PriceRow<'a>>,
}

#[derive(Debug, Serialize)]
struct PriceRow<'a> {
    auto_action_enabled: &'static str,
    currency_code: &'a str,
    offer_id: &'a str,
    old_price: &'static str,
    price: String,
}

impl MarketplaceTransport for OzonClient {
    fn name(&self) -> &'static str {
        "ozon"
    }

    fn paging(&self) -> PagingPolicy {
        PagingPolicy::TotalCount
    }

    fn reconcile_params(&self, campaign: &Campaign) -> ReconcileParams {
        ReconcileParams {
            warehouse_id: campaign.warehouse_id.clone(),
            currency: CURRENCY.to_string(),
            updated_at: None,
        }
    }

    async fn list_offers(
        &self,
        cursor: &str,
        campaign: &Campaign,
    ) -> Result<CatalogPage, TransportError> {
        let request = ListRequest {
            filter: ListFilter { visibility: "ALL" },
            last_id: cursor,
            limit: PAGE_LIMIT,
        };
        let ListResponse { result } = self.post("/v2/product/list", campaign, &request).await?;
        Ok(CatalogPage {
            offer_ids: result.items.into_iter().map(|item| item.offer_id).collect(),
            total: result.total,
            next_cursor: result.last_id,
        })
    }

    async fn submit_stocks(
        &self,
        batch: &[StockUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let request = StocksRequest {
            stocks: batch
                .iter()
                .map(|update| StockRow {
                    offer_id: &update.offer_id,
                    stock: update.count,
                })
                .collect(),
        };
        let _: serde_json::Value = self
            .post("/v1/product/import/stocks", campaign, &request)
            .await?;
        Ok(())
    }

    async fn submit_prices(
        &self,
        batch: &[PriceUpdate],
        campaign: &Campaign,
    ) -> Result<(), TransportError> {
        let request = PricesRequest {
            prices: batch
                .iter()
                .map(|update| PriceRow {
                    auto_action_enabled: "UNKNOWN",
                    currency_code: &update.currency,
                    offer_id: &update.offer_id,
                    old_price: "0",
                    price: update.value.to_string(),
                })
                .collect(),
        };
        let _: serde_json::Value = self
            .post("/v1/product/import/prices", campaign, &request)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fetch_offer_ids;
    use crate::config::OzonCeilings;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> OzonClient {
        let settings = OzonSettings {
            base_url: server.base_url(),
            client_id: "123".into(),
            api_key: "secret".into(),
            ceilings: OzonCeilings::default(),
        };
        OzonClient::new(&settings, &HttpSettings::default())
    }

    #[tokio::test]
    async fn lists_catalog_until_total() {
        let server = MockServer::start_async().await;
        let first = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/product/list")
                    .header("Client-Id", "123")
                    .header("Api-Key", "secret")
                    .json_body(json!({"filter": {"visibility": "ALL"}, "last_id": "", "limit": 1000}));
                then.status(200).json_body(json!({
                    "result": {
                        "items": [{"product_id": 1, "offer_id": "A"}, {"product_id": 2, "offer_id": "B"}],
                        "total": 3,
                        "last_id": "cursor-1"
                    }
                }));
            })
            .await;
        let second = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/product/list")
                    .json_body(json!({"filter": {"visibility": "ALL"}, "last_id": "cursor-1", "limit": 1000}));
                then.status(200).json_body(json!({
                    "result": {"items": [{"product_id": 3, "offer_id": "C"}], "total": 3, "last_id": ""}
                }));
            })
            .await;

        let set = fetch_offer_ids(&client(&server), &Campaign::new("123"))
            .await
            .expect("catalog");
        let ids: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn stock_batch_wire_format() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/product/import/stocks")
                    .json_body(json!({"stocks": [
                        {"offer_id": "A", "stock": 100},
                        {"offer_id": "B", "stock": 0}
                    ]}));
                then.status(200).json_body(json!({"result": []}));
            })
            .await;
        let batch = vec![
            StockUpdate {
                offer_id: "A".into(),
                warehouse_id: None,
                count: 100,
                updated_at: None,
            },
            StockUpdate {
                offer_id: "B".into(),
                warehouse_id: None,
                count: 0,
                updated_at: None,
            },
        ];
        client(&server)
            .submit_stocks(&batch, &Campaign::new("123"))
            .await
            .expect("submit");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn price_batch_wire_format() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/product/import/prices")
                    .json_body(json!({"prices": [{
                        "auto_action_enabled": "UNKNOWN",
                        "currency_code": "RUB",
                        "offer_id": "A",
                        "old_price": "0",
                        "price": "5990"
                    }]}));
                then.status(200).json_body(json!({"result": []}));
            })
            .await;
        let batch = vec![PriceUpdate {
            offer_id: "A".into(),
            value: 5990,
            currency: CURRENCY.into(),
        }];
        client(&server)
            .submit_prices(&batch, &Campaign::new("123"))
            .await
            .expect("submit");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/product/import/stocks");
                then.status(403).body("forbidden");
            })
            .await;
        let err = client(&server)
            .submit_stocks(&[], &Campaign::new("123"))
            .await
            .expect_err("forbidden");
        match err {
            TransportError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/product/list");
                then.status(200)
                    .delay(std::time::Duration::from_millis(800))
                    .json_body(json!({"result": {"items": [], "total": 0}}));
            })
            .await;
        let settings = OzonSettings {
            base_url: server.base_url(),
            client_id: "123".into(),
            api_key: "secret".into(),
            ceilings: OzonCeilings::default(),
        };
        let http = HttpSettings {
            timeout: std::time::Duration::from_millis(100),
            ..HttpSettings::default()
        };
        let err = OzonClient::new(&settings, &http)
            .list_offers("", &Campaign::new("123"))
            .await
            .expect_err("too slow");
        assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
    }
}
