use crate::models::SupplierRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unable to read feed {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("unable to parse feed {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Where supplier records come from.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch_records(&self) -> Result<Vec<SupplierRecord>, FeedError>;
}

/// Supplier stock sheet exported as a JSON array of row objects.
#[derive(Debug, Clone)]
pub struct JsonFileFeed {
    path: PathBuf,
}

impl JsonFileFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl FeedSource for JsonFileFeed {
    async fn fetch_records(&self) -> Result<Vec<SupplierRecord>, FeedError> {
        let path = self.path.display().to_string();
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|err| FeedError::Read {
                path: path.clone(),
                reason: err.to_string(),
            })?;
        let records = parse_records(&raw).map_err(|err| FeedError::Parse {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        info!(target = "stocksync.feed", path = %path, records = records.len(), "feed loaded");
        Ok(records)
    }
}

fn parse_records(raw: &[u8]) -> Result<Vec<SupplierRecord>, serde_json::Error> {
    serde_json::from_slice(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_rows() {
        let raw = r#"[
            {"Код": 143210608, "Количество": ">10", "Цена": "5'990.00 руб.", "Наименование": "Casio"},
            {"code": "91132", "quantity": 3, "price": "1'200.00 руб."}
        ]"#;
        let records = parse_records(raw.as_bytes()).expect("parse");
        assert_eq!(
            records,
            vec![
                SupplierRecord::new("143210608", ">10", "5'990.00 руб."),
                SupplierRecord::new("91132", "3", "1'200.00 руб."),
            ]
        );
    }

    #[test]
    fn blank_cells_in_other_rows_do_not_fail_the_feed() {
        let raw = r#"[
            {"code": "A", "quantity": "3", "price": "10.00"},
            {"code": "ZZ", "quantity": null, "price": null}
        ]"#;
        let records = parse_records(raw.as_bytes()).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], SupplierRecord::new("ZZ", "", ""));
    }

    #[test]
    fn rejects_rows_without_code() {
        let raw = r#"[{"quantity": "2", "price": "10.00"}]"#;
        assert!(parse_records(raw.as_bytes()).is_err());
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("stocksync-feed-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, r#"[{"code": "A", "quantity": "1", "price": "10.00"}]"#)
            .await
            .unwrap();
        let records = JsonFileFeed::new(&path).fetch_records().await.expect("feed");
        tokio::fs::remove_file(&path).await.ok();
        assert_eq!(records, vec![SupplierRecord::new("A", "1", "10.00")]);
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let feed = JsonFileFeed::new("/definitely/not/here.json");
        assert!(matches!(
            feed.fetch_records().await,
            Err(FeedError::Read { .. })
        ));
    }
}
