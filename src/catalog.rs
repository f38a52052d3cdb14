use crate::marketplace::{Campaign, MarketplaceTransport, PagingPolicy, TransportError};
use crate::models::OfferId;
use indexmap::IndexSet;
use tracing::{debug, warn};

/// Offer ids of one campaign in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogOfferSet {
    ids: IndexSet<OfferId>,
}

impl CatalogOfferSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes `id`, keeping the order of the remaining entries.
    pub fn take(&mut self, id: &str) -> bool {
        self.ids.shift_remove(id)
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &OfferId> {
        self.ids.iter()
    }
}

impl FromIterator<OfferId> for CatalogOfferSet {
    fn from_iter<I: IntoIterator<Item = OfferId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CatalogOfferSet {
    type Item = OfferId;
    type IntoIter = indexmap::set::IntoIter<OfferId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// Walks the listing endpoint from an empty cursor and collects every offer id.
///
/// Nothing is returned unless every page succeeds.
pub async fn fetch_offer_ids<T>(
    transport: &T,
    campaign: &Campaign,
) -> Result<CatalogOfferSet, TransportError>
where
    T: MarketplaceTransport,
{
    let policy = transport.paging();
    let mut cursor = String::new();
    let mut collected: Vec<OfferId> = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = transport.list_offers(&cursor, campaign).await?;
        pages += 1;
        let page_len = page.offer_ids.len();
        collected.extend(page.offer_ids);

        let done = match policy {
            PagingPolicy::TotalCount => match page.total {
                Some(total) if collected.len() as u64 >= total => true,
                Some(total) if page_len == 0 => {
                    warn!(
                        target = "stocksync.catalog",
                        marketplace = transport.name(),
                        campaign = %campaign.id,
                        total,
                        collected = collected.len(),
                        "listing returned an empty page before reaching total"
                    );
                    true
                }
                Some(_) => false,
                None => {
                    warn!(
                        target = "stocksync.catalog",
                        marketplace = transport.name(),
                        campaign = %campaign.id,
                        "listing page carries no total"
                    );
                    true
                }
            },
            PagingPolicy::NextCursor => page.next_cursor.as_deref().is_none_or(str::is_empty),
        };
        if done {
            break;
        }
        cursor = page.next_cursor.unwrap_or_default();
    }

    let offers: CatalogOfferSet = collected.into_iter().collect();
    if offers.is_empty() {
        warn!(
            target = "stocksync.catalog",
            marketplace = transport.name(),
            campaign = %campaign.id,
            "catalog is empty, nothing will be updated"
        );
    }
    debug!(
        target = "stocksync.catalog",
        marketplace = transport.name(),
        campaign = %campaign.id,
        pages,
        offers = offers.len(),
        "catalog fetched"
    );
    Ok(offers)
}
