use std::time::Duration;

use metrics::counter;

use crate::clients::coingecko::{CoinGeckoClient, CryptoQuote, PriceClientError};
use super::price_cache::TtlCache;

/// Market quotes behind a TTL cache.
#[derive(Clone)]
pub struct PriceService {
    client: CoinGeckoClient,
    cache: TtlCache<Vec<CryptoQuote>>,
}

impl PriceService {
    pub fn new(client: CoinGeckoClient, ttl: Duration) -> Self {
        Self {
            client,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &TtlCache<Vec<CryptoQuote>> {
        &self.cache
    }

    /// Fresh cached quotes, else a live fetch. When the fetch fails the last
    /// cached quotes are served regardless of age.
    pub async fn quotes(&self) -> Result<Vec<CryptoQuote>, PriceClientError> {
        if let Some(quotes) = self.cache.get_fresh().await {
            counter!("price_cache_hits_total").increment(1);
            return Ok(quotes);
        }

        match self.client.get_quotes().await {
            Ok(quotes) => {
                tracing::debug!(count = quotes.len(), "Fetched live crypto quotes");
                self.cache.put(quotes.clone()).await;
                Ok(quotes)
            }
            Err(e) => match self.cache.get_any().await {
                Some(stale) => {
                    tracing::warn!(error = %e, "Quote fetch failed, serving cached quotes");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}
