//! Price reconciliation: derives token prices from anchor-paired pools,
//! arbitrates between pools by corroborating liquidity, and merges the
//! result with the external price feed.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use super::TokenResolver;
use crate::config::PricingConfig;
use crate::domain::pricing::{calculate_price_for_token, calculate_volume, format_token_amount};
use crate::domain::{Amount, ContractPool, PoolId, Token, TokenQuote};
use crate::error::OracleError;

/// Reserves are scaled to whole units before price derivation.
const RESERVE_PRECISION: u32 = 0;

/// Price implied for one token by one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolQuote {
    /// Pool the price was derived from.
    pub pool_id: PoolId,
    /// The priced (non-anchor) token.
    pub token: Token,
    /// USD per whole unit.
    pub price: Amount,
    /// Corroborating liquidity score.
    pub volume: Amount,
}

/// Turns pool snapshots and anchor prices into token prices.
#[derive(Debug, Clone)]
pub struct PriceEngine {
    resolver: TokenResolver,
    pricing: PricingConfig,
}

impl PriceEngine {
    /// Creates an engine resolving metadata through `resolver`.
    #[must_use]
    pub fn new(resolver: TokenResolver, pricing: PricingConfig) -> Self {
        Self { resolver, pricing }
    }

    /// Runs the full reconciliation for one cycle and returns the token
    /// records to persist.
    pub async fn reconcile(
        &self,
        pools: &[ContractPool],
        near_price: Option<&Amount>,
        feed: HashMap<String, TokenQuote>,
    ) -> Vec<Token> {
        let jumbo_price = self.jumbo_price(pools, near_price).await;
        let internal = self
            .derive_prices(pools, near_price, jumbo_price.as_ref())
            .await;
        merge_prices(feed, &internal, Utc::now())
    }

    /// Prices JUMBO from the configured reference pool against NEAR.
    ///
    /// Returns `None` when the pool is absent from the snapshot or its
    /// price cannot be derived; JUMBO-side pools then imply nothing.
    pub async fn jumbo_price(
        &self,
        pools: &[ContractPool],
        near_price: Option<&Amount>,
    ) -> Option<Amount> {
        let pool_id = self.pricing.jumbo_pool_id;
        let Some(pool) = pools.iter().find(|p| p.id == pool_id) else {
            tracing::warn!(%pool_id, "jumbo reference pool missing from snapshot");
            return None;
        };
        match self
            .price_from_pool(pool, &self.pricing.near_address, near_price)
            .await
        {
            Ok((price, _)) => {
                tracing::debug!(%pool_id, %price, "jumbo price bootstrapped");
                Some(price)
            }
            Err(e) => {
                tracing::warn!(%pool_id, error = %e, "jumbo price unavailable");
                None
            }
        }
    }

    /// Quotes every pool paired with an anchor and keeps the best quote per
    /// token.
    pub async fn derive_prices(
        &self,
        pools: &[ContractPool],
        near_price: Option<&Amount>,
        jumbo_price: Option<&Amount>,
    ) -> BTreeMap<String, PoolQuote> {
        let near = self.pricing.near_address.as_str();
        let jumbo = self.pricing.jumbo_address.as_str();

        let requests = pools
            .iter()
            .filter(|pool| pool.contains(near) || pool.contains(jumbo))
            .map(|pool| async move {
                let result = self.quote_pool(pool, near_price, jumbo_price).await;
                (pool.id, result)
            });

        let quotes = join_all(requests)
            .await
            .into_iter()
            .filter_map(|(pool_id, result)| match result {
                Ok(quote) => Some(quote),
                Err(e) => {
                    tracing::warn!(%pool_id, error = %e, "pool skipped");
                    None
                }
            });

        arbitrate(quotes, &self.pricing.low_liquidity_floor)
    }

    async fn quote_pool(
        &self,
        pool: &ContractPool,
        near_price: Option<&Amount>,
        jumbo_price: Option<&Amount>,
    ) -> Result<PoolQuote, OracleError> {
        let (fiat_id, fiat_price) = if pool.contains(&self.pricing.near_address) {
            (self.pricing.near_address.as_str(), near_price)
        } else {
            (self.pricing.jumbo_address.as_str(), jumbo_price)
        };

        let (price, token) = self.price_from_pool(pool, fiat_id, fiat_price).await?;

        let mut known = HashMap::with_capacity(2);
        known.insert(token.id.clone(), price.clone());
        if let Some(fiat_price) = fiat_price {
            known.insert(fiat_id.to_string(), fiat_price.clone());
        }
        let volume = calculate_volume(&pool.supplies, &known);

        Ok(PoolQuote {
            pool_id: pool.id,
            token,
            price,
            volume,
        })
    }

    /// Derives the counterpart's unit price from a two-token pool whose
    /// other side is `fiat_id`.
    async fn price_from_pool(
        &self,
        pool: &ContractPool,
        fiat_id: &str,
        fiat_price: Option<&Amount>,
    ) -> Result<(Amount, Token), OracleError> {
        let (first, second) = pool
            .pair()
            .ok_or(OracleError::MalformedPool(pool.id.index()))?;
        let (fiat_token, fungible_token) = if first == fiat_id {
            (first, second)
        } else {
            (second, first)
        };

        let (token, fiat_meta) = tokio::try_join!(
            self.resolver.resolve(fungible_token),
            self.resolver.resolve(fiat_token),
        )?;

        let fiat_amount = scaled_supply(pool, fiat_token, fiat_meta.decimals)?;
        let token_amount = scaled_supply(pool, fungible_token, token.decimals)?;
        let price = calculate_price_for_token(&fiat_amount, &token_amount, fiat_price)?;
        Ok((price, token))
    }
}

fn scaled_supply(pool: &ContractPool, token: &str, decimals: u8) -> Result<Amount, OracleError> {
    format_token_amount(
        pool.supply(token),
        u32::from(decimals),
        Some(RESERVE_PRECISION),
    )
    .ok_or_else(|| OracleError::MissingSupply {
        pool_id: pool.id.index(),
        token: token.to_string(),
    })
}

/// Keeps, per token, the quote with the strictly greatest volume.
///
/// Quotes with zero volume or volume below `floor` never set a price. On a
/// tie the earlier quote wins. Prices are never averaged.
pub fn arbitrate<I>(quotes: I, floor: &Amount) -> BTreeMap<String, PoolQuote>
where
    I: IntoIterator<Item = PoolQuote>,
{
    let mut best: BTreeMap<String, PoolQuote> = BTreeMap::new();
    for quote in quotes {
        if quote.volume.is_zero() || quote.volume < *floor {
            tracing::debug!(
                pool_id = %quote.pool_id,
                token = %quote.token.id,
                volume = %quote.volume,
                "low liquidity quote ignored"
            );
            continue;
        }
        let beats_current = best
            .get(&quote.token.id)
            .is_none_or(|current| quote.volume > current.volume);
        if beats_current {
            best.insert(quote.token.id.clone(), quote);
        }
    }
    best
}

/// Merges feed quotes with internally derived prices.
///
/// Every feed token is emitted with the feed's metadata, priced from the
/// internal quote when that is strictly positive and from the feed
/// otherwise. Tokens priced only internally are appended.
#[must_use]
pub fn merge_prices(
    feed: HashMap<String, TokenQuote>,
    internal: &BTreeMap<String, PoolQuote>,
    now: DateTime<Utc>,
) -> Vec<Token> {
    let feed: BTreeMap<String, TokenQuote> = feed.into_iter().collect();

    let from_feed = feed.iter().map(|(id, quote)| {
        let price = match internal.get(id).filter(|q| q.price.is_positive()) {
            Some(q) => {
                tracing::debug!(token = %id, internal = %q.price, external = %quote.price, "internal price");
                q.price.clone()
            }
            None => {
                tracing::debug!(token = %id, external = %quote.price, "external price");
                quote.price.clone()
            }
        };
        Token {
            id: id.clone(),
            decimals: quote.decimal,
            symbol: quote.symbol.clone(),
            price,
            updated_at: now,
        }
    });

    let internal_only = internal
        .iter()
        .filter(|(id, _)| !feed.contains_key(*id))
        .map(|(_, q)| Token {
            price: q.price.clone(),
            updated_at: now,
            ..q.token.clone()
        });

    from_feed.chain(internal_only).collect()
}
