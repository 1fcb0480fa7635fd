//! Lazy, store-memoized token metadata lookup.

use std::sync::Arc;

use crate::domain::Token;
use crate::error::OracleError;
use crate::persistence::Store;
use crate::source::TokenMetadataSource;

/// Resolves token decimals and symbol, consulting the store first.
///
/// A miss reads `ft_metadata` from the chain and writes the new token
/// through to the store immediately with a zero price, so later cycles
/// never refetch it. Concurrent misses for the same address may each fetch;
/// the upsert makes the duplicate write harmless.
#[derive(Debug, Clone)]
pub struct TokenResolver {
    store: Arc<dyn Store>,
    metadata: Arc<dyn TokenMetadataSource>,
}

impl TokenResolver {
    /// Creates a resolver over `store` and the chain `metadata` source.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, metadata: Arc<dyn TokenMetadataSource>) -> Self {
        Self { store, metadata }
    }

    /// Returns the stored token for `address`, discovering it on a miss.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if the store lookup, the metadata call or
    /// the write-through fails.
    pub async fn resolve(&self, address: &str) -> Result<Token, OracleError> {
        if let Some(token) = self.store.find_token(address).await? {
            return Ok(token);
        }

        let metadata = self.metadata.ft_metadata(address).await?;
        let token = Token::from_metadata(address.to_string(), metadata);
        self.store.upsert_tokens(std::slice::from_ref(&token)).await?;

        tracing::info!(
            token = address,
            symbol = %token.symbol,
            decimals = token.decimals,
            "discovered token"
        );
        Ok(token)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Amount;
    use crate::persistence::MemoryStore;
    use crate::source::testing::FakeChain;

    fn make_resolver() -> (TokenResolver, Arc<MemoryStore>, Arc<FakeChain>) {
        let store = Arc::new(MemoryStore::new());
        let chain = Arc::new(FakeChain::default().token("x.near", 18, "X"));
        let resolver = TokenResolver::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&chain) as Arc<dyn TokenMetadataSource>,
        );
        (resolver, store, chain)
    }

    #[tokio::test]
    async fn miss_fetches_and_writes_through() {
        let (resolver, store, chain) = make_resolver();

        let Ok(token) = resolver.resolve("x.near").await else {
            panic!("resolve failed");
        };
        assert_eq!(token.decimals, 18);
        assert_eq!(token.symbol, "X");
        assert!(token.price.is_zero());
        assert_eq!(chain.metadata_calls(), 1);
        assert_eq!(store.token_writes(), 1);

        let Ok(stored) = store.find_token("x.near").await else {
            panic!("lookup failed");
        };
        assert_eq!(stored.map(|t| t.symbol), Some("X".to_string()));
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_store() {
        let (resolver, _store, chain) = make_resolver();

        let first = resolver.resolve("x.near").await;
        let second = resolver.resolve("x.near").await;
        tokio_test::assert_ok!(&first);
        tokio_test::assert_ok!(&second);
        assert_eq!(chain.metadata_calls(), 1);
    }

    #[tokio::test]
    async fn hit_returns_stored_record_unchanged() {
        let (resolver, store, chain) = make_resolver();
        let mut existing = Token::from_metadata(
            "x.near".to_string(),
            crate::domain::FtMetadata {
                decimals: 6,
                symbol: "OLD".to_string(),
            },
        );
        existing.price = Amount::from(3);
        let _ = store.upsert_tokens(&[existing.clone()]).await;

        let Ok(token) = resolver.resolve("x.near").await else {
            panic!("resolve failed");
        };
        assert_eq!(token, existing);
        assert_eq!(chain.metadata_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_contract_is_an_error() {
        let (resolver, store, _chain) = make_resolver();
        let result = resolver.resolve("nobody.near").await;
        assert!(matches!(result, Err(OracleError::Rpc(_))));
        assert_eq!(store.token_writes(), 0);
    }
}
