//! Coin-margined futures symbol resolution
//!
//! Delivery contracts are named by expiry (`BTCUSD_210625`), so subscribing
//! to "the BTC/USD quarter" needs the exchange's contract listing. The
//! listing is kept in a [`MetadataCache`] and refetched when it goes stale or
//! when a listed contract has passed its delivery date.

use async_trait::async_trait;
use cambist_core::{Clock, CurrencyPair, MetadataCache, SystemClock, contract};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AdapterError;

const PERPETUAL: &str = "PERPETUAL";
const CURRENT_QUARTER: &str = "CURRENT_QUARTER";
const NEXT_QUARTER: &str = "NEXT_QUARTER";
const TRADING: &str = "TRADING";

/// One entry of the futures `exchangeInfo` symbol list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub symbol: String,
    pub pair: String,
    pub contract_type: String,
    pub contract_status: String,
    #[serde(default)]
    pub delivery_date: i64,
}

impl ContractInfo {
    fn is_trading(&self) -> bool {
        self.contract_status == TRADING
    }

    fn is_delivered(&self, now_ms: i64) -> bool {
        self.contract_type != PERPETUAL && self.is_trading() && self.delivery_date <= now_ms
    }
}

#[derive(Deserialize)]
struct ExchangeInfo {
    symbols: Vec<ContractInfo>,
}

/// Where the contract listing comes from
///
/// The REST call itself lives outside this crate; implement this over
/// whatever HTTP client the application uses.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn fetch_contracts(&self) -> Result<Vec<ContractInfo>, AdapterError>;
}

/// Fixed listing, e.g. loaded from a saved `exchangeInfo` response
pub struct StaticSymbols {
    contracts: Vec<ContractInfo>,
}

impl StaticSymbols {
    pub fn new(contracts: Vec<ContractInfo>) -> Self {
        Self { contracts }
    }

    /// Parse the body of `GET /dapi/v1/exchangeInfo`
    pub fn from_exchange_info(body: &str) -> Result<Self, AdapterError> {
        let info: ExchangeInfo =
            serde_json::from_str(body).map_err(|e| AdapterError::Metadata(e.to_string()))?;
        Ok(Self::new(info.symbols))
    }
}

#[async_trait]
impl SymbolSource for StaticSymbols {
    async fn fetch_contracts(&self) -> Result<Vec<ContractInfo>, AdapterError> {
        Ok(self.contracts.clone())
    }
}

/// Maps (pair, contract type) to the exchange symbol of a coin-margined contract
pub struct FuturesSymbols {
    source: Arc<dyn SymbolSource>,
    cache: MetadataCache<Vec<ContractInfo>>,
    clock: Arc<dyn Clock>,
    // Held across the fetch so concurrent misses share one request
    refresh: Mutex<()>,
}

impl FuturesSymbols {
    pub fn new(source: Arc<dyn SymbolSource>) -> Self {
        Self::with_clock(source, chrono::Duration::hours(1), Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        source: Arc<dyn SymbolSource>,
        ttl: chrono::Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            cache: MetadataCache::with_clock(ttl, Arc::clone(&clock)),
            clock,
            refresh: Mutex::new(()),
        }
    }

    /// Exchange symbol for `pair` (USD-quoted) and `contract_type`
    ///
    /// Perpetuals are named without a lookup; weekly contracts are not
    /// listed on this venue.
    pub async fn resolve(&self, pair: &CurrencyPair, contract_type: &str) -> Result<String, AdapterError> {
        let pair = pair.usdt_to_usd();
        match contract_type {
            contract::THIS_WEEK | contract::NEXT_WEEK => {
                return Err(AdapterError::UnsupportedContract(contract_type.to_string()));
            }
            contract::SWAP => return Ok(format!("{}_PERP", pair.to_symbol(""))),
            _ => {}
        }

        let contracts = self.contracts().await?;
        find_contract(&contracts, &pair, contract_type)
    }

    async fn contracts(&self) -> Result<Arc<Vec<ContractInfo>>, AdapterError> {
        if let Some(contracts) = self.usable() {
            return Ok(contracts);
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited
        if let Some(contracts) = self.usable() {
            return Ok(contracts);
        }

        let fresh = self.source.fetch_contracts().await?;
        debug!(contracts = fresh.len(), "futures contract listing refreshed");
        Ok(self.cache.store(fresh))
    }

    /// Cached listing, unless expired or holding a contract past delivery
    fn usable(&self) -> Option<Arc<Vec<ContractInfo>>> {
        let contracts = self.cache.get()?;
        let now_ms = self.clock.now().timestamp_millis();
        match contracts.iter().find(|c| c.is_delivered(now_ms)) {
            None => Some(contracts),
            Some(delivered) => {
                debug!(symbol = %delivered.symbol, "contract delivered, refreshing listing");
                self.cache.invalidate();
                None
            }
        }
    }
}

fn find_contract(
    contracts: &[ContractInfo],
    pair: &CurrencyPair,
    contract_type: &str,
) -> Result<String, AdapterError> {
    let pair_symbol = pair.to_symbol("");
    let wanted = contracts.iter().filter(|c| c.pair == pair_symbol).find(|c| {
        (c.contract_type == CURRENT_QUARTER && contract_type == contract::QUARTER)
            || (c.contract_type == NEXT_QUARTER && contract_type == contract::BI_QUARTER)
            || c.symbol == contract_type
    });

    match wanted {
        Some(c) if c.is_trading() => Ok(c.symbol.clone()),
        Some(c) => Err(AdapterError::ContractNotTrading {
            symbol: c.symbol.clone(),
            status: c.contract_status.clone(),
        }),
        None => Err(AdapterError::UnknownContract {
            pair: pair_symbol,
            contract_type: contract_type.to_string(),
        }),
    }
}
