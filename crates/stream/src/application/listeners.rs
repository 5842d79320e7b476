use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::domain::{DepthListener, TickerListener, TradeListener};

/// One listener slot per event type; empty slots drop their events
#[derive(Clone, Default)]
pub struct Listeners {
    pub depth: Option<Arc<dyn DepthListener>>,
    pub ticker: Option<Arc<dyn TickerListener>>,
    pub trade: Option<Arc<dyn TradeListener>>,
}

/// Lock-free listener table read by the dispatcher on every frame
///
/// Registration swaps in a new table, so it can happen while frames are
/// being delivered.
pub struct ListenerRegistry {
    current: ArcSwap<Listeners>,
}

impl ListenerRegistry {
    pub fn new(initial: Listeners) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn load(&self) -> Arc<Listeners> {
        self.current.load_full()
    }

    pub fn set_depth(&self, listener: Arc<dyn DepthListener>) {
        self.current.rcu(|cur| Listeners {
            depth: Some(Arc::clone(&listener)),
            ..(**cur).clone()
        });
    }

    pub fn set_ticker(&self, listener: Arc<dyn TickerListener>) {
        self.current.rcu(|cur| Listeners {
            ticker: Some(Arc::clone(&listener)),
            ..(**cur).clone()
        });
    }

    pub fn set_trade(&self, listener: Arc<dyn TradeListener>) {
        self.current.rcu(|cur| Listeners {
            trade: Some(Arc::clone(&listener)),
            ..(**cur).clone()
        });
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new(Listeners::default())
    }
}
