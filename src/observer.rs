//! Periodic cart gauge collection.
//!
//! The observer reads the store's aggregate totals and publishes them on the
//! `cart_items_total` and `active_users_total` gauges. It runs on its own
//! interval, independent of request traffic.

use prometheus::IntGauge;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

use crate::cart::{CartStore, CartTotals};
use crate::metrics::ServiceMetrics;

/// Publishes cart totals onto the cart gauges.
pub struct CartObserver {
    store: Arc<CartStore>,
    cart_items: IntGauge,
    active_users: IntGauge,
}

impl CartObserver {
    pub fn new(store: Arc<CartStore>, metrics: &ServiceMetrics) -> Self {
        Self {
            store,
            cart_items: metrics.cart_items.clone(),
            active_users: metrics.active_users.clone(),
        }
    }

    /// Takes one snapshot of the store and sets both gauges from it.
    pub fn observe(&self) -> CartTotals {
        let totals = self.store.totals();

        self.cart_items
            .set(i64::try_from(totals.total_quantity).unwrap_or(i64::MAX));
        self.active_users
            .set(i64::try_from(totals.active_users).unwrap_or(i64::MAX));

        debug!(
            "Observed cart state: {} items across {} users",
            totals.total_quantity, totals.active_users
        );
        totals
    }

    /// Spawns the collection loop. The first tick fires immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(
                "Cart observer started with {}s interval",
                every.as_secs_f64()
            );

            loop {
                ticker.tick().await;
                self.observe();
            }
        })
    }
}
