//! Continuously updating catalog reads.
//!
//! # Responsibility
//! - Register read queries together with the tables they depend on.
//! - Re-run affected queries after a committed write and push the fresh
//!   snapshot to the subscriber.
//!
//! # Invariants
//! - Every subscriber receives an initial snapshot on registration.
//! - A snapshot is pushed only when it differs from the last one delivered.
//! - At most one snapshot waits per subscriber; a newer one replaces it.
//! - Snapshots for one subscription arrive in commit order; nothing orders
//!   deliveries across subscriptions.
//! - Subscriptions whose receiver was dropped are pruned on the next push.

use crate::repo::RepoResult;
use crossbeam_channel::{bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, warn};
use rusqlite::Connection;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Catalog tables a write can touch and a query can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTable {
    Category,
    Author,
    Book,
    PhysicalCopy,
    BookAuthor,
    AuditLog,
}

/// Receiving end of a live query.
///
/// Holds no borrow of the service; dropping it ends the subscription.
/// Snapshots the caller has not taken yet are coalesced into the newest.
#[derive(Debug)]
pub struct LiveQuery<T> {
    receiver: Receiver<T>,
    _alive: Arc<()>,
}

impl<T> LiveQuery<T> {
    /// Blocks until the next snapshot arrives.
    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Takes the waiting snapshot, if any.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// `1` while a snapshot waits to be received, otherwise `0`.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

enum Delivery {
    Sent,
    Unchanged,
    Disconnected,
}

trait Subscription: Send {
    fn name(&self) -> &'static str;
    fn watches(&self, touched: &[CatalogTable]) -> bool;
    fn refresh(&mut self, conn: &Connection) -> RepoResult<Delivery>;
}

type Loader<T> = Box<dyn Fn(&Connection) -> RepoResult<T> + Send>;

struct QuerySubscription<T> {
    name: &'static str,
    tables: &'static [CatalogTable],
    loader: Loader<T>,
    sender: Sender<T>,
    /// Publisher-side handle used to evict a snapshot nobody picked up.
    backlog: Receiver<T>,
    subscriber: Weak<()>,
    last: Option<T>,
}

impl<T> Subscription for QuerySubscription<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn watches(&self, touched: &[CatalogTable]) -> bool {
        touched.iter().any(|table| self.tables.contains(table))
    }

    fn refresh(&mut self, conn: &Connection) -> RepoResult<Delivery> {
        if self.subscriber.strong_count() == 0 {
            return Ok(Delivery::Disconnected);
        }
        let snapshot = (self.loader)(conn)?;
        if self.last.as_ref() == Some(&snapshot) {
            return Ok(Delivery::Unchanged);
        }
        // Single producer: after the eviction the slot is free.
        let _stale = self.backlog.try_recv();
        if self.sender.try_send(snapshot.clone()).is_err() {
            return Ok(Delivery::Disconnected);
        }
        self.last = Some(snapshot);
        Ok(Delivery::Sent)
    }
}

/// Registry of live queries owned by the catalog service.
#[derive(Default)]
pub(crate) struct LiveQueryRegistry {
    subscriptions: Vec<Box<dyn Subscription>>,
}

impl LiveQueryRegistry {
    /// Registers `loader` and delivers its first snapshot immediately.
    pub(crate) fn subscribe<T, F>(
        &mut self,
        conn: &Connection,
        name: &'static str,
        tables: &'static [CatalogTable],
        loader: F,
    ) -> RepoResult<LiveQuery<T>>
    where
        T: Clone + PartialEq + Send + 'static,
        F: Fn(&Connection) -> RepoResult<T> + Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let alive = Arc::new(());
        let mut subscription = QuerySubscription {
            name,
            tables,
            loader: Box::new(loader),
            sender,
            backlog: receiver.clone(),
            subscriber: Arc::downgrade(&alive),
            last: None,
        };
        subscription.refresh(conn)?;
        self.subscriptions.push(Box::new(subscription));
        debug!(
            "event=live_query_subscribe module=service status=ok query={name} active={}",
            self.subscriptions.len()
        );
        Ok(LiveQuery {
            receiver,
            _alive: alive,
        })
    }

    /// Re-runs every subscription that depends on one of `touched`.
    ///
    /// Called after commit, so a failing refresh is logged and skipped; the
    /// subscription stays registered and catches up on the next change.
    pub(crate) fn publish(&mut self, conn: &Connection, touched: &[CatalogTable]) {
        self.subscriptions.retain_mut(|subscription| {
            if !subscription.watches(touched) {
                return true;
            }
            match subscription.refresh(conn) {
                Ok(Delivery::Sent) | Ok(Delivery::Unchanged) => true,
                Ok(Delivery::Disconnected) => {
                    debug!(
                        "event=live_query_drop module=service status=ok query={}",
                        subscription.name()
                    );
                    false
                }
                Err(err) => {
                    warn!(
                        "event=live_query_refresh module=service status=error query={} error={err}",
                        subscription.name()
                    );
                    true
                }
            }
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len()
    }
}
