// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event bus for fanning events out to observers
//!
//! Publishing never blocks: every subscriber owns an unbounded channel, so a
//! slow observer only grows its own queue. Delivery to each subscriber is in
//! publish order.

use super::subscription::{SubscriberId, Subscription};
use crate::event::Event;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Sender for event delivery
pub type EventSender = mpsc::UnboundedSender<Event>;
/// Receiver for event delivery
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Failure reported by an observer callback. Logged, never propagated.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ObserverError(pub String);

impl From<std::io::Error> for ObserverError {
    fn from(e: std::io::Error) -> Self {
        ObserverError(e.to_string())
    }
}

struct Subscriber {
    subscription: Subscription,
    tx: EventSender,
}

/// Routes published events to matching subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events matching the subscription's patterns.
    ///
    /// An existing subscription with the same id is replaced.
    pub fn subscribe(&self, subscription: Subscription) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.retain(|s| s.subscription.id != subscription.id);
        tracing::debug!(subscriber = %subscription.id, "subscribed");
        subs.push(Subscriber { subscription, tx });
        rx
    }

    /// Returns whether a subscription was removed
    pub fn unsubscribe(&self, id: &SubscriberId) -> bool {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        let before = subs.len();
        subs.retain(|s| &s.subscription.id != id);
        before != subs.len()
    }

    /// Publish an event to all matching subscribers.
    ///
    /// Subscribers whose receiver has been dropped are removed.
    pub fn publish(&self, event: Event) {
        let event_name = event.name();
        tracing::trace!(event = %event_name, "publish");

        let mut closed = false;
        {
            let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
            for sub in subs.iter() {
                if sub.subscription.matches(&event_name) && sub.tx.send(event.clone()).is_err() {
                    closed = true;
                }
            }
        }

        if closed {
            let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
            subs.retain(|s| {
                let open = !s.tx.is_closed();
                if !open {
                    tracing::warn!(subscriber = %s.subscription.id, "dropping closed subscriber");
                }
                open
            });
        }
    }

    /// Run `handler` for every matching event on its own task.
    ///
    /// Handler errors are logged and delivery continues. A panicking handler is
    /// detached; the publisher is never affected either way.
    pub fn spawn_observer<F>(&self, subscription: Subscription, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(&Event) -> Result<(), ObserverError> + Send + 'static,
    {
        let id = subscription.id.clone();
        let mut rx = self.subscribe(subscription);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match std::panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(
                        subscriber = %id,
                        event = %event.name(),
                        error = %e,
                        "observer failed"
                    ),
                    Err(_) => {
                        tracing::error!(subscriber = %id, "observer panicked, detaching");
                        break;
                    }
                }
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn list_subscriptions(&self) -> Vec<SubscriberId> {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|s| s.subscription.id.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
