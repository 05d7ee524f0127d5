// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event notification bus
//!
//! This module provides:
//! - `EventBus` - Non-blocking fan-out of events to subscribers
//! - `EventPattern` - Name patterns subscriptions filter on
//! - `EventLog` - JSON-lines audit trail of events

mod bus;
mod log;
mod subscription;

pub use bus::{EventBus, EventReceiver, EventSender, ObserverError};
pub use log::{EventLog, EventRecord};
pub use subscription::{EventPattern, SubscriberId, Subscription};
