// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Machine lifecycle coupling
//!
//! Bridges machine notifications onto the bus and forces the coordinator to
//! Stopped when the machine is disabled.

use crate::coordinator::Coordinator;
use pnp_adapters::{MachineAdapter, MachineEvent};
use pnp_core::Event;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Forced-stop reason when the machine's own notification was dropped
const LOST_DISABLE_REASON: &str = "machine disabled (notification lost)";

/// Listen to the coordinator's machine until the task is aborted or the
/// machine's notification channel closes. Notifications sent after this
/// returns are observed.
pub fn spawn_coupling<M: MachineAdapter>(coordinator: Coordinator<M>) -> JoinHandle<()> {
    let mut notifications = coordinator.machine().subscribe();
    let span = tracing::info_span!("machine.coupling");

    tokio::spawn(
        async move {
            loop {
                match notifications.recv().await {
                    Ok(event) => apply(&coordinator, event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "machine notifications lagged");
                        catch_up(&coordinator, &mut notifications);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("machine notifications closed");
                        break;
                    }
                }
            }
        }
        .instrument(span),
    )
}

/// Apply what is still buffered after a lag. The machine's own disable
/// reason wins when it survived; otherwise a disabled machine is stopped
/// with a generic reason.
fn catch_up<M: MachineAdapter>(
    coordinator: &Coordinator<M>,
    notifications: &mut broadcast::Receiver<MachineEvent>,
) {
    loop {
        match notifications.try_recv() {
            Ok(event) => apply(coordinator, event),
            Err(TryRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "machine notifications lagged");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    if !coordinator.machine().is_enabled() {
        coordinator.force_stop(LOST_DISABLE_REASON);
    }
}

/// Handle one machine notification
pub fn apply<M: MachineAdapter>(coordinator: &Coordinator<M>, event: MachineEvent) {
    let bus = coordinator.bus();
    match event {
        MachineEvent::Disabled { reason } => {
            tracing::warn!(%reason, "machine disabled");
            coordinator.force_stop(&reason);
            bus.publish(Event::MachineDisabled { reason });
        }
        MachineEvent::Enabled => {
            tracing::info!("machine enabled");
            bus.publish(Event::MachineEnabled);
        }
        MachineEvent::EnableFailed { reason } => {
            tracing::warn!(%reason, "machine enable failed");
            bus.publish(Event::MachineEnableFailed { reason });
        }
        MachineEvent::DisableFailed { reason } => {
            tracing::warn!(%reason, "machine disable failed");
            bus.publish(Event::MachineDisableFailed { reason });
        }
        MachineEvent::HeadActivity { head } => {
            tracing::trace!(%head, "head activity");
            bus.publish(Event::HeadActivity { head });
        }
    }
}

#[cfg(test)]
#[path = "coupling_tests.rs"]
mod tests;
