// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application context: machine, bus and coordinator wired from config

use crate::config::Config;
use pnp_adapters::{MachineAdapter, MachineError, SimulatedMachine, TracedMachine};
use pnp_core::{EventBus, EventLog, EventPattern, SubscriberId, Subscription};
use pnp_engine::{spawn_coupling, Coordinator};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub type Machine = TracedMachine<SimulatedMachine>;

const EVENT_LOG_SUBSCRIBER: &str = "event-log";
const SHUTDOWN_SUBSCRIBER: &str = "shutdown";
const DISABLE_FORWARD_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to open event log {0}: {1}")]
    EventLog(PathBuf, #[source] std::io::Error),

    #[error("failed to enable machine: {0}")]
    Enable(#[from] MachineError),
}

/// Everything a command needs, created once at startup
pub struct Context {
    coordinator: Coordinator<Machine>,
    coupling: JoinHandle<()>,
    event_log: Option<JoinHandle<()>>,
}

impl Context {
    /// Build the machine and coordinator, then enable the machine
    pub async fn startup(config: &Config) -> Result<Self, ContextError> {
        let machine = TracedMachine::new(SimulatedMachine::new(&config.machine));
        let bus = EventBus::new();
        let coordinator = Coordinator::new(machine, bus.clone(), config.coordinator.clone());
        coordinator.set_delegate(config.delegate.build());

        let event_log = match &config.log.event_log {
            Some(path) => {
                let mut log = EventLog::open(path)
                    .map_err(|e| ContextError::EventLog(path.clone(), e))?;
                info!(path = %path.display(), "event log open");
                Some(bus.spawn_observer(
                    Subscription::all(EVENT_LOG_SUBSCRIBER, "Event audit log"),
                    move |event| {
                        log.append(event)?;
                        Ok(())
                    },
                ))
            }
            None => None,
        };

        // Coupling first so the enable notification reaches the bus
        let coupling = spawn_coupling(coordinator.clone());
        coordinator.machine().set_enabled(true).await?;

        info!(
            heads = coordinator.machine().heads().len(),
            feeders = coordinator.machine().feeders().len(),
            "machine started"
        );

        Ok(Self {
            coordinator,
            coupling,
            event_log,
        })
    }

    pub fn coordinator(&self) -> &Coordinator<Machine> {
        &self.coordinator
    }

    pub fn machine(&self) -> &Machine {
        self.coordinator.machine()
    }

    pub fn bus(&self) -> &EventBus {
        self.coordinator.bus()
    }

    /// Stop any job, wait for its worker, then disable the machine.
    ///
    /// Failures are logged; shutdown always completes.
    pub async fn shutdown(self) {
        info!("shutting down");

        if self.coordinator.state().is_active() {
            if let Err(e) = self.coordinator.stop() {
                warn!(error = %e, "failed to stop job");
            }
        }
        self.coordinator.join().await;

        let mut forwarded = self.bus().subscribe(Subscription::new(
            SHUTDOWN_SUBSCRIBER,
            vec![EventPattern::new("machine:disabled")],
            "Shutdown disable watch",
        ));
        let was_enabled = self.machine().is_enabled();
        match self.machine().set_enabled(false).await {
            Ok(()) if was_enabled => {
                // Let the coupling forward the disable before it goes away
                let _ = tokio::time::timeout(DISABLE_FORWARD_TIMEOUT, forwarded.recv()).await;
            }
            Ok(()) => {}
            Err(e) => warn!(error = %e, "failed to disable machine"),
        }
        self.bus()
            .unsubscribe(&SubscriberId(SHUTDOWN_SUBSCRIBER.to_string()));
        self.coupling.abort();

        if let Some(handle) = self.event_log {
            self.coordinator
                .bus()
                .unsubscribe(&SubscriberId(EVENT_LOG_SUBSCRIBER.to_string()));
            if let Err(e) = handle.await {
                warn!(error = %e, "event log observer ended abnormally");
            }
        }

        info!("shutdown complete");
    }
}
