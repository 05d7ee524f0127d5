// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution loop: one task per run, one placement at a time

use crate::coordinator::{Control, Coordinator};
use crate::delegate::{PickFailure, PickRetryAction};
use pnp_adapters::{
    feeder_for, FeederAdapter, HeadAdapter, MachineAdapter, MachineError, MachineEvent,
};
use pnp_core::{
    BoardRef, CommandError, Cursor, Event, Job, JobErrorKind, JobState, Part, PlacementOutcome,
    PlacementRef,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::Instant;

/// How long a run that saw the machine drop waits for the machine to say why
const DISABLE_NOTICE_WAIT: Duration = Duration::from_millis(250);

/// Why a run stopped before completing
#[derive(Debug)]
enum Halted {
    /// The coordinator moved on (stop, or a newer run); exit quietly
    Stale,
    Failed(JobErrorKind, String),
    MachineDisabled,
}

enum PickError {
    Halted(Halted),
    Machine(MachineError),
}

impl From<Halted> for PickError {
    fn from(halted: Halted) -> Self {
        PickError::Halted(halted)
    }
}

impl From<MachineError> for PickError {
    fn from(error: MachineError) -> Self {
        PickError::Machine(error)
    }
}

/// One launched run. Holds the machine's and the coordinator's run tokens
/// until dropped, released in that order.
pub(crate) struct Run<M> {
    coordinator: Coordinator<M>,
    generation: u64,
    job: Arc<Job>,
    /// Machine notifications since launch
    notices: broadcast::Receiver<MachineEvent>,
    _permits: [OwnedSemaphorePermit; 2],
}

impl<M: MachineAdapter> Run<M> {
    pub(crate) fn new(
        coordinator: Coordinator<M>,
        generation: u64,
        job: Arc<Job>,
        permits: [OwnedSemaphorePermit; 2],
    ) -> Self {
        let notices = coordinator.machine().subscribe();
        Self {
            coordinator,
            generation,
            job,
            notices,
            _permits: permits,
        }
    }
}

pub(crate) async fn run<M: MachineAdapter>(mut run: Run<M>) {
    tracing::info!(
        boards = run.job.board_count(),
        placements = run.job.placement_count(),
        "run started"
    );

    match run.execute().await {
        Ok(()) => tracing::info!("run completed"),
        Err(Halted::Stale) => tracing::info!("run halted"),
        Err(Halted::Failed(kind, description)) => run.fail(kind, description),
        Err(Halted::MachineDisabled) => {
            let reason = run.disable_reason().await;
            run.coordinator.force_stop(&reason);
        }
    }
}

impl<M: MachineAdapter> Run<M> {
    async fn execute(&self) -> Result<(), Halted> {
        if self.coordinator.config().home_on_start {
            self.home().await?;
        }

        let mut board = None;
        loop {
            let Some(cursor) = self.next_turn().await? else {
                self.complete_now()?;
                return Ok(());
            };
            self.check_machine()?;

            if board != Some(cursor.board) {
                board = Some(cursor.board);
                if let Some(board_ref) = BoardRef::of(&self.job, cursor.board) {
                    self.emit(Event::BoardProcessingStarted { board: board_ref })?;
                }
            }

            let outcome = self.process(cursor).await?;
            if !self.finish(cursor, outcome)? {
                return Ok(());
            }
        }
    }

    /// Wait until the coordinator lets the next placement proceed.
    /// `None` means there is nothing left to place.
    async fn next_turn(&self) -> Result<Option<Cursor>, Halted> {
        loop {
            {
                let mut control = self.coordinator.lock();
                if control.generation != self.generation || control.state == JobState::Stopped {
                    return Err(Halted::Stale);
                }
                let proceed = match control.state {
                    JobState::Running => true,
                    JobState::Paused if control.steps > 0 => {
                        control.steps -= 1;
                        true
                    }
                    _ => false,
                };
                if proceed {
                    control.in_flight = true;
                    return Ok(control.cursor);
                }
            }
            tracing::debug!("waiting at placement boundary");
            self.coordinator.wait_for_wake().await;
        }
    }

    async fn home(&self) -> Result<(), Halted> {
        for head in self.coordinator.machine().heads() {
            self.live()?;
            self.emit(Event::status(format!("Homing {}", head.id())))?;
            if let Err(e) = head.home().await {
                return Err(self.failure(
                    &e,
                    JobErrorKind::HomingFailed,
                    format!("homing {} failed: {e}", head.id()),
                ));
            }
        }
        Ok(())
    }

    /// Run the pick and place sequence for one placement
    async fn process(&self, cursor: Cursor) -> Result<PlacementOutcome, Halted> {
        let job = Arc::clone(&self.job);
        let Some((board_location, placement)) = job.resolve(cursor) else {
            tracing::warn!(%cursor, "cursor does not resolve to a placement");
            return Ok(PlacementOutcome::Skipped);
        };
        let part = placement.part.as_ref();
        let placement_ref = PlacementRef {
            cursor,
            board: board_location.name().to_string(),
            id: placement.id.clone(),
            part: part.id.clone(),
        };
        self.emit(Event::PartProcessingStarted {
            placement: placement_ref.clone(),
        })?;

        let target = board_location.target_of(placement);
        let machine = self.coordinator.machine();
        let Some(feeder) = feeder_for(machine, &part.id) else {
            return Err(Halted::Failed(
                JobErrorKind::MissingFeeder,
                format!(
                    "no enabled feeder supplies part {} for {}",
                    part.id, placement.id
                ),
            ));
        };
        let Some(head) = machine.heads().into_iter().next() else {
            return Err(Halted::Failed(
                JobErrorKind::MissingHead,
                "machine has no heads".to_string(),
            ));
        };

        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let error = match self.pick(&head, &feeder, part, &placement.id).await {
                Ok(()) => break,
                Err(PickError::Halted(halted)) => return Err(halted),
                Err(PickError::Machine(error)) => error,
            };
            if error == MachineError::Disabled || !machine.is_enabled() {
                return Err(Halted::MachineDisabled);
            }
            self.live()?;

            let action = self.coordinator.delegate().pick_failed(&PickFailure {
                board_location,
                placement,
                part,
                feeder: feeder.id(),
                attempt,
                error: &error,
            });
            tracing::warn!(
                placement = %placement.id,
                feeder = feeder.id(),
                attempt,
                error = %error,
                ?action,
                "pick failed"
            );

            match action {
                PickRetryAction::RetryPick => {
                    self.emit(Event::status(format!(
                        "Retrying pick for {} (attempt {})",
                        placement.id,
                        attempt.saturating_add(1)
                    )))?;
                    self.retry_delay().await?;
                }
                PickRetryAction::SkipAndContinue => {
                    self.emit(Event::status(format!(
                        "Skipping {} after pick failure",
                        placement.id
                    )))?;
                    return Ok(PlacementOutcome::Skipped);
                }
                PickRetryAction::AbortJob => {
                    return Err(Halted::Failed(
                        JobErrorKind::PickAborted,
                        format!("pick of {} for {} failed: {error}", part.id, placement.id),
                    ));
                }
            }
        }

        // A held part is placed even if the operator stops meanwhile; only a
        // forced stop abandons it.
        self.announce(Event::PartPicked {
            placement: placement_ref.clone(),
            feeder: feeder.id().to_string(),
        });

        self.unlocked()?;
        self.announce(Event::status(format!(
            "Placing {} at {}",
            placement.id, target
        )));
        if let Err(e) = head.move_to(target).await {
            return Err(self.failure(
                &e,
                JobErrorKind::MovementFailed,
                format!("moving to {} failed: {e}", placement.id),
            ));
        }

        self.unlocked()?;
        if let Err(e) = head.place().await {
            return Err(self.failure(
                &e,
                JobErrorKind::PlaceFailed,
                format!("placing {} failed: {e}", placement.id),
            ));
        }

        self.announce(Event::PartPlaced {
            placement: placement_ref,
        });
        Ok(PlacementOutcome::Placed)
    }

    /// Sleep out the configured retry delay, ending early if the run is stopped
    async fn retry_delay(&self) -> Result<(), Halted> {
        let delay = self.coordinator.config().pick_retry_delay;
        if delay.is_zero() {
            return Ok(());
        }
        let deadline = Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Ok(()),
                _ = self.coordinator.wait_for_wake() => self.live()?,
            }
        }
    }

    async fn pick(
        &self,
        head: &M::Head,
        feeder: &M::Feeder,
        part: &Part,
        placement: &str,
    ) -> Result<(), PickError> {
        self.live()?;
        self.emit(Event::status(format!(
            "Picking {} for {} from {}",
            part.id,
            placement,
            feeder.id()
        )))?;
        let pick_at = feeder.feed(head.id()).await?;

        self.live()?;
        head.move_to(pick_at).await?;

        self.live()?;
        head.pick(part).await?;
        Ok(())
    }

    /// Record the outcome and advance the cursor. Returns false when the
    /// job is finished.
    fn finish(&self, cursor: Cursor, outcome: PlacementOutcome) -> Result<bool, Halted> {
        let mut control = self.coordinator.lock();
        if control.generation != self.generation {
            return Err(Halted::Stale);
        }
        let bus = self.coordinator.bus();

        control.in_flight = false;
        control.draining = false;
        match outcome {
            PlacementOutcome::Placed => control.placed += 1,
            PlacementOutcome::Skipped => control.skipped += 1,
        }
        if let Some(placement) = PlacementRef::of(&self.job, cursor) {
            bus.publish(Event::PartProcessingCompleted { placement, outcome });
        }

        let next = self.job.next_cursor(cursor);
        if next.map(|n| n.board) != Some(cursor.board) {
            if let Some(board) = BoardRef::of(&self.job, cursor.board) {
                bus.publish(Event::BoardProcessingCompleted { board });
            }
        }
        control.cursor = next;

        if next.is_none() {
            self.complete(&mut control);
            return Ok(false);
        }
        if control.auto_pause {
            control.auto_pause = false;
            if control.state == JobState::Running {
                self.coordinator.set_state(&mut control, JobState::Paused);
            }
        }
        Ok(true)
    }

    fn complete_now(&self) -> Result<(), Halted> {
        let mut control = self.coordinator.lock();
        if control.generation != self.generation {
            return Err(Halted::Stale);
        }
        self.complete(&mut control);
        Ok(())
    }

    /// The reason the machine gave for dropping out, when it gives one
    /// promptly. Falls back to a generic reason.
    async fn disable_reason(&mut self) -> String {
        let deadline = Instant::now() + DISABLE_NOTICE_WAIT;
        loop {
            match tokio::time::timeout_at(deadline, self.notices.recv()).await {
                Ok(Ok(MachineEvent::Disabled { reason })) => return reason,
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => {}
                Ok(Err(RecvError::Closed)) | Err(_) => {
                    return CommandError::MachineDisabled.to_string();
                }
            }
        }
    }

    fn complete(&self, control: &mut Control) {
        tracing::info!(
            placed = control.placed,
            skipped = control.skipped,
            "job completed"
        );
        self.coordinator.bus().publish(Event::JobCompleted {
            placed: control.placed,
            skipped: control.skipped,
        });
        control.cursor = None;
        control.steps = 0;
        control.in_flight = false;
        control.draining = false;
        control.auto_pause = false;
        self.coordinator.set_state(control, JobState::Stopped);
    }

    /// Report a fatal error once and stop, unless the run was already stopped
    fn fail(&self, kind: JobErrorKind, description: String) {
        let mut control = self.coordinator.lock();
        if control.generation != self.generation || control.state == JobState::Stopped {
            tracing::warn!(%kind, %description, "error after run was stopped");
            return;
        }

        tracing::error!(%kind, %description, "job failed");
        self.coordinator
            .bus()
            .publish(Event::JobError { kind, description });
        self.coordinator.halt(&mut control);
    }

    /// Classify a hardware error from a non-retried command
    fn failure(&self, error: &MachineError, kind: JobErrorKind, description: String) -> Halted {
        if *error == MachineError::Disabled || !self.coordinator.machine().is_enabled() {
            Halted::MachineDisabled
        } else {
            Halted::Failed(kind, description)
        }
    }

    fn check_machine(&self) -> Result<(), Halted> {
        if self.coordinator.config().check_machine_each_placement
            && !self.coordinator.machine().is_enabled()
        {
            return Err(Halted::MachineDisabled);
        }
        Ok(())
    }

    /// This run is still the current one
    fn live(&self) -> Result<(), Halted> {
        if self.coordinator.lock().generation == self.generation {
            Ok(())
        } else {
            Err(Halted::Stale)
        }
    }

    /// No forced stop since launch
    fn unlocked(&self) -> Result<(), Halted> {
        if self.coordinator.lock().lockout {
            Err(Halted::Stale)
        } else {
            Ok(())
        }
    }

    /// Publish if this run is current, otherwise halt
    fn emit(&self, event: Event) -> Result<(), Halted> {
        let control = self.coordinator.lock();
        if control.generation != self.generation {
            return Err(Halted::Stale);
        }
        self.coordinator.bus().publish(event);
        Ok(())
    }

    /// Publish if this run is current
    fn announce(&self, event: Event) {
        let _ = self.emit(event);
    }
}
