//! MUIC Actor
//!
//! This module runs the engine as an async actor. The interrupt line, the
//! deferred startup pass, resume notifications and the mode control surface
//! all funnel into one task, which runs each pass on a blocking worker while
//! holding the engine lock.
//!
//! # Architecture
//!
//! - `MuicHandle::interrupt()` only wakes the actor; it never classifies.
//!   Interrupts raised while a pass is running collapse into one wakeup.
//! - Interrupts are held back until the startup pass has run, so nothing is
//!   classified before the chip has settled.
//! - Control commands arrive over a channel, with oneshot replies where the
//!   caller needs a result.
//! - Cable announcements and pass summaries come out of one event channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use muic_engine::{spawn_muic_actor, ChannelSink, EngineConfig, Muic};
//! use tokio::sync::mpsc;
//!
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//! let engine = Muic::new(port, ChannelSink::new(event_tx.clone()), EngineConfig::default());
//! let (handle, task) = spawn_muic_actor(engine, event_tx);
//!
//! // From the interrupt handler
//! handle.interrupt();
//! ```

use std::sync::Arc;

use muic_regs::{RegisterPort, SwitchPath};
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::{Muic, MuicStatus};
use crate::error::MuicError;
use crate::events::{MuicEvent, PassReport};
use crate::sink::CableSink;

const COMMAND_CAPACITY: usize = 32;

/// Commands sent to the engine actor
#[derive(Debug)]
pub enum MuicCommand {
    /// The system resumed from suspend
    Resume,

    /// Toggle rustproof mode and re-classify
    SetUartEnabled {
        /// false = rustproof (UART path closed)
        enabled: bool,
    },

    /// Soft-reset the chip after the configured delay
    Reset {
        response: oneshot::Sender<Result<(), MuicError>>,
    },

    /// Route the analog switch by hand
    SetManualSwitch {
        path: SwitchPath,
        response: oneshot::Sender<Result<(), MuicError>>,
    },

    /// Query the engine state
    SnapshotState {
        response: oneshot::Sender<MuicStatus>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Cloneable handle to a running engine actor
#[derive(Debug, Clone)]
pub struct MuicHandle {
    cmd_tx: mpsc::Sender<MuicCommand>,
    interrupt: Arc<Notify>,
}

impl MuicHandle {
    /// Signal the interrupt line
    ///
    /// Never blocks. Wakeups raised before the actor gets to them collapse
    /// into one pass; the chip keeps its status bits latched until read.
    pub fn interrupt(&self) {
        self.interrupt.notify_one();
    }

    pub async fn resume(&self) -> Result<(), MuicError> {
        self.send(MuicCommand::Resume).await
    }

    pub async fn set_uart_enabled(&self, enabled: bool) -> Result<(), MuicError> {
        self.send(MuicCommand::SetUartEnabled { enabled }).await
    }

    /// Reset the chip, returning once it has been reprogrammed
    pub async fn reset(&self) -> Result<(), MuicError> {
        let (response, rx) = oneshot::channel();
        self.send(MuicCommand::Reset { response }).await?;
        rx.await.map_err(|_| MuicError::ActorStopped)?
    }

    pub async fn set_manual_switch(&self, path: SwitchPath) -> Result<(), MuicError> {
        let (response, rx) = oneshot::channel();
        self.send(MuicCommand::SetManualSwitch { path, response })
            .await?;
        rx.await.map_err(|_| MuicError::ActorStopped)?
    }

    pub async fn snapshot_state(&self) -> Result<MuicStatus, MuicError> {
        let (response, rx) = oneshot::channel();
        self.send(MuicCommand::SnapshotState { response }).await?;
        rx.await.map_err(|_| MuicError::ActorStopped)
    }

    /// Stop the actor. A startup pass that has not fired yet never runs.
    pub async fn shutdown(&self) -> Result<(), MuicError> {
        self.send(MuicCommand::Shutdown).await
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    async fn send(&self, cmd: MuicCommand) -> Result<(), MuicError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| MuicError::ActorStopped)
    }
}

/// Spawn the actor for an engine
///
/// `event_tx` receives pass summaries and control outcomes. Cable
/// announcements go wherever the engine's sink sends them, usually a
/// [`ChannelSink`](crate::sink::ChannelSink) on the same channel.
pub fn spawn_muic_actor<P, S>(
    engine: Muic<P, S>,
    event_tx: mpsc::Sender<MuicEvent>,
) -> (MuicHandle, JoinHandle<()>)
where
    P: RegisterPort + 'static,
    S: CableSink + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CAPACITY);
    let interrupt = Arc::new(Notify::new());
    let task = tokio::spawn(run_muic_actor(
        Arc::new(engine),
        cmd_rx,
        Arc::clone(&interrupt),
        event_tx,
    ));
    (MuicHandle { cmd_tx, interrupt }, task)
}

/// Run the engine actor until shutdown or until every handle is dropped
pub async fn run_muic_actor<P, S>(
    engine: Arc<Muic<P, S>>,
    mut cmd_rx: mpsc::Receiver<MuicCommand>,
    interrupt: Arc<Notify>,
    event_tx: mpsc::Sender<MuicEvent>,
) where
    P: RegisterPort + 'static,
    S: CableSink + 'static,
{
    info!("MUIC actor started");

    let startup = tokio::time::sleep(engine.config().startup_delay());
    tokio::pin!(startup);
    let mut started = false;

    loop {
        tokio::select! {
            () = &mut startup, if !started => {
                started = true;
                let result = blocking(&engine, |m| m.startup_pass()).await;
                emit_report(&event_tx, result).await;
            }

            () = interrupt.notified(), if started => {
                let result = blocking(&engine, |m| m.handle_interrupt()).await;
                emit_report(&event_tx, result).await;
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    MuicCommand::Resume => {
                        let result = blocking(&engine, |m| m.resume_pass()).await;
                        emit_report(&event_tx, result).await;
                    }

                    MuicCommand::SetUartEnabled { enabled } => {
                        let result = blocking(&engine, move |m| m.set_uart_enabled(enabled)).await;
                        let ok = result.is_ok();
                        emit_report(&event_tx, result).await;
                        if ok {
                            let _ = event_tx
                                .send(MuicEvent::UartModeChanged { uart_enabled: enabled })
                                .await;
                        }
                    }

                    MuicCommand::Reset { response } => {
                        let delay = engine.config().reset_delay();
                        info!("SM5502 reset after {} ms", delay.as_millis());
                        tokio::time::sleep(delay).await;

                        let result = blocking(&engine, |m| m.reset()).await.and_then(|r| r);
                        match &result {
                            Ok(()) => {
                                let _ = event_tx.send(MuicEvent::ResetDone).await;
                            }
                            Err(e) => emit_error(&event_tx, "reset", e).await,
                        }
                        let _ = response.send(result);
                    }

                    MuicCommand::SetManualSwitch { path, response } => {
                        let result = blocking(&engine, move |m| m.set_manual_switch(path))
                            .await
                            .and_then(|r| r);
                        if let Err(e) = &result {
                            emit_error(&event_tx, "manual switch", e).await;
                        }
                        let _ = response.send(result);
                    }

                    MuicCommand::SnapshotState { response } => {
                        // No pass is in flight here, so the lock is free
                        let _ = response.send(engine.status());
                    }

                    MuicCommand::Shutdown => {
                        debug!("MUIC actor shutdown requested");
                        break;
                    }
                }
            }
        }
    }

    info!("MUIC actor stopped");
}

/// Run one engine call on the blocking pool
async fn blocking<P, S, R, F>(engine: &Arc<Muic<P, S>>, f: F) -> Result<R, MuicError>
where
    P: RegisterPort + 'static,
    S: CableSink + 'static,
    R: Send + 'static,
    F: FnOnce(&Muic<P, S>) -> R + Send + 'static,
{
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| MuicError::TaskFailed(e.to_string()))
}

async fn emit_report(event_tx: &mpsc::Sender<MuicEvent>, result: Result<PassReport, MuicError>) {
    match result {
        Ok(report) => {
            let _ = event_tx.send(MuicEvent::PassCompleted { report }).await;
        }
        Err(e) => emit_error(event_tx, "pass", &e).await,
    }
}

async fn emit_error(event_tx: &mpsc::Sender<MuicEvent>, source: &str, e: &MuicError) {
    error!("MUIC {} failed: {}", source, e);
    let _ = event_tx
        .send(MuicEvent::Error {
            source: source.to_string(),
            message: e.to_string(),
        })
        .await;
}
