//! Scripted accessory scenarios
//!
//! A scenario is a list of physical events (plug, unplug, VBUS changes) and
//! control-surface calls played against a simulated chip. Physical events
//! latch the chip's interrupt bits and then raise the interrupt line, the
//! way the board's IRQ would.

use std::time::Duration;

use muic_engine::{spawn_muic_actor, ChannelSink, MuicError, MuicEvent, MuicHandle, Muic};
use muic_regs::SwitchPath;
use muic_sim::{Accessory, SimulatedChip};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::report::describe_status;
use crate::settings::Settings;

const EVENT_CAPACITY: usize = 256;

/// One scenario step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    // -------------------------------------------------------------------------
    // Physical events
    // -------------------------------------------------------------------------
    Plug { accessory: Accessory },
    Unplug,
    /// Bus power changes with the ID line untouched
    Vbus { on: bool },
    /// Swap faster than the chip debounces (None: swap to nothing)
    Bounce {
        #[serde(default)]
        accessory: Option<Accessory>,
    },

    // -------------------------------------------------------------------------
    // Control surface
    // -------------------------------------------------------------------------
    Resume,
    SetUart { enabled: bool },
    /// Path name as the control surface spells it (UART, AUDIO, DHOST, VAUDIO, AUTO)
    ManualSwitch { path: String },
    Reset,
    Status,

    // -------------------------------------------------------------------------
    // Timing
    // -------------------------------------------------------------------------
    Wait { ms: u64 },
}

/// Plays scenario steps against a running engine
pub struct Runner {
    handle: MuicHandle,
    chip: SimulatedChip,
}

/// Build the simulated chip and engine for the settings and spawn the actor
///
/// Every engine event (cable announcements included) arrives on the
/// returned receiver. The receiver closes once the actor has stopped.
pub fn start(settings: &Settings) -> (Runner, JoinHandle<()>, mpsc::Receiver<MuicEvent>) {
    let chip = if settings.rustproof {
        SimulatedChip::with_rustproof()
    } else {
        SimulatedChip::new()
    };
    if let Some(accessory) = settings.boot_accessory {
        info!("{} present at power-on", accessory);
        chip.insert_quietly(accessory);
    }

    let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
    let engine = Muic::new(
        chip.clone(),
        ChannelSink::new(event_tx.clone()),
        settings.engine.clone(),
    );
    let (handle, task) = spawn_muic_actor(engine, event_tx);
    (Runner { handle, chip }, task, event_rx)
}

impl Runner {
    pub fn handle(&self) -> &MuicHandle {
        &self.handle
    }

    #[cfg(test)]
    pub fn chip(&self) -> &SimulatedChip {
        &self.chip
    }

    /// Run every step in order, stopping at the first one that cannot run
    pub async fn run(&self, steps: &[ScenarioStep]) -> anyhow::Result<()> {
        for (index, step) in steps.iter().enumerate() {
            debug!("Step {}: {:?}", index, step);
            self.step(step).await?;
        }
        Ok(())
    }

    /// Run one step
    ///
    /// Refusals from the control surface (a locked manual switch, a failed
    /// reset) are logged and the scenario goes on; a stopped engine or an
    /// unknown path name ends it.
    pub async fn step(&self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Plug { accessory } => {
                self.chip.plug(*accessory);
                self.handle.interrupt();
            }
            ScenarioStep::Unplug => {
                self.chip.unplug();
                self.handle.interrupt();
            }
            ScenarioStep::Vbus { on } => {
                self.chip.set_vbus(*on);
                self.handle.interrupt();
            }
            ScenarioStep::Bounce { accessory } => {
                self.chip.bounce(*accessory);
                self.handle.interrupt();
            }
            ScenarioStep::Resume => self.handle.resume().await?,
            ScenarioStep::SetUart { enabled } => self.handle.set_uart_enabled(*enabled).await?,
            ScenarioStep::ManualSwitch { path } => {
                let path: SwitchPath = path.parse().map_err(MuicError::from)?;
                match self.handle.set_manual_switch(path).await {
                    Ok(()) => info!("Manual switch set to {}", path),
                    Err(MuicError::ActorStopped) => return Err(MuicError::ActorStopped.into()),
                    Err(e) => warn!("Manual switch to {} refused: {}", path, e),
                }
            }
            ScenarioStep::Reset => match self.handle.reset().await {
                Ok(()) => {}
                Err(MuicError::ActorStopped) => return Err(MuicError::ActorStopped.into()),
                Err(e) => warn!("Reset failed: {}", e),
            },
            ScenarioStep::Status => {
                let status = self.handle.snapshot_state().await?;
                println!("{}", describe_status(&status));
            }
            ScenarioStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use muic_engine::Cable;

    fn settings(steps: Vec<ScenarioStep>) -> Settings {
        let mut settings = Settings {
            scenario: steps,
            ..Default::default()
        };
        settings.engine.startup_delay_ms = 10;
        settings.engine.reset_delay_ms = 10;
        settings
    }

    fn wait() -> ScenarioStep {
        ScenarioStep::Wait { ms: 50 }
    }

    /// Run the scenario to completion, then stop the actor and collect every event
    async fn play(settings: Settings) -> (anyhow::Result<()>, SimulatedChip, Vec<MuicEvent>) {
        let (runner, task, mut events) = start(&settings);
        let result = runner.run(&settings.scenario).await;
        runner.handle().shutdown().await.unwrap();
        task.await.unwrap();

        let mut collected = Vec::new();
        while let Some(event) = events.recv().await {
            collected.push(event);
        }
        (result, runner.chip().clone(), collected)
    }

    fn cable_events(events: &[MuicEvent]) -> Vec<(Cable, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                MuicEvent::CableAttached { cable } => Some((*cable, true)),
                MuicEvent::CableDetached { cable } => Some((*cable, false)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_step_json_shape() {
        let step: ScenarioStep =
            serde_json::from_str(r#"{ "step": "plug", "accessory": "desk_dock_vbus" }"#).unwrap();
        assert_eq!(
            step,
            ScenarioStep::Plug {
                accessory: Accessory::DeskDockVbus
            }
        );

        let step: ScenarioStep = serde_json::from_str(r#"{ "step": "bounce" }"#).unwrap();
        assert_eq!(step, ScenarioStep::Bounce { accessory: None });

        let step: ScenarioStep =
            serde_json::from_str(r#"{ "step": "manual_switch", "path": "AUDIO" }"#).unwrap();
        assert_eq!(
            step,
            ScenarioStep::ManualSwitch {
                path: "AUDIO".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_scenario_announcements() {
        let (result, _, events) = play(Settings::default()).await;
        result.unwrap();
        assert_eq!(
            cable_events(&events),
            vec![
                (Cable::Usb, true),
                (Cable::Usb, false),
                (Cable::DeskDock, true),
                (Cable::Charger, true),
                (Cable::Charger, false),
                (Cable::DeskDock, false),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_accessory_found_by_startup_pass() {
        let mut settings = settings(vec![wait()]);
        settings.boot_accessory = Some(Accessory::DedicatedCharger);
        let (result, _, events) = play(settings).await;
        result.unwrap();
        assert_eq!(cable_events(&events), vec![(Cable::Charger, true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rustproof_then_enable_uart() {
        let mut settings = settings(vec![
            wait(),
            ScenarioStep::Plug {
                accessory: Accessory::JigUartOff,
            },
            wait(),
            ScenarioStep::SetUart { enabled: true },
            wait(),
        ]);
        settings.rustproof = true;
        let (result, _, events) = play(settings).await;
        result.unwrap();

        assert_eq!(cable_events(&events), vec![(Cable::JigUartOff, true)]);
        assert!(events
            .iter()
            .any(|e| matches!(e, MuicEvent::UartModeChanged { uart_enabled: true })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_switch_step() {
        let (result, chip, _) = play(settings(vec![
            wait(),
            ScenarioStep::ManualSwitch {
                path: "AUDIO".to_string(),
            },
        ]))
        .await;
        result.unwrap();
        assert_eq!(
            chip.register(muic_regs::Register::ManualSwitch1),
            SwitchPath::Audio.bits()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_path_ends_scenario() {
        let (result, _, _) = play(settings(vec![
            ScenarioStep::ManualSwitch {
                path: "SIDEWAYS".to_string(),
            },
            ScenarioStep::Reset,
        ]))
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("SIDEWAYS"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_step() {
        let (result, chip, events) = play(settings(vec![wait(), ScenarioStep::Reset])).await;
        result.unwrap();
        assert_eq!(chip.resets(), 1);
        assert!(events.iter().any(|e| matches!(e, MuicEvent::ResetDone)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounce_step_detaches() {
        let (result, _, events) = play(settings(vec![
            wait(),
            ScenarioStep::Plug {
                accessory: Accessory::Usb,
            },
            wait(),
            ScenarioStep::Bounce { accessory: None },
            wait(),
        ]))
        .await;
        result.unwrap();
        assert_eq!(
            cable_events(&events),
            vec![(Cable::Usb, true), (Cable::Usb, false)]
        );
    }
}
