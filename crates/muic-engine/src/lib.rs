//! SM5502 MUIC Engine
//!
//! This crate classifies what is plugged into a micro-USB receptacle behind
//! an SM5502 and reports attach/detach transitions to a cable sink.
//!
//! # Architecture
//!
//! - The **classifier** is a priority-ordered decision table over a
//!   register snapshot. Attach runs it on fresh reads; detach runs it on the
//!   snapshot remembered from the last attach, because most registers read
//!   zero by the time a detach interrupt fires.
//! - The **dispatcher** turns interrupt status words into an attach pass,
//!   a detach pass, a desk-dock charger update, or nothing.
//! - The [`Muic`] engine owns the chip port, the sink and the session state
//!   behind one lock and runs every pass under it.
//! - The **actor** wires the engine to tokio: a coalescing interrupt line,
//!   the deferred startup pass, resume, and the mode control surface.
//!
//! # Example
//!
//! ```rust
//! use muic_engine::{Cable, EngineConfig, Muic, RecordingSink};
//! use muic_sim::{Accessory, SimulatedChip};
//!
//! let chip = SimulatedChip::new();
//! let sink = RecordingSink::new();
//! let muic = Muic::new(chip.clone(), sink.clone(), EngineConfig::default());
//!
//! chip.plug(Accessory::Usb);
//! muic.handle_interrupt();
//! assert_eq!(muic.current_cable(), Some(Cable::Usb));
//! ```

pub mod actor;
pub mod cable;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod sink;

// Re-export actor types
pub use actor::{run_muic_actor, spawn_muic_actor, MuicCommand, MuicHandle};

pub use cable::{Cable, UsbState};
pub use classifier::{classify_attach, classify_detach, normalize_for_attach, Decision};
pub use config::{Capabilities, EngineConfig};
pub use dispatcher::{decide, decode_interrupt, DispatchAction, InterruptKind};
pub use effects::{NoHooks, PlatformHooks, SideEffect};
pub use engine::{ManualSwitchReading, Muic, MuicStatus};
pub use error::MuicError;
pub use events::{MuicEvent, PassAction, PassReport, PassTrigger};
pub use session::{ModeOverrides, SessionState};
pub use sink::{CableReport, CableSink, ChannelSink, RecordingSink};
