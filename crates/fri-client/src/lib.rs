//! Cycle engine for the cyclic controller protocol.
//!
//! The controller sends one monitoring datagram per cycle; the engine
//! decodes it, tracks the controller's session state, runs the
//! application's callbacks and answers with one command datagram. Only
//! `COMMANDING_ACTIVE` cycles carry motion commands; every other cycle, and
//! every cycle whose datagram fails to decode, is answered with a heartbeat.

pub mod callbacks;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod runner;
pub mod session;

pub use callbacks::ClientCallbacks;
pub use config::ClientConfig;
pub use dispatcher::{CycleDispatcher, CycleOutcome, CycleReport, CycleStats};
pub use error::{CallbackError, ClientError, Result};
pub use runner::{CycleRunner, StepOutcome};
pub use session::{SessionStateMachine, Transition};
