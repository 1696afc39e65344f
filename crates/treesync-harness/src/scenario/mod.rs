//! Scenario testing.
//!
//! A scenario names its clients, scripts what the authority sends after the
//! handshake, and must end in an oracle that checks the resulting
//! [`World`]. There is no way to run a scenario without one.
//!
//! ```text
//! Scenario::new(..).client(..).render(..).patches(..)
//!          │
//!          ▼ .oracle(..)
//! RunnableScenario::run
//!   handshake every client ──> play the script ──> oracle(&World)
//! ```

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::{ClientActor, World};

/// Final-state check run after a scenario.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
