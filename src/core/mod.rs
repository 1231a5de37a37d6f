//! Core module - intent classification and command execution.
//!
//! This module contains the heart of NeuroFusion's command processing:
//! - Ordered pattern classifier
//! - Executor that turns intents into exactly one action
//! - Bounded command history
//! - Restricted arithmetic evaluator

pub mod calculator;
pub mod executor;
pub mod history;
pub mod intent;

pub use executor::{Assistant, CommandEvent};
pub use history::{CommandHistory, CommandRecord};
pub use intent::{classify, Classification, Intent};
