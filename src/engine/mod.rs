// src/engine/mod.rs

//! Trigger engine.
//!
//! The pure planner lives in [`core`]; the async polling shell is
//! implemented in [`runtime`].

pub mod core;
pub mod runtime;

pub use self::core::{Reschedule, TickPlan, plan_tick};
pub use runtime::{TriggerOptions, TriggerRuntime};
