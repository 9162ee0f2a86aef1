//! Keyboard input mapped to demo actions.
//!
//! # Invariants
//! - The app consumes [`Action`]s, never raw key codes.
//! - Continuous actions are sampled every frame from held keys; one-shot
//!   actions fire once per press.

pub mod action;
mod bindings;

pub use action::Action;
pub use bindings::{InputState, KeyBindings};
