//! Core lifecycle logic.
//!
//! - Controller: drives a session from recording to settled results

pub mod controller;

pub use controller::Controller;
