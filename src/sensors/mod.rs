//! Sensors module - simulated safe controller for demo mode

mod simulator;

pub use simulator::*;
