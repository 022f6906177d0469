//! Interrupt-driven driver for an HC-SR04 style ultrasonic ranger sharing one
//! pin with a single timer channel.
//!
//! A measurement cycle has two phases. In the trigger phase the timer emits a
//! one-shot pulse on the pin. In the echo phase the same channel is turned
//! into an input capture and latches the counter on the rising and falling
//! edges of the echo pulse. The interrupt handler ([`isr::on_interrupt`])
//! drives the phases, and the [`task::MeasurementTask`] waits on a
//! [`signal::BinarySignal`] between them and publishes the distance.
//!
//! Hardware access goes through the traits in [`timer`], so everything in
//! this crate runs on the host as well.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod distance;
pub mod error;
pub mod isr;
pub mod signal;
pub mod state;
pub mod task;
pub mod timer;

#[cfg(test)]
mod mock;

pub use crate::config::{Config, TimerTiming};
pub use crate::distance::BAD_VALUE;
pub use crate::error::Error;
pub use crate::isr::{on_interrupt, IsrEvent, IsrOutcome};
pub use crate::signal::BinarySignal;
pub use crate::state::{CaptureSide, DistanceReader, SonarState, Stage, TaskSide};
pub use crate::task::{CycleOutcome, MeasurementTask, Scheduler};
pub use crate::timer::{EdgeCapture, PulseGenerator, SharedTimer, SonarTimer, TimerBase};
