//! `artx` is a preemptive, priority-driven real-time executive for single-core
//! 8-bit microcontrollers.
//!
//! The kernel schedules a small, statically defined set of [`task`] entries,
//! each running a list of [`routine`] entries, against a periodic hardware
//! tick ([`tick`]). Scheduling is strict-priority with a saturating per-tick
//! countdown ([`kernel`]); an optional proportional controller keeps the tick
//! aligned with an external reference ([`tick_sync`]); an optional monitor
//! tracks per-task/per-routine cycle counts and stack high-water marks and
//! serializes them for an external collector ([`monitor`]).
//!
//! There is no heap here: every [`task::TaskControlBlock`] and
//! [`routine::RoutineControlBlock`] is a `static` item linked into intrusive
//! lists, the way the rest of this crate's hardware ports are wired up at
//! compile time through [`ports`].
#![no_std]

pub mod config;
pub mod kernel;
pub mod lock;
pub mod ports;
pub mod routine;
pub mod runner;
pub mod task;
pub mod tick;

#[cfg(feature = "enable_monitor")]
pub mod monitor;

#[cfg(feature = "enable_tick_sync")]
pub mod tick_sync;

#[cfg(feature = "enable_time")]
pub mod time;

pub use config::TickConfig;
pub use kernel::Kernel;
pub use lock::{lock, unlock};
pub use routine::{RoutineControlBlock, RoutineState};
pub use task::{TaskControlBlock, TaskPriority};
