//! Hardware abstraction boundary.
//!
//! One `Port` implementation per target architecture, selected at compile
//! time with a `cfg_if!` chain keyed on `target_arch`, with a host-runnable
//! fallback used by every test in this crate.

#[cfg(target_arch = "avr")]
pub mod avr;

pub mod sim;

use crate::config::TickConfig;
use crate::task::TaskControlBlock;

/// Saved architectural state for one task. Opaque outside the port: only
/// `save_context`/`restore_context` construct and consume it.
pub trait Context: Copy {}

/// Hardware operations the kernel core needs from the target architecture:
/// context save/restore, stack layout, and the tick-timer operations the
/// tick driver and tick-sync controller need.
pub trait Port {
    type Ctx: Context;

    /// Lays out a fresh task's stack so that, the first time it is dispatched,
    /// the restore sequence returns into the generic task runner.
    fn prepare_stack(tcb: &'static TaskControlBlock);

    /// Captures the currently running task's register file into `ctx`.
    fn save_context(ctx: &mut Self::Ctx);

    /// Restores `ctx` as the architectural state that a return-from-interrupt
    /// will resume into.
    fn restore_context(ctx: &Self::Ctx);

    /// Programs the hardware timer and enables the tick interrupt.
    fn enable_tick_interrupt(config: &TickConfig);

    /// Reprograms the timer's compare/overflow top, used by the tick-sync
    /// corrector to nudge the tick period.
    fn program_compare_top(top: u16);

    /// Current free-running counter value, used both by the tick-sync
    /// corrector and by the monitor's cycle accounting.
    fn read_counter() -> u16;

    /// Monotonically increasing cycle count, used only for monitor
    /// bookkeeping; wraps freely.
    fn cycle_count() -> u32;
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "avr")] {
        pub type SelectedPort = avr::Avr;
    } else {
        pub type SelectedPort = sim::Sim;
    }
}
