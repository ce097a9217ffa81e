//! The periodic tick: programs the hardware timer, then on every interrupt
//! runs the shared kernel bookkeeping before falling into the scheduler.
//!
//! Three sources are supported, chosen by [`crate::config::TickSource`] and
//! programmed by the active [`crate::ports::Port`]: 8-bit timer overflow,
//! 16-bit compare-match (preferred; exact), and an external interrupt line
//! (no top is programmed; the source is whatever asserts the line).

use crate::config::TickConfig;
use crate::kernel::Kernel;
use crate::ports::SelectedPort;

/// Programs the timer and enables its interrupt. Must run once at startup,
/// after every task has been registered with [`Kernel::init_task`].
pub fn tick_init(config: TickConfig) {
    Kernel::init(config);
}

/// The tick interrupt's entry point once register state has been saved.
///
/// Runs the shared bookkeeping ([`Kernel::on_tick`]) and falls through to
/// [`Kernel::schedule`]; on the real target this never returns to the ISR
/// prologue, it returns into whichever task gets selected via a
/// return-from-interrupt instead.
pub fn on_tick_isr() -> ! {
    Kernel::on_tick();
    Kernel::schedule();
}

pub use SelectedPort as ActivePort;
