//! Host-runnable port used by every test in this crate and by any build not
//! targeting `avr`.
//!
//! There is no real stack-switch here: `save_context`/`restore_context` are
//! no-ops, and this port exists so the pure logic (selection, tick
//! bookkeeping, monitor state machine, tick-sync math) has a `Port` to
//! compile against without hardware. A simulated free-running counter
//! stands in for the real timer so `read_counter`/`cycle_count` still
//! behave like a monotonic clock under test.

use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use crate::config::TickConfig;
use crate::task::TaskControlBlock;

use super::{Context, Port};

static COUNTER: AtomicU16 = AtomicU16::new(0);
static CYCLES: AtomicU32 = AtomicU32::new(0);
static COMPARE_TOP: AtomicU16 = AtomicU16::new(0);

#[derive(Debug, Clone, Copy, Default)]
pub struct SimContext;

impl Context for SimContext {}

pub struct Sim;

impl Sim {
    /// Test-only hook: advances the simulated free-running counter and cycle
    /// clock by `n`, as if `n` timer ticks had elapsed.
    pub fn advance_counter(n: u16) {
        COUNTER.fetch_add(n, Ordering::Relaxed);
        CYCLES.fetch_add(n as u32, Ordering::Relaxed);
    }

    pub fn set_counter(value: u16) {
        COUNTER.store(value, Ordering::Relaxed);
    }

    pub fn compare_top() -> u16 {
        COMPARE_TOP.load(Ordering::Relaxed)
    }

    pub fn reset() {
        COUNTER.store(0, Ordering::Relaxed);
        CYCLES.store(0, Ordering::Relaxed);
        COMPARE_TOP.store(0, Ordering::Relaxed);
    }
}

impl Port for Sim {
    type Ctx = SimContext;

    fn prepare_stack(_tcb: &'static TaskControlBlock) {}

    fn save_context(_ctx: &mut Self::Ctx) {}

    fn restore_context(_ctx: &Self::Ctx) {}

    fn enable_tick_interrupt(_config: &TickConfig) {}

    fn program_compare_top(top: u16) {
        COMPARE_TOP.store(top, Ordering::Relaxed);
    }

    fn read_counter() -> u16 {
        COUNTER.load(Ordering::Relaxed)
    }

    fn cycle_count() -> u32 {
        CYCLES.load(Ordering::Relaxed)
    }
}
