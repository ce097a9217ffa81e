//! The generic per-task top-level loop every task's stack is prepared to
//! jump into on first dispatch.
//!
//! Unlike the rest of the kernel, this module has exactly one function, and
//! every task on the system shares it: behavior comes entirely from the
//! task's own routine list, not from a per-task entry point.

use crate::kernel::Kernel;

/// One activation of the currently dispatched task: run every enabled
/// routine in order, then the epilogue that reschedules the task and yields.
///
/// On the real target this is the body of an infinite loop that never
/// returns — interrupts only ever preempt it, they never let it fall off the
/// end. [`Kernel::schedule`] supplies that outer loop itself, calling this
/// once per dispatch, so the same function serves as both the hardware
/// entry point and a host-testable single step.
pub fn task_main() {
    let tcb = Kernel::current_task();
    tcb.run_routines();
    epilogue();
}

fn epilogue() {
    let tcb = Kernel::current_task();
    crate::lock::lock();
    tcb.schedule.set(tcb.schedule.get().saturating_add(tcb.interval.get()));
    #[cfg(feature = "enable_monitor")]
    crate::monitor::finalize_task(tcb);
    #[cfg(feature = "enable_monitor")]
    {
        if tcb.priority().get() == crate::task::priority::IDLE {
            crate::monitor::transmit_if_requested();
        }
    }
    crate::lock::unlock();
}
