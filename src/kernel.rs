//! Global kernel state: the priority-ordered task list, the task currently
//! running, and the tick-driven bookkeeping that touches both.
//!
//! Everything here lives in one process-wide [`KernelState`] singleton,
//! reached through `Cell`s instead of a bare `static mut` so interior
//! mutation stays explicit. All of it is either ISR-local or must be
//! wrapped in [`crate::lock`].

use core::cell::Cell;

use crate::config::TickConfig;
use crate::ports::{Port, SelectedPort};
use crate::task::TaskControlBlock;

struct KernelState {
    task_list: Cell<*const TaskControlBlock>,
    current: Cell<*const TaskControlBlock>,
    config: Cell<TickConfig>,
    #[cfg(feature = "enable_time")]
    us_time: Cell<u32>,
    #[cfg(feature = "enable_time")]
    s_time: Cell<u32>,
    #[cfg(feature = "enable_tick_sync")]
    sync: Cell<crate::tick_sync::SyncState>,
    #[cfg(feature = "enable_monitor")]
    monitor_ctl: Cell<crate::monitor::MonitorControl>,
}

// SAFETY: single hardware thread of execution; the only preemption source is
// the tick interrupt, and every mutation path is either ISR-only or runs
// under `crate::lock`.
unsafe impl Sync for KernelState {}

static KERNEL: KernelState = KernelState {
    task_list: Cell::new(core::ptr::null()),
    current: Cell::new(core::ptr::null()),
    config: Cell::new(TickConfig::new(
        2500,
        64,
        16_000_000,
        crate::config::TickSource::TimerCompare,
    )),
    #[cfg(feature = "enable_time")]
    us_time: Cell::new(0),
    #[cfg(feature = "enable_time")]
    s_time: Cell::new(0),
    #[cfg(feature = "enable_tick_sync")]
    sync: Cell::new(crate::tick_sync::SyncState::new()),
    #[cfg(feature = "enable_monitor")]
    monitor_ctl: Cell::new(crate::monitor::MonitorControl::new()),
};

/// Entry point into the kernel's global state. A zero-sized handle onto the
/// single process-wide scheduler instance.
pub struct Kernel;

impl Kernel {
    /// Programs the hardware tick and records the timing configuration. Must
    /// run once, before any task is dispatched.
    pub fn init(config: TickConfig) {
        KERNEL.config.set(config);
        SelectedPort::enable_tick_interrupt(&config);
    }

    /// Inserts `tcb` into the priority-ordered task list and lays out its
    /// stack so the first dispatch lands in the generic task runner.
    ///
    /// # Panics
    ///
    /// Panics if `tcb` shares a priority with an already-inserted task:
    /// priorities must be unique.
    pub fn init_task(tcb: &'static TaskControlBlock) {
        log::info!("init_task: '{}' priority={} interval={}", tcb.name(), tcb.priority().get(), tcb.interval.get());
        SelectedPort::prepare_stack(tcb);
        #[cfg(feature = "enable_monitor")]
        crate::monitor::init_task_stack(tcb);
        insert_sorted(tcb);
        if KERNEL.current.get().is_null() {
            KERNEL.current.set(tcb);
        }
    }

    /// The currently dispatched task.
    pub fn current_task() -> &'static TaskControlBlock {
        // SAFETY: `current` always points at a `'static` TCB handed to
        // `init_task`, or is set before the first call to this function.
        unsafe { &*KERNEL.current.get() }
    }

    pub fn config() -> TickConfig {
        KERNEL.config.get()
    }

    /// Picks the highest-priority runnable task. The idle task (priority
    /// 255, interval 0) is always present and always runnable, so this never
    /// finds nothing: its `schedule` only ever goes more negative, never
    /// positive.
    pub fn select_next() -> &'static TaskControlBlock {
        let mut cur = KERNEL.task_list.get();
        loop {
            debug_assert!(!cur.is_null(), "task list must contain at least the idle task");
            // SAFETY: list nodes are `'static` TCBs inserted by `init_task`.
            let tcb = unsafe { &*cur };
            if tcb.runnable() {
                return tcb;
            }
            cur = tcb.next.get();
        }
    }

    /// Visits every registered task in priority order. Useful for health
    /// checks and, in tests, for asserting the shape of the task list.
    pub fn for_each_task(mut f: impl FnMut(&'static TaskControlBlock)) {
        let mut cur = KERNEL.task_list.get();
        while !cur.is_null() {
            // SAFETY: see `select_next`.
            let tcb = unsafe { &*cur };
            f(tcb);
            cur = tcb.next.get();
        }
    }

    /// Runs the per-tick bookkeeping shared by every tick source: time
    /// accumulation, schedule countdown, tick-sync correction and the
    /// monitor interval sweep. Called from the tick ISR with interrupts
    /// already disabled (or directly by tests against [`crate::ports::sim`]).
    pub fn on_tick() {
        #[cfg(feature = "enable_time")]
        advance_time();

        #[cfg(feature = "enable_monitor")]
        crate::monitor::account_current_task();

        let mut cur = KERNEL.task_list.get();
        while !cur.is_null() {
            // SAFETY: see `select_next`.
            let tcb = unsafe { &*cur };
            tcb.schedule
                .set(tcb.schedule.get().saturating_sub(1));
            cur = tcb.next.get();
        }

        #[cfg(feature = "enable_tick_sync")]
        crate::tick_sync::apply_correction();

        #[cfg(feature = "enable_monitor")]
        crate::monitor::sweep_interval();
    }

    /// Dispatches `current` to run as the generic task runner and never
    /// returns control to the caller. On the real target this falls into the
    /// shared assembly entry the tick ISR also jumps through; this Rust
    /// wrapper exists so application code has one call site to start the
    /// kernel.
    pub fn schedule() -> ! {
        loop {
            Self::dispatch_once();
        }
    }

    /// Selects the next task to run and runs exactly one activation of it
    /// (its routine list plus epilogue), then returns which task it was.
    ///
    /// This is the single step [`Self::schedule`]'s infinite loop repeats
    /// forever; exposed on its own so tests can drive and observe the
    /// dispatch sequence without the call never returning.
    pub fn dispatch_once() -> &'static TaskControlBlock {
        let next = Self::select_next();
        KERNEL.current.set(next);
        crate::runner::task_main();
        next
    }

    pub(crate) fn task_list_head() -> *const TaskControlBlock {
        KERNEL.task_list.get()
    }

    /// Clears every registered task and restores default tick configuration.
    ///
    /// This kernel's lifecycle otherwise never removes a task, so this
    /// exists purely to isolate tests that each want a fresh task list in
    /// the same process.
    pub fn reset() {
        KERNEL.task_list.set(core::ptr::null());
        KERNEL.current.set(core::ptr::null());
        KERNEL.config.set(TickConfig::default());
        #[cfg(feature = "enable_time")]
        {
            KERNEL.us_time.set(0);
            KERNEL.s_time.set(0);
        }
        #[cfg(feature = "enable_tick_sync")]
        KERNEL.sync.set(crate::tick_sync::SyncState::new());
        #[cfg(feature = "enable_monitor")]
        KERNEL.monitor_ctl.set(crate::monitor::MonitorControl::new());
    }
}

fn insert_sorted(tcb: &'static TaskControlBlock) {
    let head = KERNEL.task_list.get();
    if head.is_null() {
        KERNEL.task_list.set(tcb);
        return;
    }
    // SAFETY: list nodes are `'static` TCBs inserted by `init_task`.
    let head_ref = unsafe { &*head };
    if tcb.priority() < head_ref.priority() {
        tcb.next.set(head);
        KERNEL.task_list.set(tcb);
        return;
    }
    let mut cur = head;
    loop {
        // SAFETY: see above.
        let cur_ref = unsafe { &*cur };
        assert!(
            cur_ref.priority() != tcb.priority(),
            "task priorities must be unique"
        );
        let next = cur_ref.next.get();
        if next.is_null() {
            cur_ref.next.set(tcb);
            return;
        }
        // SAFETY: see above.
        let next_ref = unsafe { &*next };
        if tcb.priority() < next_ref.priority() {
            tcb.next.set(next);
            cur_ref.next.set(tcb);
            return;
        }
        cur = next;
    }
}

#[cfg(feature = "enable_time")]
fn advance_time() {
    let usec = KERNEL.config.get().tick_length_usec();
    let mut us = KERNEL.us_time.get() + usec;
    while us >= 1_000_000 {
        us -= 1_000_000;
        KERNEL.s_time.set(KERNEL.s_time.get() + 1);
    }
    KERNEL.us_time.set(us);
}

#[cfg(feature = "enable_time")]
pub(crate) fn us_time() -> u32 {
    KERNEL.us_time.get()
}

#[cfg(feature = "enable_time")]
pub(crate) fn s_time() -> u32 {
    KERNEL.s_time.get()
}

#[cfg(feature = "enable_tick_sync")]
pub(crate) fn sync_state() -> crate::tick_sync::SyncState {
    KERNEL.sync.get()
}

#[cfg(feature = "enable_tick_sync")]
pub(crate) fn set_sync_state(state: crate::tick_sync::SyncState) {
    KERNEL.sync.set(state);
}

#[cfg(feature = "enable_monitor")]
pub(crate) fn monitor_control() -> crate::monitor::MonitorControl {
    KERNEL.monitor_ctl.get()
}

#[cfg(feature = "enable_monitor")]
pub(crate) fn set_monitor_control(ctl: crate::monitor::MonitorControl) {
    KERNEL.monitor_ctl.set(ctl);
}

/// Cycle count since an arbitrary, wrapping epoch, used by routine/task
/// bracketing to measure elapsed execution cycles.
pub(crate) fn current_cycles() -> u32 {
    SelectedPort::cycle_count()
}
