//! Routine control blocks: the per-task list of parameterless functions a
//! [`TaskControlBlock`](crate::task::TaskControlBlock) runs once per activation.

use core::cell::Cell;

/// A routine, once wired into its owning task, is either skipped or run in
/// full every activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineState {
    Disabled,
    Enabled,
}

#[cfg(feature = "enable_monitor")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RoutineMonitor {
    pub current_cycles: i32,
    pub peak_cycles: u32,
    pub total_cycles: u64,
    pub run_counter: u32,
    pub intervals: u32,
    pub running: bool,
    pub state: crate::monitor::MonitorState,
}

/// A single routine, statically allocated by the application and linked into
/// its task's routine list via [`crate::task::TaskControlBlock::push_rout`].
///
/// `next` is a raw pointer rather than a reference: routine and task storage
/// are independent `'static` items wired together after the fact, which is
/// exactly the shape an intrusive singly-linked list needs in `no_std`
/// without a heap.
#[repr(C)]
pub struct RoutineControlBlock {
    pub(crate) rout: fn(),
    pub(crate) next: Cell<*const RoutineControlBlock>,
    #[cfg(feature = "use_rout_state")]
    pub(crate) state: Cell<RoutineState>,
    #[cfg(feature = "enable_monitor")]
    pub(crate) monitor: Cell<RoutineMonitor>,
    pub(crate) name: &'static str,
}

// SAFETY: the kernel is single-threaded; all mutation happens either from
// the tick ISR or under `crate::lock`.
unsafe impl Sync for RoutineControlBlock {}

impl RoutineControlBlock {
    pub const fn new(name: &'static str, rout: fn()) -> Self {
        RoutineControlBlock {
            rout,
            next: Cell::new(core::ptr::null()),
            #[cfg(feature = "use_rout_state")]
            state: Cell::new(RoutineState::Enabled),
            #[cfg(feature = "enable_monitor")]
            monitor: Cell::new(RoutineMonitor {
                current_cycles: 0,
                peak_cycles: 0,
                total_cycles: 0,
                run_counter: 0,
                intervals: 0,
                running: false,
                state: crate::monitor::MonitorState::Collect,
            }),
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[cfg(feature = "use_rout_state")]
    pub fn enable(&self) {
        self.state.set(RoutineState::Enabled);
    }

    #[cfg(feature = "use_rout_state")]
    pub fn disable(&self) {
        self.state.set(RoutineState::Disabled);
    }

    #[cfg(feature = "use_rout_state")]
    pub fn state(&self) -> RoutineState {
        self.state.get()
    }

    #[cfg(not(feature = "use_rout_state"))]
    pub fn state(&self) -> RoutineState {
        RoutineState::Enabled
    }

    pub(crate) fn run(&'static self) {
        if self.state() == RoutineState::Disabled {
            return;
        }
        #[cfg(feature = "enable_monitor")]
        {
            let before = crate::kernel::current_cycles();
            let mut m = self.monitor.get();
            m.running = true;
            self.monitor.set(m);
            (self.rout)();
            let elapsed = crate::kernel::current_cycles().wrapping_sub(before);
            let mut m = self.monitor.get();
            m.running = false;
            m.run_counter = m.run_counter.wrapping_add(1);
            m.total_cycles = m.total_cycles.wrapping_add(elapsed as u64);
            if elapsed > m.peak_cycles {
                m.peak_cycles = elapsed;
            }
            self.monitor.set(m);
            return;
        }
        #[cfg(not(feature = "enable_monitor"))]
        (self.rout)();
    }
}
