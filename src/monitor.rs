//! Per-task/per-routine cycle counters, stack high-water-mark probing, and
//! the wire serializer that ships them off to an external collector.
//!
//! The collection side brackets every routine call and every task epilogue
//! with cycle accounting; the transmit side runs only from the idle task, so
//! it is allowed to block on whatever [`MonitorSink`] the application wires
//! up without starving any user task.

use core::cell::Cell;

use crate::kernel::{self, Kernel};
#[cfg(feature = "use_multi_rout")]
use crate::routine::RoutineControlBlock;
use crate::task::TaskControlBlock;

/// Stack sentinel byte pre-loaded into a task's stack region; the first
/// non-sentinel byte scanning from the bottom gives the high-water mark.
pub const STACK_SENTINEL: u8 = 0xc3;

pub const MONITOR_VERSION: u8 = 0;
const MARKER: &[u8; 4] = b"ARTX";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Collect,
    Ready,
    Sent,
}

impl Default for MonitorState {
    fn default() -> Self {
        MonitorState::Collect
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorControl {
    pub(crate) interval: u32,
    pub(crate) countdown: u32,
    pub(crate) transmit_request: bool,
}

impl MonitorControl {
    pub const fn new() -> Self {
        MonitorControl {
            interval: 0,
            countdown: 0,
            transmit_request: false,
        }
    }
}

/// Sets how many ticks elapse between transmit attempts. `0` disables
/// monitoring emission entirely (the counters still accumulate).
pub fn monitor_set_interval(ticks: u32) {
    let mut ctl = kernel::monitor_control();
    ctl.interval = ticks;
    ctl.countdown = ticks;
    kernel::set_monitor_control(ctl);
}

/// Minimal transport the serializer writes frames to. Left to the
/// application to implement over whatever leaf driver it has (serial,
/// SPI, ...); the kernel only ever calls `write_all`.
pub trait MonitorSink {
    fn write_all(&self, bytes: &[u8]);
}

struct SinkCell(Cell<Option<&'static dyn MonitorSink>>);
// SAFETY: single hardware thread; the sink is installed once at startup
// before the scheduler starts and never mutated concurrently with a send.
unsafe impl Sync for SinkCell {}

static SINK: SinkCell = SinkCell(Cell::new(None));

pub fn set_sink(sink: &'static dyn MonitorSink) {
    SINK.0.set(Some(sink));
}

/// Adds cycles elapsed since the last switch to the currently running task's
/// `current_cycles`, while it is in `Collect` state. Called once per tick
/// from [`Kernel::on_tick`], before schedules are decremented.
pub(crate) fn account_current_task() {
    let tcb = Kernel::current_task();
    let mut m = tcb.monitor.get();
    if m.state == MonitorState::Collect {
        m.current_cycles = m.current_cycles.saturating_add(1);
    }
    tcb.monitor.set(m);
}

/// Task-level epilogue bookkeeping: counts this activation and folds the
/// collected cycles into the running peak/total, mirroring what
/// [`crate::routine::RoutineControlBlock::run`] does per routine.
pub(crate) fn finalize_task(tcb: &'static TaskControlBlock) {
    let mut m = tcb.monitor.get();
    m.run_counter = m.run_counter.wrapping_add(1);
    let cycles = m.current_cycles.unsigned_abs();
    m.total_cycles = m.total_cycles.wrapping_add(cycles as u64);
    if cycles > m.peak_cycles {
        m.peak_cycles = cycles;
    }
    tcb.monitor.set(m);
}

/// Interval-boundary state-machine sweep over every task/routine, run from
/// [`Kernel::on_tick`]. `COLLECT` entities that ran at least once become
/// `READY`; `SENT` entities roll back over to `COLLECT`.
pub(crate) fn sweep_interval() {
    let mut ctl = kernel::monitor_control();
    if ctl.interval == 0 || ctl.countdown == 0 {
        return;
    }
    ctl.countdown -= 1;
    if ctl.countdown != 0 {
        kernel::set_monitor_control(ctl);
        return;
    }

    let mut cur = Kernel::task_list_head();
    while !cur.is_null() {
        // SAFETY: list nodes are `'static` TCBs inserted by `Kernel::init_task`.
        let tcb = unsafe { &*cur };
        sweep_task(tcb);
        cur = tcb.next.get();
    }

    ctl.transmit_request = true;
    ctl.countdown = ctl.interval;
    kernel::set_monitor_control(ctl);
}

fn sweep_task(tcb: &'static TaskControlBlock) {
    let mut m = tcb.monitor.get();
    match m.state {
        MonitorState::Collect if m.run_counter > 0 => m.state = MonitorState::Ready,
        MonitorState::Collect => m.intervals = m.intervals.wrapping_add(1),
        MonitorState::Sent => {
            m.current_cycles = 0;
            m.state = MonitorState::Collect;
        }
        MonitorState::Ready => {}
    }
    tcb.monitor.set(m);

    #[cfg(feature = "use_multi_rout")]
    {
        let mut rcb_ptr = tcb.rout_head.get();
        while !rcb_ptr.is_null() {
            // SAFETY: see `sweep_interval`.
            let rcb = unsafe { &*rcb_ptr };
            sweep_routine(tcb, rcb);
            rcb_ptr = rcb.next.get();
        }
    }
}

/// Mirrors [`sweep_task`] for one routine. A routine still mid-call when the
/// interval boundary hits (`running`) folds in the task's own accumulated
/// cycles before going `READY`, so a long-running routine that spans the
/// boundary isn't reported with zero elapsed time.
#[cfg(feature = "use_multi_rout")]
fn sweep_routine(tcb: &TaskControlBlock, rcb: &RoutineControlBlock) {
    let mut rm = rcb.monitor.get();
    match rm.state {
        MonitorState::Collect if rm.run_counter > 0 => {
            if rm.running {
                rm.current_cycles = rm.current_cycles.wrapping_add(tcb.monitor.get().current_cycles);
            }
            rm.state = MonitorState::Ready;
        }
        MonitorState::Collect => rm.intervals = rm.intervals.wrapping_add(1),
        MonitorState::Sent => {
            rm.current_cycles = 0;
            rm.state = MonitorState::Collect;
        }
        MonitorState::Ready => {}
    }
    rcb.monitor.set(rm);
}

/// Runs the wire serializer if a transmit was requested by the last
/// interval sweep. Called from the idle task's epilogue.
pub(crate) fn transmit_if_requested() {
    let mut ctl = kernel::monitor_control();
    if !ctl.transmit_request {
        return;
    }
    ctl.transmit_request = false;
    kernel::set_monitor_control(ctl);

    let Some(sink) = SINK.0.get() else {
        log::debug!("monitor transmit requested but no sink installed");
        return;
    };
    let config = Kernel::config();
    #[cfg(feature = "enable_tick_sync")]
    let cur_tick_duration = (config.tick_duration as i32 + kernel::sync_state().sync_delta as i32) as u16;
    #[cfg(not(feature = "enable_tick_sync"))]
    let cur_tick_duration = config.tick_duration;

    log::debug!("monitor: transmitting frame (interval={})", ctl.interval);

    sink.write_all(MARKER);
    let header_len = 1 + 1 + 1 + 1 + 2 + 2 + 2 + 2 + 4; // matches the fields written below
    // Sizes of the 'T'/'R' record prefixes `emit_task`/`emit_routine` actually
    // write, not `size_of` the in-memory control blocks: T is
    // total_cycles(8) + peak_cycles(4) + run_counter(4) + stack_size(2) +
    // stack_usage(2); R is total_cycles(8) + peak_cycles(4) + run_counter(4).
    const TCB_RECORD_PREFIX: u8 = 8 + 4 + 4 + 2 + 2;
    const RCB_RECORD_PREFIX: u8 = 8 + 4 + 4;
    let header_head = [MONITOR_VERSION, header_len as u8, TCB_RECORD_PREFIX, RCB_RECORD_PREFIX];
    sink.write_all(&header_head);
    sink.write_all(&config.tick_duration.to_le_bytes());
    sink.write_all(&cur_tick_duration.to_le_bytes());
    sink.write_all(&config.tick_prescaler.to_le_bytes());
    sink.write_all(&(ctl.interval as u16).to_le_bytes());
    sink.write_all(&config.clock_frequency.to_le_bytes());

    let mut cur = Kernel::task_list_head();
    while !cur.is_null() {
        // SAFETY: see `sweep_interval`.
        let tcb = unsafe { &*cur };
        emit_task(sink, tcb);
        cur = tcb.next.get();
    }
    sink.write_all(b"E");
}

fn emit_task(sink: &'static dyn MonitorSink, tcb: &'static TaskControlBlock) {
    let mut m = tcb.monitor.get();
    if m.state != MonitorState::Ready {
        return;
    }
    // SAFETY: `tcb`'s stack was pre-filled with `STACK_SENTINEL` by
    // `init_task_stack` at registration time, before the task ever ran.
    m.stack_usage = unsafe { stack_usage(tcb.stack_base(), m.stack_size as usize) } as u16;

    sink.write_all(b"T");
    sink.write_all(&m.total_cycles.to_le_bytes());
    sink.write_all(&m.peak_cycles.to_le_bytes());
    sink.write_all(&m.run_counter.to_le_bytes());
    sink.write_all(&m.stack_size.to_le_bytes());
    sink.write_all(&m.stack_usage.to_le_bytes());
    sink.write_all(tcb.name().as_bytes());
    sink.write_all(&[0]);

    m.run_counter = 0;
    m.peak_cycles = 0;
    m.total_cycles = 0;
    m.state = MonitorState::Sent;
    tcb.monitor.set(m);

    #[cfg(feature = "use_multi_rout")]
    {
        let mut rcb_ptr = tcb.rout_head.get();
        while !rcb_ptr.is_null() {
            // SAFETY: see `sweep_task`.
            let rcb = unsafe { &*rcb_ptr };
            emit_routine(sink, rcb);
            rcb_ptr = rcb.next.get();
        }
    }
}

#[cfg(feature = "use_multi_rout")]
fn emit_routine(sink: &'static dyn MonitorSink, rcb: &'static RoutineControlBlock) {
    let mut m = rcb.monitor.get();
    if m.state != MonitorState::Ready {
        return;
    }
    sink.write_all(b"R");
    sink.write_all(&m.total_cycles.to_le_bytes());
    sink.write_all(&m.peak_cycles.to_le_bytes());
    sink.write_all(&m.run_counter.to_le_bytes());
    sink.write_all(rcb.name().as_bytes());
    sink.write_all(&[0]);
    m.run_counter = 0;
    m.peak_cycles = 0;
    m.total_cycles = 0;
    m.state = MonitorState::Sent;
    rcb.monitor.set(m);
}

/// Pre-fills a task's user stack region with [`STACK_SENTINEL`] and records
/// its size, so [`stack_usage`] has a baseline to scan against later. Called
/// once from [`Kernel::init_task`](crate::kernel::Kernel::init_task), before
/// the task has run for the first time.
pub(crate) fn init_task_stack(tcb: &'static TaskControlBlock) {
    let user_len = tcb
        .stack_size()
        .saturating_sub(crate::task::STACK_OVERHEAD_BYTES);
    // SAFETY: `tcb`'s stack buffer is `'static`, owned exclusively by this
    // task, and not yet dispatched, so nothing else is reading or writing it.
    unsafe { core::ptr::write_bytes(tcb.stack_base(), STACK_SENTINEL, user_len) };
    let mut m = tcb.monitor.get();
    m.stack_size = user_len as u16;
    tcb.monitor.set(m);
}

/// High-water mark of a task's stack, scanned lazily by walking down from the
/// base until the first non-sentinel byte.
///
/// # Safety
///
/// `stack_base`..`stack_base + stack_size` must be the task's actual stack
/// buffer, pre-filled with [`STACK_SENTINEL`] before the task first ran.
pub unsafe fn stack_usage(stack_base: *const u8, stack_size: usize) -> usize {
    let mut used = 0;
    for i in 0..stack_size {
        if *stack_base.add(i) != STACK_SENTINEL {
            used = stack_size - i;
            break;
        }
    }
    used
}
