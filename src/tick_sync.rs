//! Proportional-only tick synchronization against an external reference.
//!
//! An external reference clock (often a GPS PPS line or a peer node) fires
//! [`tick_sync`] roughly every [`SYNC_TICKS`] kernel ticks. The controller
//! compares where the kernel's sync counter expected to be against the
//! hardware counter's actual value and nudges the next tick's compare-top by
//! a bounded correction, converging on a residual bounded by one
//! quantization unit of the timer.
//!
//! This is deliberately the proportional-only controller: the original
//! library this is grounded on also carries a disabled averaging-buffer
//! variant (`#if 0`) that this crate does not implement — see `DESIGN.md`.

use crate::kernel::{self, Kernel};
use crate::ports::{Port, SelectedPort};

/// Ticks between expected external sync events. The sync counter ranges over
/// `[-SYNC_TICKS/2, SYNC_TICKS/2)`.
pub const SYNC_TICKS: i32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct SyncState {
    pub(crate) sync_ctr: i32,
    pub(crate) sync_delta: i16,
    pub(crate) max_sync_adjust: i16,
}

impl SyncState {
    pub const fn new() -> Self {
        SyncState {
            sync_ctr: SYNC_TICKS / 2,
            sync_delta: 0,
            max_sync_adjust: 0,
        }
    }
}

/// Snapshot returned by [`get_sync_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatus {
    pub sync_ctr: i32,
    pub timer_val: u16,
    pub correction: i16,
}

/// Overrides the default 1%-of-`tick_duration` correction bound.
pub fn set_max_sync_adjust(max_sync_adjust: i16) {
    let mut state = kernel::sync_state();
    state.max_sync_adjust = max_sync_adjust;
    kernel::set_sync_state(state);
}

/// Feeds one external reference event into the controller.
///
/// Reads the kernel's own sync counter and the current hardware counter
/// value itself (ordinarily called from a reference-clock interrupt
/// handler) and stores the resulting correction for [`apply_correction`] to
/// apply on the next kernel tick. Calls to this routine have to be locked.
pub fn tick_sync() {
    let config = Kernel::config();
    let mut state = kernel::sync_state();
    let max_adjust = if state.max_sync_adjust == 0 {
        config.default_max_sync_adjust() as i16
    } else {
        state.max_sync_adjust
    };

    let sync_ctr = state.sync_ctr;
    let timer_val = SelectedPort::read_counter();
    let d = (sync_ctr * config.tick_duration as i32 - timer_val as i32) / SYNC_TICKS;
    let d = d.clamp(-(max_adjust as i32), max_adjust as i32) as i16;
    state.sync_delta = -d;
    kernel::set_sync_state(state);
}

/// Current sync state for diagnostics, mirroring `ARTX_get_sync_status`.
pub fn get_sync_status() -> SyncStatus {
    let state = kernel::sync_state();
    SyncStatus {
        sync_ctr: state.sync_ctr,
        timer_val: SelectedPort::read_counter(),
        correction: state.sync_delta,
    }
}

/// Applies the last computed `sync_delta` to the hardware compare-top and
/// advances the sync counter. Runs once per kernel tick from
/// [`Kernel::on_tick`], regardless of whether [`tick_sync`] fired this tick:
/// `sync_ctr` ramps every tick so it tracks kernel time, wrapping back to
/// `+SYNC_TICKS/2` once it reaches `-SYNC_TICKS/2`.
pub(crate) fn apply_correction() {
    let config = Kernel::config();
    let mut state = kernel::sync_state();
    let top = (config.tick_duration as i32 + state.sync_delta as i32) as u16;
    SelectedPort::program_compare_top(top);

    state.sync_ctr -= 1;
    if state.sync_ctr <= -(SYNC_TICKS / 2) {
        state.sync_ctr = SYNC_TICKS / 2;
    }
    kernel::set_sync_state(state);
}
