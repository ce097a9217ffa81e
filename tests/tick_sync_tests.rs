//! Proportional tick-sync controller: clamping, sign, and the sync-counter
//! half-period wraparound.

use std::cell::UnsafeCell;

use artx::config::{TickConfig, TickSource};
use artx::kernel::Kernel;
use artx::ports::sim::Sim;
use artx::task::{TaskControlBlock, TaskPriority};
use artx::tick_sync::{get_sync_status, set_max_sync_adjust, tick_sync};
use sequential_test::sequential;

struct Stack<const N: usize>(UnsafeCell<[u8; N]>);
unsafe impl<const N: usize> Sync for Stack<N> {}
impl<const N: usize> Stack<N> {
    const fn new() -> Self {
        Stack(UnsafeCell::new([0xc3; N]))
    }
    fn base(&self) -> *mut u8 {
        self.0.get() as *mut u8
    }
}

static STACK_IDLE: Stack<64> = Stack::new();
static TASK_IDLE: TaskControlBlock =
    unsafe { TaskControlBlock::new("idle", TaskPriority::idle(), 0, STACK_IDLE.base(), 64) };

fn install(tick_duration: u16) {
    Kernel::reset();
    Sim::reset();
    Kernel::init_task(&TASK_IDLE);
    artx::tick::tick_init(TickConfig::new(tick_duration, 64, 16_000_000, TickSource::TimerCompare));
}

#[test]
#[sequential]
fn external_offset_clamps_to_max_adjust_and_flips_sign() {
    install(2000);
    set_max_sync_adjust(20);

    // `sync_ctr` starts at SYNC_TICKS/2 = 50 and ramps down one per tick
    // (in `apply_correction`, not in `tick_sync` itself); drive it down to
    // 10 to match S3: sync_ctr=10, tick_duration=2000.
    for _ in 0..40 {
        Kernel::on_tick();
    }
    Sim::set_counter(500);

    // d = (10*2000 - 500)/100 = 195, clamped to 20, sync_delta = -20.
    tick_sync();
    let status = get_sync_status();
    assert_eq!(status.sync_ctr, 10);
    assert_eq!(status.correction, -20);

    // Next tick programs the hardware compare-top to tick_duration + sync_delta.
    Kernel::on_tick();
    assert_eq!(Sim::compare_top(), 1980);
}

#[test]
#[sequential]
fn correction_never_exceeds_max_sync_adjust() {
    install(2000);
    set_max_sync_adjust(20);

    for timer_val in [0u16, u16::MAX, 1000, 30_000, 500] {
        Sim::set_counter(timer_val);
        tick_sync();
        let status = get_sync_status();
        assert!(status.correction.unsigned_abs() <= 20, "correction {} exceeds bound", status.correction);
    }
}

#[test]
#[sequential]
fn default_max_adjust_is_one_percent_of_tick_duration() {
    install(2000);
    // No explicit `set_max_sync_adjust`: falls back to 1% of tick_duration (20).
    for _ in 0..40 {
        Kernel::on_tick();
    }
    Sim::set_counter(500);
    tick_sync();
    let status = get_sync_status();
    assert_eq!(status.correction, -20);
}

#[test]
#[sequential]
fn sync_counter_wraps_at_negative_half_period() {
    install(2000);
    let start = get_sync_status().sync_ctr;
    // `sync_ctr` ramps once per kernel tick regardless of whether an
    // external `tick_sync` event ever fires.
    for _ in 0..(start + artx::tick_sync::SYNC_TICKS / 2) {
        Kernel::on_tick();
    }
    assert_eq!(get_sync_status().sync_ctr, artx::tick_sync::SYNC_TICKS / 2);
}
