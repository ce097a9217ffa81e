//! Microsecond/second uptime bookkeeping and the signed-safe `delta_time`
//! helper for measuring elapsed time across a seconds rollover.

use std::cell::UnsafeCell;

use artx::kernel::Kernel;
use artx::task::{TaskControlBlock, TaskPriority};
use artx::time::{delta_time, time, us_time, HiresTime};
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

fn install() {
    Kernel::reset();
    Kernel::init_task(&TASK_IDLE);
}

#[test]
#[sequential]
fn us_time_advances_by_exactly_one_tick_length() {
    install();
    let config = Kernel::config();
    let tick_len = config.tick_length_usec();
    assert_eq!(us_time(), 0);
    Kernel::on_tick();
    assert_eq!(us_time(), tick_len);
    Kernel::on_tick();
    assert_eq!(us_time(), tick_len * 2);
}

#[test]
#[sequential]
fn s_time_increments_only_when_microseconds_cross_one_second() {
    install();
    let config = Kernel::config();
    let tick_len = config.tick_length_usec() as u64;
    let ticks_per_second = 1_000_000 / tick_len;

    for _ in 0..ticks_per_second {
        Kernel::on_tick();
    }
    assert_eq!(time(), 1, "s_time must increment exactly once a million microseconds have passed");
}

#[test]
fn delta_time_is_signed_safe_across_a_second_boundary() {
    let t0 = HiresTime { seconds: 5, micros: 999_000 };
    let t1 = HiresTime { seconds: 6, micros: 1_000 };
    assert_eq!(delta_time(t0, t1), HiresTime { seconds: 0, micros: 2_000 });
}

#[test]
fn delta_time_of_identical_points_is_zero() {
    let t = HiresTime { seconds: 3, micros: 42 };
    assert_eq!(delta_time(t, t), HiresTime { seconds: 0, micros: 0 });
}
