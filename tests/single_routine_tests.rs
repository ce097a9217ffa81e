//! Single-routine mode (`use_multi_rout` disabled): a task holds one direct
//! function pointer instead of a routine list, and `task_push_rout`
//! overwrites rather than appends.

#![cfg(not(feature = "use_multi_rout"))]

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use artx::kernel::Kernel;
use artx::task::{TaskControlBlock, TaskPriority};
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

static STACK_A: Stack<64> = Stack::new();
static STACK_IDLE: Stack<64> = Stack::new();

static TASK_A: TaskControlBlock =
    unsafe { TaskControlBlock::new("A", TaskPriority::user(20), 1, STACK_A.base(), 64) };
static TASK_IDLE: TaskControlBlock =
    unsafe { TaskControlBlock::new("idle", TaskPriority::idle(), 0, STACK_IDLE.base(), 64) };

static CALLS: AtomicU32 = AtomicU32::new(0);
fn first_rout() {
    CALLS.fetch_add(1, Ordering::Relaxed);
}
fn second_rout() {
    CALLS.fetch_add(100, Ordering::Relaxed);
}

fn install() {
    Kernel::reset();
    CALLS.store(0, Ordering::Relaxed);
    Kernel::init_task(&TASK_A);
    Kernel::init_task(&TASK_IDLE);
}

#[test]
#[sequential]
fn pushed_routine_runs_on_dispatch() {
    install();
    TASK_A.push_rout(first_rout);
    Kernel::dispatch_once();
    assert_eq!(CALLS.load(Ordering::Relaxed), 1);
}

#[test]
#[sequential]
fn second_push_overwrites_the_first() {
    install();
    TASK_A.push_rout(first_rout);
    TASK_A.push_rout(second_rout);
    Kernel::dispatch_once();
    assert_eq!(CALLS.load(Ordering::Relaxed), 100, "push_rout must overwrite, not append");
}

#[test]
#[sequential]
fn no_routine_pushed_is_a_no_op() {
    install();
    Kernel::dispatch_once();
    assert_eq!(CALLS.load(Ordering::Relaxed), 0);
}
