//! Priority ordering, selection policy, dispatch sequencing, overrun
//! handling, and priority-inversion avoidance under the list-walk scheduler.

use std::cell::UnsafeCell;
use std::sync::Mutex;

use artx::kernel::Kernel;
use artx::task::{priority, TaskPriority};
use artx::TaskControlBlock;
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
static STACK_B: Stack<64> = Stack::new();
static STACK_IDLE: Stack<64> = Stack::new();

static TASK_A: TaskControlBlock =
    unsafe { TaskControlBlock::new("A", TaskPriority::user(20), 4, STACK_A.base(), 64) };
static TASK_B: TaskControlBlock =
    unsafe { TaskControlBlock::new("B", TaskPriority::user(30), 10, STACK_B.base(), 64) };
static TASK_IDLE: TaskControlBlock =
    unsafe { TaskControlBlock::new("idle", TaskPriority::idle(), 0, STACK_IDLE.base(), 64) };

fn install() {
    Kernel::reset();
    Kernel::init_task(&TASK_A);
    Kernel::init_task(&TASK_B);
    Kernel::init_task(&TASK_IDLE);
}

#[test]
#[sequential]
fn task_list_is_priority_sorted() {
    install();
    let mut priorities = Vec::new();
    Kernel::for_each_task(|tcb| priorities.push(tcb.priority().get()));
    assert_eq!(priorities, vec![20, 30, priority::IDLE]);
}

#[test]
#[sequential]
fn idle_fills_every_gap_between_activations() {
    install();
    // A's interval is 4: between activations, three ticks should dispatch idle.
    assert_eq!(Kernel::dispatch_once().name(), "A");
    for _ in 0..3 {
        assert_eq!(Kernel::select_next().name(), "idle");
        Kernel::on_tick();
    }
    assert_eq!(Kernel::select_next().name(), "A");
}

#[test]
#[sequential]
fn higher_priority_wins_when_both_runnable() {
    install();
    // Drive both tasks to the edge of runnable on the same tick.
    Kernel::dispatch_once(); // A
    for _ in 0..9 {
        Kernel::on_tick();
    }
    // After 9 more ticks, B (interval 10) is about to run; A (interval 4)
    // has already wrapped through twice and is runnable again too.
    assert_eq!(Kernel::select_next().name(), "A");
}

#[test]
#[sequential]
fn overrun_keeps_task_immediately_runnable() {
    install();
    Kernel::dispatch_once(); // A: schedule -> interval (4)
    for _ in 0..9 {
        Kernel::on_tick(); // far past due: schedule goes to 4 - 9 = -5
    }
    assert!(TASK_A.schedule_ticks() <= 0);
    let before = TASK_A.schedule_ticks();
    Kernel::dispatch_once(); // epilogue adds interval back in
    assert_eq!(TASK_A.schedule_ticks(), before + 4);
    assert!(TASK_A.schedule_ticks() <= 0, "still immediately runnable after a bad overrun");
}

static SERIAL_GUARD: Mutex<()> = Mutex::new(());

#[test]
#[sequential]
fn priority_inversion_is_avoided() {
    let _g = SERIAL_GUARD.lock().unwrap();
    install();
    // While A is the only runnable task, a tick that does not make B
    // runnable must not disturb the selection.
    Kernel::dispatch_once();
    Kernel::on_tick();
    assert_eq!(Kernel::select_next().name(), "idle");
    assert!(TASK_B.schedule_ticks() > 0);
}
