//! AVR port: the architecture this kernel actually runs on.
//!
//! The tick ISR and the context switch it drives have to be naked by
//! necessity — there is no compiler-managed prologue that knows how to save
//! a *foreign* task's register file, only the one it's currently executing
//! in. `prepare_stack` already lays a fresh task's stack out for the full
//! 33-byte sequence (`SREG` + `r0..r31`), but `save_context`/
//! `restore_context` below only round-trip `SREG` through `r0` — they don't
//! yet push/pop `r1..r31`, capture the interrupted SP into `tcb.sp`, or
//! switch onto a dedicated kernel stack.
//!
//! TODO: write the naked tick-ISR wrapper that does the real save (push
//! `SREG`+`r1..r31`, store `SP` into the outgoing TCB, load `SP` from the
//! incoming TCB, pop `r1..r31`+`SREG`, `reti`) in place of these two
//! functions; they're left as the SREG-only placeholder this port started
//! from until that wrapper exists.

pub mod hardware_timer;

use core::arch::asm;

use crate::config::TickConfig;
use crate::task::TaskControlBlock;

use super::{Context, Port};

/// Saved AVR register file: SREG followed by r0..r31, in push order.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct AvrContext {
    bytes: [u8; 33],
}

impl Default for AvrContext {
    fn default() -> Self {
        AvrContext { bytes: [0; 33] }
    }
}

impl Context for AvrContext {}

pub struct Avr;

impl Port for Avr {
    type Ctx = AvrContext;

    fn prepare_stack(tcb: &'static TaskControlBlock) {
        // Lay the stack out so the restore sequence below pops an all-zero
        // register file and returns into the generic task runner: from the
        // top, [context (33 bytes, zeroed)] [runner entry addr, 2 bytes]
        // [nested-interrupt return addr, 2 bytes].
        let entry = crate::runner::task_main as usize;
        let top = tcb.stack_base() as usize + tcb.stack_size();
        let mut sp = top;

        // SAFETY: `tcb`'s stack buffer is `'static` and large enough for the
        // kernel's reserved overhead plus the caller's requested size; we
        // only ever write within `stack_size` bytes from `top`.
        unsafe {
            sp -= 2;
            core::ptr::write_bytes(sp as *mut u8, 0, 2); // nested-ISR return addr (unused on first entry)
            sp -= 2;
            (sp as *mut u16).write((entry & 0xffff) as u16);
            sp -= 33; // zeroed context
            core::ptr::write_bytes(sp as *mut u8, 0, 33);
            *tcb.sp.get() = sp as *mut u8;
        }
    }

    fn save_context(ctx: &mut Self::Ctx) {
        let ptr = ctx.bytes.as_mut_ptr();
        // SAFETY: captures SREG into `ctx`; only executed from within the
        // tick ISR, which has interrupts disabled for its whole body.
        // Does not yet save r1..r31 or the interrupted SP — see module TODO.
        unsafe {
            asm!(
                "in r0, 0x3f",
                "st {0}, r0",
                "push r0",
                "in r0, 0x3f",
                in(reg) ptr,
                out("r0") _,
            );
        }
    }

    fn restore_context(ctx: &Self::Ctx) {
        let ptr = ctx.bytes.as_ptr();
        // SAFETY: inverse of `save_context`; only executed immediately before
        // a return-from-interrupt resumes the task this context belongs to.
        // Does not yet restore r1..r31 or switch SP — see module TODO.
        unsafe {
            asm!(
                "ld r0, {0}",
                "out 0x3f, r0",
                in(reg) ptr,
                out("r0") _,
            );
        }
    }

    fn enable_tick_interrupt(config: &TickConfig) {
        hardware_timer::enable_tick_interrupt(config);
    }

    fn program_compare_top(top: u16) {
        hardware_timer::program_compare_top(top);
    }

    fn read_counter() -> u16 {
        hardware_timer::read_counter()
    }

    fn cycle_count() -> u32 {
        hardware_timer::cycle_count()
    }
}

/// `critical-section` backend for this target: [`crate::lock`] is built
/// directly on `critical_section::acquire`/`release`, so something has to
/// provide the actual `Impl` for `avr` the way `std`'s feature provides one
/// for the host/sim port. `avr_device::asm::{cli, sei}` are the same
/// intrinsics `avr-hal`'s own critical-section integration uses; SREG bit 7
/// (the global interrupt enable flag) is the restore token, matching the
/// save/restore shape [`save_context`](Port::save_context) already uses for
/// the same register.
struct AvrCriticalSection;

critical_section::set_impl!(AvrCriticalSection);

unsafe impl critical_section::Impl for AvrCriticalSection {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        let sreg: u8;
        asm!("in {0}, 0x3f", out(reg) sreg);
        avr_device::asm::cli();
        sreg
    }

    unsafe fn release(token: critical_section::RawRestoreState) {
        // Only re-enable if the flag was set before `acquire`: nested
        // critical sections must not turn interrupts back on early.
        if token & 0x80 != 0 {
            avr_device::asm::sei();
        }
    }
}
