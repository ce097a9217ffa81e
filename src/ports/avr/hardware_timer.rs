//! 16-bit timer/counter programming for the compare-match tick source.
//!
//! Register addresses below are the classic ATmega Timer/Counter1 layout
//! (`TCCR1B`, `TCNT1`, `OCR1A`, `TIMSK1`); other AVR parts with a 16-bit
//! timer expose the same shape at different addresses, which an application
//! targeting them overrides via its own `memory_map` feature — out of scope
//! here, where we hardcode the ATmega328-class addresses.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{TickConfig, TickSource};

const TCCR1B: *mut u8 = 0x81 as *mut u8;
const TCNT1: *mut u16 = 0x84 as *mut u16;
const OCR1A: *mut u16 = 0x88 as *mut u16;
const TIMSK1: *mut u8 = 0x6f as *mut u8;

static CYCLES: AtomicU32 = AtomicU32::new(0);

pub(crate) fn enable_tick_interrupt(config: &TickConfig) {
    let prescaler_bits: u8 = match config.tick_prescaler {
        1 => 0b001,
        8 => 0b010,
        64 => 0b011,
        256 => 0b100,
        1024 => 0b101,
        _ => 0b011,
    };
    // SAFETY: these addresses are memory-mapped I/O registers on the target
    // part; writes here only ever run once, at startup, before the tick
    // interrupt is unmasked.
    unsafe {
        match config.tick_source {
            TickSource::TimerCompare => {
                OCR1A.write_volatile(config.tick_duration);
                TCCR1B.write_volatile(0b0000_1000 | prescaler_bits); // CTC mode
                TIMSK1.write_volatile(0b0000_0010); // OCIE1A
            }
            TickSource::TimerOverflow => {
                TCCR1B.write_volatile(prescaler_bits);
                TIMSK1.write_volatile(0b0000_0001); // TOIE1
            }
            TickSource::External => {
                // External interrupt line is configured by the application;
                // the timer itself stays free-running for `read_counter`.
                TCCR1B.write_volatile(prescaler_bits);
            }
        }
    }
}

pub(crate) fn program_compare_top(top: u16) {
    // SAFETY: same register as above, written only from the tick path with
    // the tick interrupt's own priority already serializing access.
    unsafe { OCR1A.write_volatile(top) };
}

pub(crate) fn read_counter() -> u16 {
    // SAFETY: read-only access to a free-running hardware counter.
    unsafe { TCNT1.read_volatile() }
}

pub(crate) fn cycle_count() -> u32 {
    CYCLES.fetch_add(1, Ordering::Relaxed)
}
