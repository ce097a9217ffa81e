//! Disables and re-enables the tick interrupt around code that touches
//! kernel state shared with the tick ISR.
//!
//! Built on [`critical_section`]. The AVR port provides the
//! `critical-section` implementation via `cli`/`sei` on `SREG`; the
//! host/sim port (used by every test) gets one for free from
//! `critical-section`'s `std` feature.

use core::cell::Cell;

#[cfg(feature = "allow_nested_locks")]
use core::sync::atomic::{AtomicU8, Ordering};

struct TokenCell(Cell<Option<critical_section::RestoreState>>);
// SAFETY: single hardware thread; the only other writer is the tick ISR,
// which never calls `lock`/`unlock` itself.
unsafe impl Sync for TokenCell {}

static TOKEN: TokenCell = TokenCell(Cell::new(None));

#[cfg(feature = "allow_nested_locks")]
static NEST: AtomicU8 = AtomicU8::new(0);

/// Disables the tick interrupt. With `allow_nested_locks`, nested calls only
/// increment a counter; the interrupt is re-enabled on the matching
/// 1-to-0 `unlock`. Without it, every `lock`/`unlock` pair is unconditional
/// and nesting is undefined, matching the plain disable/enable primitive.
pub fn lock() {
    #[cfg(feature = "allow_nested_locks")]
    if NEST.fetch_add(1, Ordering::Relaxed) != 0 {
        return;
    }
    TOKEN.0.set(Some(critical_section::acquire()));
}

/// Re-enables the tick interrupt. Unbalanced calls (more `unlock`s than
/// `lock`s) are undefined, as with the primitive this wraps.
pub fn unlock() {
    #[cfg(feature = "allow_nested_locks")]
    {
        let prev = NEST.fetch_sub(1, Ordering::Relaxed);
        if prev == 0 {
            log::error!("unlock() called without a matching lock()");
        }
        if prev != 1 {
            return;
        }
    }
    if let Some(token) = TOKEN.0.take() {
        // SAFETY: paired one-to-one with the `acquire` in `lock`.
        unsafe { critical_section::release(token) };
    } else {
        log::error!("unlock() called without a matching lock()");
    }
}
