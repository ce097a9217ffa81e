//! Compile-time timing configuration.
//!
//! The target has no filesystem and no environment, so the values that the
//! original tick driver pulled from `config.h` are supplied here as a plain
//! `const` struct the application builds once and passes to [`crate::tick::tick_init`].

/// Source feeding the periodic tick interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    /// 8-bit timer overflow; `tick_duration` is approximate (rounded to the
    /// nearest overflow period).
    TimerOverflow,
    /// 16-bit timer compare-match; `tick_duration` is exact.
    TimerCompare,
    /// External interrupt line; the kernel does not program a top at all.
    External,
}

/// Timer programming and clock parameters for one deployment.
///
/// Mirrors the defaults shipped by the library this kernel's tick math is
/// grounded on: a 2500-cycle tick driven off a 16-bit compare match with a
/// `/64` prescaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickConfig {
    /// Nominal timer counts per tick.
    pub tick_duration: u16,
    /// Timer clock prescaler divisor.
    pub tick_prescaler: u16,
    /// System clock frequency in Hz, used to convert ticks to wall time.
    pub clock_frequency: u32,
    /// Which hardware source drives the tick.
    pub tick_source: TickSource,
}

impl TickConfig {
    pub const fn new(
        tick_duration: u16,
        tick_prescaler: u16,
        clock_frequency: u32,
        tick_source: TickSource,
    ) -> Self {
        TickConfig {
            tick_duration,
            tick_prescaler,
            clock_frequency,
            tick_source,
        }
    }

    /// Length of one tick in microseconds, rounded down.
    pub const fn tick_length_usec(&self) -> u32 {
        let cycles_per_tick = self.tick_duration as u64 * self.tick_prescaler as u64;
        ((cycles_per_tick * 1_000_000) / self.clock_frequency as u64) as u32
    }

    /// Default 1% bound used by [`crate::tick_sync`] when the application
    /// does not override `max_sync_adjust`.
    pub const fn default_max_sync_adjust(&self) -> u16 {
        self.tick_duration / 100
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        TickConfig::new(2500, 64, 16_000_000, TickSource::TimerCompare)
    }
}
