//! Microsecond- and second-resolution uptime, accumulated once per tick in
//! [`crate::kernel::Kernel::on_tick`].

/// A point in time, split the way the hardware can represent it without
/// overflowing a 32-bit microsecond counter: whole seconds plus the
/// microsecond remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiresTime {
    pub seconds: u32,
    pub micros: u32,
}

/// Current uptime at microsecond resolution, split into seconds + remainder.
pub fn hires_time() -> HiresTime {
    HiresTime {
        seconds: crate::kernel::s_time(),
        micros: crate::kernel::us_time(),
    }
}

/// Current uptime in whole seconds.
pub fn time() -> u32 {
    crate::kernel::s_time()
}

/// Current uptime's microsecond-of-second component.
pub fn us_time() -> u32 {
    crate::kernel::us_time()
}

/// Signed-safe `t1 - t0`, tolerant of `t1` having wrapped into the next
/// second relative to `t0` and vice versa.
pub fn delta_time(t0: HiresTime, t1: HiresTime) -> HiresTime {
    let t0_total = t0.seconds as i64 * 1_000_000 + t0.micros as i64;
    let t1_total = t1.seconds as i64 * 1_000_000 + t1.micros as i64;
    let delta = (t1_total - t0_total).max(0);
    HiresTime {
        seconds: (delta / 1_000_000) as u32,
        micros: (delta % 1_000_000) as u32,
    }
}
