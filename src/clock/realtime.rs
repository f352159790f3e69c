/// Reads CLOCK_REALTIME as nanoseconds since the epoch.
#[inline(always)]
pub fn now_ns() -> i64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts);
    }
    (ts.tv_sec as i64)
        .wrapping_mul(1_000_000_000)
        .wrapping_add(ts.tv_nsec as i64)
}

/// Resolution of CLOCK_REALTIME in nanoseconds, as reported by clock_getres.
pub fn resolution_ns() -> i64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    unsafe {
        libc::clock_getres(libc::CLOCK_REALTIME, &mut ts);
    }
    (ts.tv_sec as i64) * 1_000_000_000 + ts.tv_nsec as i64
}
