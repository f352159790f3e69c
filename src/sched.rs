use std::io;
use std::time::{Duration, Instant};

use clockjumps::Error;

/// Restricts the current process to a single CPU.
pub fn pin_to_cpu(cpu: usize) -> Result<(), Error> {
    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(Error::InvalidArgs(format!("CPU {} out of range", cpu)));
    }
    let ret = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if ret < 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(())
}

/// Switches the current process to SCHED_FIFO at the highest priority.
/// Returns the priority set. Usually needs CAP_SYS_NICE.
pub fn elevate_priority() -> Result<i32, Error> {
    let priority = unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) };
    if priority < 0 {
        return Err(io::Error::last_os_error().into());
    }
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret < 0 {
        return Err(io::Error::last_os_error().into());
    }
    Ok(priority)
}

/// CPU time used by this process plus a wall-clock instant.
#[derive(Debug, Clone, Copy)]
pub struct ResourceUsage {
    user: Duration,
    system: Duration,
    wall: Instant,
}

/// Difference between two [`ResourceUsage`] snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDelta {
    pub user: Duration,
    pub system: Duration,
    pub wall: Duration,
}

fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::from_secs(tv.tv_sec.max(0) as u64) + Duration::from_micros(tv.tv_usec.max(0) as u64)
}

impl ResourceUsage {
    pub fn now() -> Self {
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        unsafe {
            libc::getrusage(libc::RUSAGE_SELF, &mut usage);
        }
        Self {
            user: timeval_to_duration(usage.ru_utime),
            system: timeval_to_duration(usage.ru_stime),
            wall: Instant::now(),
        }
    }

    pub fn elapsed_since(&self, start: &ResourceUsage) -> UsageDelta {
        UsageDelta {
            user: self.user.saturating_sub(start.user),
            system: self.system.saturating_sub(start.system),
            wall: self.wall.saturating_duration_since(start.wall),
        }
    }
}
