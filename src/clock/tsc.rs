use crate::error::Error;

// ---------------------------------------------------------------------------
// x86_64 implementation
// ---------------------------------------------------------------------------

#[cfg(target_arch = "x86_64")]
mod x86 {
    use core::arch::asm;
    use core::sync::atomic::{AtomicU8, Ordering};

    // 0 = unchecked, 1 = absent, 2 = present
    static RDTSCP_SUPPORT: AtomicU8 = AtomicU8::new(0);
    static INVARIANT_TSC: AtomicU8 = AtomicU8::new(0);

    /// Executes CPUID for `leaf` (subleaf 0) and returns (eax, edx).
    fn cpuid(leaf: u32) -> (u32, u32) {
        let eax: u32;
        let edx: u32;
        // SAFETY: CPUID is always available on x86_64.
        unsafe {
            asm!(
                "push rbx", // rbx is reserved by LLVM
                "cpuid",
                "pop rbx",
                inout("eax") leaf => eax,
                inout("ecx") 0u32 => _,
                out("edx") edx,
            );
        }
        (eax, edx)
    }

    fn max_extended_leaf() -> u32 {
        cpuid(0x8000_0000).0
    }

    fn cached(cache: &AtomicU8, probe: impl FnOnce() -> bool) -> bool {
        let state = cache.load(Ordering::Relaxed);
        if state != 0 {
            return state == 2;
        }
        let present = probe();
        cache.store(if present { 2 } else { 1 }, Ordering::Relaxed);
        present
    }

    /// Checks CPUID leaf 0x8000_0001, EDX bit 27 for RDTSCP support.
    pub fn has_rdtscp() -> bool {
        cached(&RDTSCP_SUPPORT, || {
            max_extended_leaf() >= 0x8000_0001 && (cpuid(0x8000_0001).1 >> 27) & 1 == 1
        })
    }

    /// Checks CPUID leaf 0x8000_0007, EDX bit 8 for a constant-rate TSC.
    pub fn invariant_tsc() -> bool {
        cached(&INVARIANT_TSC, || {
            max_extended_leaf() >= 0x8000_0007 && (cpuid(0x8000_0007).1 >> 8) & 1 == 1
        })
    }

    /// LFENCE then RDTSC: earlier instructions complete before the counter
    /// is sampled.
    #[inline(always)]
    pub fn rdtsc_fenced() -> u64 {
        let low: u32;
        let high: u32;
        // SAFETY: RDTSC is unprivileged on Linux and always present on x86_64.
        unsafe {
            asm!(
                "lfence",
                "rdtsc",
                out("eax") low,
                out("edx") high,
                options(nostack, preserves_flags),
            );
        }
        ((high as u64) << 32) | low as u64
    }

    /// Serializing CPUID followed by RDTSCP. Returns the counter and
    /// IA32_TSC_AUX (the processor id on Linux).
    #[inline(always)]
    pub fn rdtscp_serialized() -> (u64, u32) {
        let low: u32;
        let high: u32;
        let aux: u32;
        // SAFETY: callers check has_rdtscp() before selecting this clock.
        unsafe {
            asm!(
                "push rbx",
                "xor eax, eax",
                "cpuid",
                "pop rbx",
                "rdtscp",
                out("eax") low,
                out("edx") high,
                out("ecx") aux,
            );
        }
        (((high as u64) << 32) | low as u64, aux)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fails unless the fenced RDTSC clock can be read on this machine.
pub fn check_rdtsc() -> Result<(), Error> {
    #[cfg(target_arch = "x86_64")]
    {
        Ok(())
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        Err(Error::Unsupported(
            "rdtsc is not available on this architecture".into(),
        ))
    }
}

/// Fails unless RDTSCP can be executed on this machine.
pub fn check_rdtscp() -> Result<(), Error> {
    #[cfg(target_arch = "x86_64")]
    {
        if !x86::has_rdtscp() {
            return Err(Error::Unsupported("RDTSCP not supported on this CPU".into()));
        }
        Ok(())
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        Err(Error::Unsupported(
            "rdtscp is not available on this architecture".into(),
        ))
    }
}

/// Whether the TSC ticks at a constant rate across P-/C-states.
pub fn invariant_tsc() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        x86::invariant_tsc()
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

#[inline(always)]
pub fn read_rdtsc() -> i64 {
    #[cfg(target_arch = "x86_64")]
    {
        x86::rdtsc_fenced() as i64
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        unreachable!("rdtsc clock is rejected at construction on this architecture")
    }
}

#[inline(always)]
pub fn read_rdtscp() -> (i64, u32) {
    #[cfg(target_arch = "x86_64")]
    {
        let (ticks, aux) = x86::rdtscp_serialized();
        (ticks as i64, aux)
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        unreachable!("rdtscp clock is rejected at construction on this architecture")
    }
}
