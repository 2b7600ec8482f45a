// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// UNSAFETY: Running raw assembly/intrinsic.
#![allow(unsafe_code)]

/// Emit a store fence so descriptor and request writes reach memory before
/// the doorbell or trigger write that hands them to the device.
pub(crate) fn store_fence() {
    #[cfg(target_arch = "x86_64")]
    {
        // SAFETY: this instruction has no safety requirements.
        unsafe { std::arch::x86_64::_mm_sfence() };
    }
    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: this instruction has no safety requirements.
        unsafe { std::arch::asm!("dsb st", options(nostack)) };
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst);
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::Release);
}
