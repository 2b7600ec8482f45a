// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bnxt_defs::hwrm::HwrmOpcode;

/// An error returned by the bnxt driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A DMA buffer could not be allocated.
    #[error("failed to allocate {what}")]
    OutOfMemory {
        /// The structure the buffer was meant to back.
        what: &'static str,
        /// The allocator's error.
        #[source]
        source: anyhow::Error,
    },
    /// Firmware did not post a valid response in time.
    #[error("hwrm command {opcode} (seq {seq_id}) timed out")]
    Timeout {
        /// The command that timed out.
        opcode: HwrmOpcode,
        /// The command's sequence number.
        seq_id: u16,
    },
    /// Firmware rejected a command.
    #[error("hwrm command {opcode} failed with status {status:#x}")]
    Firmware {
        /// The rejected command.
        opcode: HwrmOpcode,
        /// The status firmware reported.
        status: u16,
    },
    /// Firmware posted a response that does not match the request.
    #[error("bad response to hwrm command {opcode}: {reason}")]
    BadResponse {
        /// The command whose response was malformed.
        opcode: HwrmOpcode,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// The operation is not valid in the device's current state.
    #[error("invalid device state: {0}")]
    InvalidState(&'static str),
    /// The command channel's DMA buffer has been released.
    #[error("hwrm channel closed")]
    ChannelClosed,
    /// The requested MTU is outside the supported range.
    #[error("mtu {0} out of range")]
    InvalidMtu(u32),
    /// The driver configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A BAR could not be mapped.
    #[error("failed to map bar {bar}")]
    Bar {
        /// The BAR index.
        bar: u8,
        /// The host's error.
        #[source]
        source: anyhow::Error,
    },
    /// An interrupt vector could not be registered.
    #[error("failed to register interrupt")]
    Interrupt(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn oom(what: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| Error::OutOfMemory { what, source }
    }
}
