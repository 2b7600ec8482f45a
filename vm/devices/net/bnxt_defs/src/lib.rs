// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hardware definitions for Broadcom NetXtreme-C/E (bnxt) network adapters:
//! doorbells, completion entries, hardware statistics and receive-mask bits.
//! The firmware command (HWRM) wire format lives in [`hwrm`].

#![forbid(unsafe_code)]

pub mod hwrm;

use bitfield_struct::bitfield;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::byteorder::little_endian::U64;

pub const PAGE_SIZE: usize = 4096;
pub const PAGE_SIZE64: u64 = 4096;

/// BAR holding the HWRM command window and trigger register.
pub const HWRM_BAR: u8 = 0;
/// BAR holding the per-ring doorbells.
pub const DOORBELL_BAR: u8 = 2;

/// Distance between two consecutive ring doorbells in the doorbell BAR.
pub const DOORBELL_STRIDE: u32 = 0x80;

/// Firmware handle value for a ring, group or context that is not allocated.
pub const INVALID_HW_RING_ID: u16 = 0xffff;
/// Firmware handle value for a 64-bit L2 filter that is not allocated.
pub const INVALID_L2_FILTER_ID: u64 = u64::MAX;
/// Rewound raw consumer index; the next entry consumed is entry zero.
pub const RAW_CONS_REWOUND: u32 = u32::MAX;

/// Size in bytes of every descriptor and completion entry.
pub const DESCRIPTOR_SIZE: usize = 16;

/// Capacity of the multicast list pushed with the default VNIC's rx mask.
pub const MAX_MC_ADDRS: usize = 16;
pub const ETHER_ADDR_LEN: usize = 6;

pub const ETHER_HDR_LEN: u32 = 14;
pub const ETHER_CRC_LEN: u32 = 4;
pub const MIN_MTU: u32 = 60;
pub const MAX_MTU: u32 = 9500;

pub const DOORBELL_KEY_TX: u32 = 0;
pub const DOORBELL_KEY_RX: u32 = 1 << 28;

/// Completion ring doorbell word.
#[bitfield(u32)]
pub struct CompletionDoorbell {
    #[bits(24)]
    pub index: u32,
    #[bits(2)]
    _reserved: u8,
    pub idx_valid: bool,
    pub mask: bool,
    #[bits(4)]
    pub key: u8,
}

pub const CMPL_DOORBELL_KEY_CMPL: u8 = 2;

impl CompletionDoorbell {
    /// The doorbell value that re-enables interrupts for a ring whose raw
    /// consumer is `raw_cons`.
    pub fn arm(raw_cons: u32, ring_mask: u32) -> Self {
        let db = Self::new().with_key(CMPL_DOORBELL_KEY_CMPL);
        if raw_cons == RAW_CONS_REWOUND {
            db
        } else {
            db.with_idx_valid(true).with_index(raw_cons & ring_mask)
        }
    }

    /// The doorbell value that masks the ring's interrupt.
    pub fn disable(raw_cons: u32, ring_mask: u32) -> Self {
        Self::arm(raw_cons, ring_mask).with_mask(true)
    }
}

/// Producer doorbell for transmit, receive and aggregation rings.
#[bitfield(u32)]
pub struct ProducerDoorbell {
    #[bits(24)]
    pub index: u32,
    #[bits(4)]
    _reserved: u8,
    #[bits(4)]
    pub key: u8,
}

const PRODUCER_INDEX_MASK: u32 = 0xff_ffff;

impl ProducerDoorbell {
    pub fn tx(prod: u32) -> Self {
        Self::from(DOORBELL_KEY_TX).with_index(prod & PRODUCER_INDEX_MASK)
    }

    pub fn rx(prod: u32) -> Self {
        Self::from(DOORBELL_KEY_RX).with_index(prod & PRODUCER_INDEX_MASK)
    }
}

pub const CMPL_BASE_TYPE_MASK: u16 = 0x3f;
pub const CMPL_BASE_TYPE_TX_L2: u16 = 0x00;
pub const CMPL_BASE_TYPE_RX_L2: u16 = 0x11;
pub const CMPL_BASE_TYPE_HWRM_ASYNC_EVENT: u16 = 0x2e;

pub const ASYNC_EVENT_ID_LINK_STATUS_CHANGE: u16 = 0x0;
pub const ASYNC_EVENT_ID_LINK_SPEED_CHANGE: u16 = 0x2;

/// Generic 16-byte completion ring entry.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes, PartialEq, Eq)]
pub struct CmplBase {
    pub cmpl_type: U16,
    pub info1: U16,
    pub info2: U32,
    pub info3_v: U32,
    pub info4: U32,
}

const _: () = assert!(size_of::<CmplBase>() == DESCRIPTOR_SIZE);

impl CmplBase {
    pub fn kind(&self) -> u16 {
        self.cmpl_type.get() & CMPL_BASE_TYPE_MASK
    }

    pub fn valid(&self) -> bool {
        self.info3_v.get() & 1 != 0
    }

    /// Returns true if this entry is an asynchronous link status change
    /// notification from firmware.
    pub fn is_link_change(&self) -> bool {
        self.kind() == CMPL_BASE_TYPE_HWRM_ASYNC_EVENT
            && self.info1.get() == ASYNC_EVENT_ID_LINK_STATUS_CHANGE
    }
}

/// Per-context hardware statistics block, written by the device via DMA.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CtxHwStats {
    pub rx_ucast_pkts: U64,
    pub rx_mcast_pkts: U64,
    pub rx_bcast_pkts: U64,
    pub rx_discard_pkts: U64,
    pub rx_drop_pkts: U64,
    pub rx_ucast_bytes: U64,
    pub rx_mcast_bytes: U64,
    pub rx_bcast_bytes: U64,
    pub tx_ucast_pkts: U64,
    pub tx_mcast_pkts: U64,
    pub tx_bcast_pkts: U64,
    pub tx_discard_pkts: U64,
    pub tx_drop_pkts: U64,
    pub tx_ucast_bytes: U64,
    pub tx_mcast_bytes: U64,
    pub tx_bcast_bytes: U64,
    pub tpa_pkts: U64,
    pub tpa_bytes: U64,
    pub tpa_events: U64,
    pub tpa_aborts: U64,
}

const _: () = assert!(size_of::<CtxHwStats>() == 160);

/// Receive mask bits for `CFA_L2_SET_RX_MASK`.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct RxMask {
    _reserved0: bool,
    pub mcast: bool,
    pub all_mcast: bool,
    pub bcast: bool,
    pub promiscuous: bool,
    pub outermost: bool,
    #[bits(26)]
    _reserved1: u32,
}

pub const RX_MASK_MCAST: u32 = 0x2;
pub const RX_MASK_ALL_MCAST: u32 = 0x4;
pub const RX_MASK_BCAST: u32 = 0x8;
pub const RX_MASK_PROMISCUOUS: u32 = 0x10;
