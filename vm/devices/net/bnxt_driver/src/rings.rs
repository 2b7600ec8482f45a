// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Descriptor rings, ring groups and VNICs.
//!
//! These types only track memory and firmware handles. Handles are bound
//! during bring-up and reset to their sentinels on every reset, while the
//! backing memory lives until the queue sets are freed.

use crate::backing::DeviceRegisterIo;
use crate::memory::MemoryBlock;
use bnxt_defs::CmplBase;
use bnxt_defs::CompletionDoorbell;
use bnxt_defs::DESCRIPTOR_SIZE;
use bnxt_defs::DOORBELL_STRIDE;
use bnxt_defs::INVALID_HW_RING_ID;
use bnxt_defs::INVALID_L2_FILTER_ID;
use bnxt_defs::ProducerDoorbell;
use bnxt_defs::RAW_CONS_REWOUND;
use bnxt_defs::hwrm::HWRM_NA_SIGNATURE;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

/// A fixed-size circular descriptor buffer.
#[derive(Debug)]
pub struct Ring {
    id: u16,
    phys_id: u16,
    doorbell: u32,
    capacity: u32,
    mask: u32,
    mem: MemoryBlock,
}

impl Ring {
    pub(crate) fn new(id: u16, capacity: u32, mem: MemoryBlock) -> Self {
        assert!(capacity.is_power_of_two());
        assert!(mem.len() >= capacity as usize * DESCRIPTOR_SIZE);
        Self {
            id,
            phys_id: INVALID_HW_RING_ID,
            doorbell: u32::from(id) * DOORBELL_STRIDE,
            capacity,
            mask: capacity - 1,
            mem,
        }
    }

    /// The driver-assigned ring id.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// The firmware handle, or `INVALID_HW_RING_ID` if not allocated.
    pub fn phys_id(&self) -> u16 {
        self.phys_id
    }

    /// Returns true if firmware has allocated this ring.
    pub fn is_bound(&self) -> bool {
        self.phys_id != INVALID_HW_RING_ID
    }

    /// Offset of this ring's doorbell in the doorbell BAR.
    pub fn doorbell_offset(&self) -> u32 {
        self.doorbell
    }

    /// Number of descriptors.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// `capacity - 1`.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// The device-visible address of the descriptors.
    pub fn phys_addr(&self) -> u64 {
        self.mem.phys_addr()
    }

    #[cfg(test)]
    pub(crate) fn mem(&self) -> &MemoryBlock {
        &self.mem
    }

    pub(crate) fn bind(&mut self, phys_id: u16) {
        self.phys_id = phys_id;
    }

    pub(crate) fn clear(&mut self) {
        self.phys_id = INVALID_HW_RING_ID;
    }

    fn ring_doorbell<R: DeviceRegisterIo>(&self, db: &R, value: u32) {
        tracing::trace!(id = self.id, offset = self.doorbell, value, "doorbell");
        db.write_u32(self.doorbell as usize, value);
    }
}

/// A completion ring and its statistics context.
#[derive(Debug)]
pub struct CompletionRing {
    ring: Ring,
    raw_cons: AtomicU32,
    stats_ctx_id: u32,
}

impl CompletionRing {
    pub(crate) fn new(ring: Ring) -> Self {
        Self {
            ring,
            raw_cons: AtomicU32::new(RAW_CONS_REWOUND),
            stats_ctx_id: HWRM_NA_SIGNATURE,
        }
    }

    /// The underlying ring.
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub(crate) fn ring_mut(&mut self) -> &mut Ring {
        &mut self.ring
    }

    /// The raw consumer counter: the number of entries consumed minus one,
    /// modulo 2^32. `u32::MAX` until the first entry is consumed.
    pub fn raw_cons(&self) -> u32 {
        self.raw_cons.load(Ordering::Acquire)
    }

    /// The statistics context handle, or `HWRM_NA_SIGNATURE`.
    pub fn stats_ctx_id(&self) -> u32 {
        self.stats_ctx_id
    }

    /// The statistics context handle as carried by ring groups.
    pub(crate) fn stats_ctx_handle(&self) -> u16 {
        u16::try_from(self.stats_ctx_id).unwrap_or(INVALID_HW_RING_ID)
    }

    pub(crate) fn set_stats_ctx_id(&mut self, id: u32) {
        self.stats_ctx_id = id;
    }

    /// Restarts the ring from its first slot. Entries left over from an
    /// earlier binding are invalidated so they cannot be taken as new.
    pub(crate) fn rewind(&self) {
        self.ring.mem.zero();
        self.raw_cons.store(RAW_CONS_REWOUND, Ordering::Release);
    }

    pub(crate) fn clear(&mut self) {
        self.ring.clear();
        self.stats_ctx_id = HWRM_NA_SIGNATURE;
    }

    /// Consumes the next entry if firmware has posted it.
    ///
    /// The valid bit firmware writes flips every time the ring wraps, so an
    /// entry is new when its valid bit matches the parity of the pass.
    pub(crate) fn pop(&self) -> Option<CmplBase> {
        let next = self.raw_cons().wrapping_add(1);
        let slot = (next & self.ring.mask) as usize;
        let entry: CmplBase = self.ring.mem.read_obj(slot * DESCRIPTOR_SIZE);
        let expected = (next / self.ring.capacity) & 1 == 0;
        if entry.valid() != expected {
            return None;
        }
        std::sync::atomic::fence(Ordering::Acquire);
        self.raw_cons.store(next, Ordering::Release);
        Some(entry)
    }

    /// Re-enables the ring's interrupt, acknowledging everything consumed.
    pub(crate) fn arm<R: DeviceRegisterIo>(&self, db: &R) {
        let value = CompletionDoorbell::arm(self.raw_cons(), self.ring.mask);
        self.ring.ring_doorbell(db, value.into());
    }

    /// Masks the ring's interrupt.
    pub(crate) fn disable<R: DeviceRegisterIo>(&self, db: &R) {
        let value = CompletionDoorbell::disable(self.raw_cons(), self.ring.mask);
        self.ring.ring_doorbell(db, value.into());
    }
}

/// What a producer ring's doorbell key is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProducerKind {
    /// Transmit ring.
    Tx,
    /// Receive ring.
    Rx,
    /// Receive aggregation ring.
    Aggregation,
}

/// A transmit, receive or aggregation ring.
#[derive(Debug)]
pub struct ProducerRing {
    ring: Ring,
    kind: ProducerKind,
    prod: AtomicU32,
}

impl ProducerRing {
    pub(crate) fn new(ring: Ring, kind: ProducerKind) -> Self {
        Self {
            ring,
            kind,
            prod: AtomicU32::new(0),
        }
    }

    /// The underlying ring.
    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub(crate) fn ring_mut(&mut self) -> &mut Ring {
        &mut self.ring
    }

    /// The ring's class.
    pub fn kind(&self) -> ProducerKind {
        self.kind
    }

    /// The producer index last published to the device.
    pub fn prod(&self) -> u32 {
        self.prod.load(Ordering::Relaxed)
    }

    pub(crate) fn clear(&mut self) {
        self.ring.clear();
        *self.prod.get_mut() = 0;
    }

    /// Publishes `prod` to the device. Descriptors up to `prod` must already
    /// be written.
    pub(crate) fn ring_doorbell<R: DeviceRegisterIo>(&self, db: &R, prod: u32) {
        let prod = prod & self.ring.mask;
        self.prod.store(prod, Ordering::Relaxed);
        let value = match self.kind {
            ProducerKind::Tx => ProducerDoorbell::tx(prod),
            ProducerKind::Rx | ProducerKind::Aggregation => ProducerDoorbell::rx(prod),
        };
        crate::store_fence::store_fence();
        self.ring.ring_doorbell(db, value.into());
    }
}

/// The firmware object tying a receive ring, its aggregation ring, its
/// completion ring and its statistics context together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingGroup {
    /// The group's firmware handle.
    pub grp_id: u16,
    /// Receive ring handle.
    pub rx_ring_id: u16,
    /// Aggregation ring handle.
    pub ag_ring_id: u16,
    /// Completion ring handle.
    pub cp_ring_id: u16,
    /// Statistics context handle.
    pub stats_ctx: u16,
}

impl Default for RingGroup {
    fn default() -> Self {
        Self {
            grp_id: INVALID_HW_RING_ID,
            rx_ring_id: INVALID_HW_RING_ID,
            ag_ring_id: INVALID_HW_RING_ID,
            cp_ring_id: INVALID_HW_RING_ID,
            stats_ctx: INVALID_HW_RING_ID,
        }
    }
}

impl RingGroup {
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A firmware virtual NIC: receive filtering and RSS context bound to a ring
/// group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vnic {
    /// Firmware handle.
    pub id: u16,
    /// Flow handle returned with the base L2 filter.
    pub flow_id: u32,
    /// Base L2 filter handle.
    pub filter_id: u64,
    /// The ring group the VNIC delivers to.
    pub ring_grp: u16,
    /// RSS rule.
    pub rss_rule: u16,
    /// CoS rule.
    pub cos_rule: u16,
    /// LB rule.
    pub lb_rule: u16,
    /// RSS/CoS/LB context handle.
    pub ctx_id: u16,
    /// Maximum receive unit.
    pub mru: u16,
    /// Whether this is the function's default VNIC.
    pub is_default: bool,
}

impl Vnic {
    pub(crate) fn new(is_default: bool) -> Self {
        Self {
            id: INVALID_HW_RING_ID,
            flow_id: HWRM_NA_SIGNATURE,
            filter_id: INVALID_L2_FILTER_ID,
            ring_grp: INVALID_HW_RING_ID,
            rss_rule: INVALID_HW_RING_ID,
            cos_rule: INVALID_HW_RING_ID,
            lb_rule: INVALID_HW_RING_ID,
            ctx_id: INVALID_HW_RING_ID,
            mru: 0,
            is_default,
        }
    }

    /// Returns true if firmware has allocated this VNIC.
    pub fn is_bound(&self) -> bool {
        self.id != INVALID_HW_RING_ID
    }

    pub(crate) fn clear(&mut self) {
        let mru = self.mru;
        *self = Self::new(self.is_default);
        self.mru = mru;
    }
}
