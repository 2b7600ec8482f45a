// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Queue-set allocation.
//!
//! A transmit queue set is a completion ring and the transmit ring it
//! serves. A receive queue set is a completion ring, a receive ring, an
//! aggregation ring, the ring group binding them, a VNIC and the VNIC's
//! multicast list buffer.

use crate::error::Error;
use crate::memory::DmaClient;
use crate::memory::MemoryBlock;
use crate::memory::PAGE_SIZE;
use crate::resources::ResourceArena;
use crate::rings::CompletionRing;
use crate::rings::ProducerKind;
use crate::rings::ProducerRing;
use crate::rings::Ring;
use crate::rings::RingGroup;
use crate::rings::Vnic;
use bnxt_defs::CtxHwStats;
use bnxt_defs::DESCRIPTOR_SIZE;
use bnxt_defs::ETHER_ADDR_LEN;
use bnxt_defs::MAX_MC_ADDRS;

/// Ring id of the default completion ring.
pub const DEFAULT_CMPL_RING_ID: u16 = 0;

/// Entries in the default completion ring.
pub const DEFAULT_CMPL_RING_SIZE: u32 = (PAGE_SIZE / DESCRIPTOR_SIZE) as u32;

/// Bytes in a multicast list buffer.
pub const MC_LIST_LEN: usize = MAX_MC_ADDRS * ETHER_ADDR_LEN;

/// Ring id of receive set `i`'s completion ring and receive ring.
pub fn rx_ring_id(i: u16) -> u16 {
    i + 1
}

/// Ring id of receive set `i`'s aggregation ring, given `nrx` receive sets.
pub fn ag_ring_id(i: u16, nrx: u16) -> u16 {
    nrx + i + 1
}

/// Ring id of transmit set `i`'s completion ring and transmit ring, given
/// `nrx` receive sets.
pub fn tx_ring_id(i: u16, nrx: u16) -> u16 {
    2 * nrx + 1 + i
}

/// A transmit ring and its completion ring.
#[derive(Debug)]
pub struct TxQueueSet {
    pub(crate) cpr: CompletionRing,
    pub(crate) tx: ProducerRing,
    pub(crate) stats: MemoryBlock,
}

impl TxQueueSet {
    /// The completion ring.
    pub fn cpr(&self) -> &CompletionRing {
        &self.cpr
    }

    /// The transmit ring.
    pub fn tx(&self) -> &ProducerRing {
        &self.tx
    }

    /// Reads the hardware statistics the device last wrote.
    pub fn stats(&self) -> CtxHwStats {
        self.stats.read_obj(0)
    }

    fn clear(&mut self) {
        self.cpr.clear();
        self.cpr.rewind();
        self.tx.clear();
    }
}

/// The rings, group and VNIC of one receive queue set.
#[derive(Debug)]
pub struct RxQueueSet {
    pub(crate) cpr: CompletionRing,
    pub(crate) rx: ProducerRing,
    pub(crate) ag: ProducerRing,
    pub(crate) grp: RingGroup,
    pub(crate) vnic: Vnic,
    pub(crate) mc_list: MemoryBlock,
    pub(crate) stats: MemoryBlock,
}

impl RxQueueSet {
    /// The completion ring.
    pub fn cpr(&self) -> &CompletionRing {
        &self.cpr
    }

    /// The receive ring.
    pub fn rx(&self) -> &ProducerRing {
        &self.rx
    }

    /// The aggregation ring.
    pub fn ag(&self) -> &ProducerRing {
        &self.ag
    }

    /// The ring group.
    pub fn grp(&self) -> &RingGroup {
        &self.grp
    }

    /// The VNIC.
    pub fn vnic(&self) -> &Vnic {
        &self.vnic
    }

    /// Reads the hardware statistics the device last wrote.
    pub fn stats(&self) -> CtxHwStats {
        self.stats.read_obj(0)
    }

    /// Reads the multicast address list buffer.
    pub fn mc_list(&self) -> [[u8; ETHER_ADDR_LEN]; MAX_MC_ADDRS] {
        let mut list = [[0; ETHER_ADDR_LEN]; MAX_MC_ADDRS];
        for (i, addr) in list.iter_mut().enumerate() {
            self.mc_list.read_at(i * ETHER_ADDR_LEN, addr);
        }
        list
    }

    fn clear(&mut self) {
        self.cpr.clear();
        self.cpr.rewind();
        self.rx.clear();
        self.ag.clear();
        self.grp.clear();
        self.vnic.clear();
    }
}

/// All transmit and receive queue sets of a device, and the memory backing
/// them.
pub struct QueueSets {
    pub(crate) tx: Vec<TxQueueSet>,
    pub(crate) rx: Vec<RxQueueSet>,
    // Dropped after the ring views above so buffers go back newest first.
    arena: ResourceArena,
}

/// Ring sizes for a queue allocation.
#[derive(Debug, Copy, Clone)]
pub(crate) struct QueueGeometry {
    pub ntx: u16,
    pub nrx: u16,
    pub tx_descriptors: u32,
    pub rx_descriptors: u32,
}

impl QueueGeometry {
    fn validate(&self) -> Result<(), Error> {
        if self.ntx == 0 || self.nrx == 0 {
            return Err(Error::InvalidConfig("at least one tx and one rx queue set"));
        }
        // The highest ring id is that of the last tx ring.
        let last = 2 * u32::from(self.nrx) + u32::from(self.ntx);
        if last >= u32::from(bnxt_defs::INVALID_HW_RING_ID) {
            return Err(Error::InvalidConfig("too many queue sets"));
        }
        Ok(())
    }
}

type Built = (Vec<TxQueueSet>, Vec<RxQueueSet>);

impl QueueSets {
    /// Allocates the memory for every queue set.
    ///
    /// On failure every buffer allocated so far is released, newest first.
    pub(crate) fn allocate(
        dma_client: &dyn DmaClient,
        geometry: QueueGeometry,
    ) -> Result<Self, Error> {
        geometry.validate()?;
        let mut arena = ResourceArena::new();
        match Self::build(&mut arena, dma_client, geometry) {
            Ok((tx, rx)) => {
                tracing::debug!(
                    ntx = geometry.ntx,
                    nrx = geometry.nrx,
                    buffers = arena.len(),
                    "allocated queue sets"
                );
                Ok(Self { tx, rx, arena })
            }
            Err(err) => {
                tracing::warn!(
                    error = &err as &dyn std::error::Error,
                    buffers = arena.len(),
                    "queue set allocation failed, releasing buffers"
                );
                // The partially built sets were dropped on return from
                // `build`, so the arena holds the last references.
                arena.release();
                Err(err)
            }
        }
    }

    fn build(
        arena: &mut ResourceArena,
        dma_client: &dyn DmaClient,
        geometry: QueueGeometry,
    ) -> Result<Built, Error> {
        let QueueGeometry {
            ntx,
            nrx,
            tx_descriptors,
            rx_descriptors,
        } = geometry;
        let stats_len = size_of::<CtxHwStats>();
        let stats = |block: &MemoryBlock, i: u16| {
            block.subblock(usize::from(i) * stats_len, stats_len)
        };

        let tx_stats = arena.allocate(dma_client, "tx stats", usize::from(ntx) * stats_len)?;
        let mut tx = Vec::with_capacity(ntx.into());
        for i in 0..ntx {
            let id = tx_ring_id(i, nrx);
            let cpr_size = tx_descriptors * 2;
            let cpr_mem = arena.allocate(
                dma_client,
                "tx completion ring",
                ring_bytes(cpr_size),
            )?;
            let tx_mem = arena.allocate(dma_client, "tx ring", ring_bytes(tx_descriptors))?;
            tx.push(TxQueueSet {
                cpr: CompletionRing::new(Ring::new(id, cpr_size, cpr_mem)),
                tx: ProducerRing::new(Ring::new(id, tx_descriptors, tx_mem), ProducerKind::Tx),
                stats: stats(&tx_stats, i),
            });
        }

        let rx_stats = arena.allocate(dma_client, "rx stats", usize::from(nrx) * stats_len)?;
        let mut rx = Vec::with_capacity(nrx.into());
        for i in 0..nrx {
            let id = rx_ring_id(i);
            let cpr_size = rx_descriptors * 2;
            let cpr_mem = arena.allocate(
                dma_client,
                "rx completion ring",
                ring_bytes(cpr_size),
            )?;
            let rx_mem = arena.allocate(dma_client, "rx ring", ring_bytes(rx_descriptors))?;
            let ag_mem = arena.allocate(
                dma_client,
                "aggregation ring",
                ring_bytes(rx_descriptors),
            )?;
            let mc_list = arena.allocate(dma_client, "multicast list", MC_LIST_LEN)?;
            rx.push(RxQueueSet {
                cpr: CompletionRing::new(Ring::new(id, cpr_size, cpr_mem)),
                rx: ProducerRing::new(Ring::new(id, rx_descriptors, rx_mem), ProducerKind::Rx),
                ag: ProducerRing::new(
                    Ring::new(ag_ring_id(i, nrx), rx_descriptors, ag_mem),
                    ProducerKind::Aggregation,
                ),
                grp: RingGroup::default(),
                vnic: Vnic::new(i == 0),
                mc_list,
                stats: stats(&rx_stats, i),
            });
        }

        Ok((tx, rx))
    }

    /// The transmit queue sets.
    pub fn tx(&self) -> &[TxQueueSet] {
        &self.tx
    }

    /// The receive queue sets.
    pub fn rx(&self) -> &[RxQueueSet] {
        &self.rx
    }

    /// The number of DMA buffers backing the queue sets.
    pub fn buffer_count(&self) -> usize {
        self.arena.len()
    }

    /// Resets every firmware handle to its sentinel. Memory is kept.
    pub(crate) fn clear_ids(&mut self) {
        for set in &mut self.tx {
            set.clear();
        }
        for set in &mut self.rx {
            set.clear();
        }
    }

}

fn ring_bytes(entries: u32) -> usize {
    entries as usize * DESCRIPTOR_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulated::TestDmaClient;

    fn geometry(ntx: u16, nrx: u16) -> QueueGeometry {
        QueueGeometry {
            ntx,
            nrx,
            tx_descriptors: 256,
            rx_descriptors: 256,
        }
    }

    #[test]
    fn ring_ids_and_geometry() {
        let dma = TestDmaClient::new();
        let sets = QueueSets::allocate(&dma, geometry(2, 3)).unwrap();

        let rx_ids: Vec<_> = sets.rx().iter().map(|s| s.rx().ring().id()).collect();
        let ag_ids: Vec<_> = sets.rx().iter().map(|s| s.ag().ring().id()).collect();
        let tx_ids: Vec<_> = sets.tx().iter().map(|s| s.tx().ring().id()).collect();
        assert_eq!(rx_ids, [1, 2, 3]);
        assert_eq!(ag_ids, [4, 5, 6]);
        assert_eq!(tx_ids, [7, 8]);

        for set in sets.rx() {
            assert_eq!(set.cpr().ring().id(), set.rx().ring().id());
            assert_eq!(set.cpr().ring().capacity(), 512);
            assert!(set.grp().grp_id == bnxt_defs::INVALID_HW_RING_ID);
        }
        assert!(sets.rx()[0].vnic().is_default);
        assert!(!sets.rx()[1].vnic().is_default);

        let rings = sets
            .tx()
            .iter()
            .flat_map(|s| [s.cpr().ring(), s.tx().ring()])
            .chain(
                sets.rx()
                    .iter()
                    .flat_map(|s| [s.cpr().ring(), s.rx().ring(), s.ag().ring()]),
            );
        for ring in rings {
            assert!(ring.capacity().is_power_of_two());
            assert_eq!(ring.mask(), ring.capacity() - 1);
            assert_eq!(ring.doorbell_offset(), u32::from(ring.id()) * 0x80);
            assert!(!ring.is_bound());
        }

        // Two stats blocks, two buffers per tx set, four per rx set.
        assert_eq!(sets.buffer_count(), 2 + 2 * 2 + 3 * 4);
        assert_eq!(dma.live_buffers(), sets.buffer_count());
    }

    #[test]
    fn reallocation_is_deterministic() {
        let dma = TestDmaClient::new();
        let ids = |sets: &QueueSets| {
            sets.tx()
                .iter()
                .map(|s| s.tx().ring().id())
                .chain(sets.rx().iter().map(|s| s.ag().ring().id()))
                .collect::<Vec<_>>()
        };
        let first = QueueSets::allocate(&dma, geometry(4, 4)).unwrap();
        let a = ids(&first);
        drop(first);
        assert_eq!(dma.live_buffers(), 0);
        let second = QueueSets::allocate(&dma, geometry(4, 4)).unwrap();
        assert_eq!(a, ids(&second));
    }

    #[test]
    fn failure_at_every_step_releases_in_reverse() {
        let total = 2 + 2 * 2 + 2 * 4;
        for n in 0..total {
            let dma = TestDmaClient::new();
            dma.fail_after(n);
            let err = QueueSets::allocate(&dma, geometry(2, 2)).err().unwrap();
            assert!(matches!(err, Error::OutOfMemory { .. }), "step {n}");
            assert_eq!(dma.live_buffers(), 0, "step {n}");
            let mut allocated = dma.alloc_log();
            allocated.reverse();
            assert_eq!(dma.free_log(), allocated, "step {n}");
        }
    }

    #[test]
    fn multicast_buffer_failure_rolls_back_earlier_sets() {
        let dma = TestDmaClient::new();
        // tx stats, 2 tx buffers, rx stats, then set 0 (4) and set 1 up to
        // its multicast buffer.
        dma.fail_after(1 + 2 + 1 + 4 + 3);
        let err = QueueSets::allocate(&dma, geometry(1, 2)).err().unwrap();
        assert!(matches!(
            err,
            Error::OutOfMemory {
                what: "multicast list",
                ..
            }
        ));
        assert_eq!(dma.live_buffers(), 0);
    }

    #[test]
    fn rejects_empty_geometry() {
        let dma = TestDmaClient::new();
        assert!(matches!(
            QueueSets::allocate(&dma, geometry(0, 1)).err().unwrap(),
            Error::InvalidConfig(_)
        ));
        assert_eq!(dma.alloc_log().len(), 0);
    }
}
