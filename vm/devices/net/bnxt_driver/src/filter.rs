// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Receive mask and multicast list state.

use crate::memory::MemoryBlock;
use bnxt_defs::ETHER_ADDR_LEN;
use bnxt_defs::MAX_MC_ADDRS;
use bnxt_defs::RxMask;

/// Promiscuous-mode flags requested by the host.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PromiscFlags {
    /// Receive every frame.
    pub promiscuous: bool,
    /// Receive every multicast frame.
    pub all_multicast: bool,
}

/// A VNIC's receive mask and the number of valid multicast list entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxFilter {
    /// The mask pushed with `CFA_L2_SET_RX_MASK`.
    pub mask: RxMask,
    /// Valid entries in the multicast list buffer.
    pub mc_count: u32,
    /// The last multicast list did not fit in the list buffer.
    pub mc_overflow: bool,
    /// The host asked for every multicast frame.
    pub host_all_mcast: bool,
}

impl Default for RxFilter {
    fn default() -> Self {
        Self {
            mask: RxMask::new().with_bcast(true),
            mc_count: 0,
            mc_overflow: false,
            host_all_mcast: false,
        }
    }
}

impl RxFilter {
    /// Applies a new multicast address list.
    ///
    /// More than `MAX_MC_ADDRS` addresses switch the filter to all-multicast
    /// and leave the list buffer untouched. Otherwise the buffer is rewritten
    /// with exactly `addrs`.
    pub(crate) fn set_multicast(&mut self, mc_list: &MemoryBlock, addrs: &[[u8; ETHER_ADDR_LEN]]) {
        self.mc_overflow = addrs.len() > MAX_MC_ADDRS;
        self.sync_all_mcast();
        if self.mc_overflow {
            return;
        }
        mc_list.zero();
        for (i, addr) in addrs.iter().enumerate() {
            mc_list.write_at(i * ETHER_ADDR_LEN, addr);
        }
        self.mc_count = addrs.len() as u32;
        self.mask.set_mcast(true);
    }

    pub(crate) fn set_promisc(&mut self, flags: PromiscFlags) {
        self.mask.set_promiscuous(flags.promiscuous);
        self.host_all_mcast = flags.all_multicast;
        self.sync_all_mcast();
    }

    // All-multicast stays on while either the host wants it or the list
    // overflowed.
    fn sync_all_mcast(&mut self) {
        self.mask.set_all_mcast(self.host_all_mcast || self.mc_overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulated::TestDmaClient;
    use crate::memory::DmaClient;
    use crate::queues::MC_LIST_LEN;

    fn addr(n: u8) -> [u8; 6] {
        [0x01, 0x00, 0x5e, 0, 0, n]
    }

    fn read_list(mem: &MemoryBlock) -> Vec<[u8; 6]> {
        (0..MAX_MC_ADDRS)
            .map(|i| {
                let mut a = [0; 6];
                mem.read_at(i * 6, &mut a);
                a
            })
            .collect()
    }

    #[test]
    fn exact_list_at_capacity() {
        let dma = TestDmaClient::new();
        let mem = dma.allocate_dma_buffer(MC_LIST_LEN).unwrap();
        let mut filter = RxFilter::default();
        let addrs: Vec<_> = (0..MAX_MC_ADDRS as u8).map(addr).collect();
        filter.set_multicast(&mem, &addrs);
        assert_eq!(filter.mc_count, MAX_MC_ADDRS as u32);
        assert!(filter.mask.mcast());
        assert!(!filter.mask.all_mcast());
        assert!(filter.mask.bcast());
        assert_eq!(read_list(&mem), addrs);

        // A shorter list zeroes the stale tail.
        filter.set_multicast(&mem, &addrs[..2]);
        assert_eq!(filter.mc_count, 2);
        let list = read_list(&mem);
        assert_eq!(&list[..2], &addrs[..2]);
        assert!(list[2..].iter().all(|a| *a == [0; 6]));
    }

    #[test]
    fn over_capacity_falls_back_to_all_multicast() {
        let dma = TestDmaClient::new();
        let mem = dma.allocate_dma_buffer(MC_LIST_LEN).unwrap();
        let mut filter = RxFilter::default();
        filter.set_multicast(&mem, &[addr(1), addr(2)]);
        let before = read_list(&mem);

        let many: Vec<_> = (0..=MAX_MC_ADDRS as u8).map(addr).collect();
        filter.set_multicast(&mem, &many);
        assert!(filter.mask.all_mcast());
        assert_eq!(filter.mc_count, 2);
        assert_eq!(read_list(&mem), before);

        // Back under capacity clears all-multicast again.
        filter.set_multicast(&mem, &[addr(3)]);
        assert!(!filter.mask.all_mcast());
        assert_eq!(filter.mc_count, 1);
    }

    #[test]
    fn promisc_bits() {
        let mut filter = RxFilter::default();
        filter.set_promisc(PromiscFlags {
            promiscuous: true,
            all_multicast: false,
        });
        assert!(filter.mask.promiscuous());
        assert!(!filter.mask.all_mcast());
        filter.set_promisc(PromiscFlags {
            promiscuous: false,
            all_multicast: true,
        });
        assert!(!filter.mask.promiscuous());
        assert!(filter.mask.all_mcast());
        assert!(filter.mask.bcast());
    }

    #[test]
    fn all_multicast_survives_either_side_clearing() {
        let dma = TestDmaClient::new();
        let mem = dma.allocate_dma_buffer(MC_LIST_LEN).unwrap();
        let mut filter = RxFilter::default();

        let many: Vec<_> = (0..=MAX_MC_ADDRS as u8).map(addr).collect();
        filter.set_multicast(&mem, &many);
        filter.set_promisc(PromiscFlags::default());
        assert!(filter.mc_overflow);
        assert!(filter.mask.all_mcast());

        filter.set_promisc(PromiscFlags {
            promiscuous: false,
            all_multicast: true,
        });
        filter.set_multicast(&mem, &[addr(1)]);
        assert!(!filter.mc_overflow);
        assert!(filter.mask.all_mcast());

        filter.set_promisc(PromiscFlags::default());
        assert!(!filter.mask.all_mcast());
        assert!(filter.mask.mcast());
    }
}
