// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ring, group, VNIC, filter and port commands.

use crate::backing::DeviceRegisterIo;
use crate::error::Error;
use crate::hwrm::HwrmChannel;
use crate::memory::MemoryBlock;
use crate::rings::CompletionRing;
use crate::rings::Ring;
use crate::rings::RingGroup;
use crate::rings::Vnic;
use bnxt_defs::INVALID_HW_RING_ID;
use bnxt_defs::RxMask;
use bnxt_defs::hwrm::CFA_L2_FILTER_ALLOC_ENABLES_DST_ID;
use bnxt_defs::hwrm::CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR;
use bnxt_defs::hwrm::CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR_MASK;
use bnxt_defs::hwrm::CFA_L2_FILTER_ALLOC_FLAGS_PATH_RX;
use bnxt_defs::hwrm::CfaL2FilterAllocInput;
use bnxt_defs::hwrm::CfaL2SetRxMaskInput;
use bnxt_defs::hwrm::HWRM_NA_SIGNATURE;
use bnxt_defs::hwrm::HwrmOpcode;
use bnxt_defs::hwrm::HwrmRequest;
use bnxt_defs::hwrm::PortPhyQcfgInput;
use bnxt_defs::hwrm::PortPhyQcfgOutput;
use bnxt_defs::hwrm::RING_ALLOC_ENABLES_STAT_CTX_ID_VALID;
use bnxt_defs::hwrm::RING_ALLOC_INT_MODE_MSIX;
use bnxt_defs::hwrm::RING_ALLOC_INT_MODE_POLL;
use bnxt_defs::hwrm::RING_ALLOC_PAGE_SIZE_4K;
use bnxt_defs::hwrm::RING_TYPE_TX;
use bnxt_defs::hwrm::RingAllocInput;
use bnxt_defs::hwrm::RingGrpAllocInput;
use bnxt_defs::hwrm::StatCtxAllocInput;
use bnxt_defs::hwrm::VNIC_ALLOC_FLAGS_DEFAULT;
use bnxt_defs::hwrm::VNIC_CFG_ENABLES_DFLT_RING_GRP;
use bnxt_defs::hwrm::VNIC_CFG_ENABLES_MRU;
use bnxt_defs::hwrm::VNIC_CFG_FLAGS_DEFAULT;
use bnxt_defs::hwrm::VnicAllocInput;
use bnxt_defs::hwrm::VnicCfgInput;
use bnxt_defs::hwrm::VnicRssCosLbCtxAllocInput;
use zerocopy::FromZeros;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::byteorder::little_endian::U64;

/// Parameters of a `RING_ALLOC` beyond the ring itself.
#[derive(Debug, Copy, Clone)]
pub(crate) struct RingAllocParams {
    pub ring_type: u8,
    pub cmpl_ring_id: u16,
    pub stat_ctx_id: u32,
    pub irq: bool,
}

impl RingAllocParams {
    /// A completion, receive or aggregation ring with no completion ring
    /// or statistics context of its own.
    pub fn unlinked(ring_type: u8, irq: bool) -> Self {
        Self {
            ring_type,
            cmpl_ring_id: INVALID_HW_RING_ID,
            stat_ctx_id: HWRM_NA_SIGNATURE,
            irq,
        }
    }
}

pub(crate) struct L2Driver<'a, R> {
    hwrm: &'a mut HwrmChannel<R>,
}

impl<'a, R: DeviceRegisterIo> L2Driver<'a, R> {
    pub fn new(hwrm: &'a mut HwrmChannel<R>) -> Self {
        Self { hwrm }
    }

    #[tracing::instrument(skip(self, ring), fields(id = ring.id()), level = "debug", err)]
    pub fn ring_alloc(&mut self, ring: &mut Ring, params: RingAllocParams) -> Result<(), Error> {
        let mut enables = 0;
        if params.ring_type == RING_TYPE_TX {
            enables |= RING_ALLOC_ENABLES_STAT_CTX_ID_VALID;
        }
        let queue_id = self.hwrm.default_queue_id();
        let resp = self.hwrm.request(RingAllocInput {
            enables: U32::new(enables),
            ring_type: params.ring_type,
            page_tbl_addr: U64::new(ring.phys_addr()),
            page_size: RING_ALLOC_PAGE_SIZE_4K,
            length: U32::new(ring.capacity()),
            logical_id: U16::new(ring.id()),
            cmpl_ring_id: U16::new(params.cmpl_ring_id),
            queue_id: U16::new(queue_id),
            stat_ctx_id: U32::new(params.stat_ctx_id),
            int_mode: if params.irq {
                RING_ALLOC_INT_MODE_MSIX
            } else {
                RING_ALLOC_INT_MODE_POLL
            },
            ..FromZeros::new_zeroed()
        })?;
        let phys_id = valid_handle(RingAllocInput::OPCODE, resp.ring_id.get().into())?;
        ring.bind(phys_id);
        tracing::trace!(id = ring.id(), phys_id, "ring allocated");
        Ok(())
    }

    /// Allocates a completion ring, rewinding its consumer and invalidating
    /// any entries from a previous binding.
    pub fn cmpl_ring_alloc(&mut self, cpr: &mut CompletionRing, irq: bool) -> Result<(), Error> {
        cpr.rewind();
        self.ring_alloc(
            cpr.ring_mut(),
            RingAllocParams::unlinked(bnxt_defs::hwrm::RING_TYPE_CMPL, irq),
        )
    }

    #[tracing::instrument(skip(self, cpr, stats), fields(id = cpr.ring().id()), level = "debug", err)]
    pub fn stat_ctx_alloc(
        &mut self,
        cpr: &mut CompletionRing,
        stats: &MemoryBlock,
        update_period_ms: u32,
    ) -> Result<(), Error> {
        let resp = self.hwrm.request(StatCtxAllocInput {
            stats_dma_addr: U64::new(stats.phys_addr()),
            update_period_ms: U32::new(update_period_ms),
            ..FromZeros::new_zeroed()
        })?;
        let id = resp.stat_ctx_id.get();
        if id >= u32::from(INVALID_HW_RING_ID) {
            return Err(Error::BadResponse {
                opcode: StatCtxAllocInput::OPCODE,
                reason: "invalid statistics context id",
            });
        }
        cpr.set_stats_ctx_id(id);
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn ring_grp_alloc(&mut self, grp: &mut RingGroup) -> Result<(), Error> {
        let resp = self.hwrm.request(RingGrpAllocInput {
            cr: U16::new(grp.cp_ring_id),
            rr: U16::new(grp.rx_ring_id),
            ar: U16::new(grp.ag_ring_id),
            sc: U16::new(grp.stats_ctx),
        })?;
        grp.grp_id = valid_handle(RingGrpAllocInput::OPCODE, resp.ring_group_id.get())?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn vnic_alloc(&mut self, vnic: &mut Vnic) -> Result<(), Error> {
        let flags = if vnic.is_default {
            VNIC_ALLOC_FLAGS_DEFAULT
        } else {
            0
        };
        let resp = self.hwrm.request(VnicAllocInput {
            flags: U32::new(flags),
            ..FromZeros::new_zeroed()
        })?;
        vnic.id = valid_handle(VnicAllocInput::OPCODE, resp.vnic_id.get())?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn vnic_ctx_alloc(&mut self, vnic: &mut Vnic) -> Result<(), Error> {
        let resp = self.hwrm.request(VnicRssCosLbCtxAllocInput {})?;
        vnic.ctx_id = valid_handle(
            VnicRssCosLbCtxAllocInput::OPCODE,
            resp.rss_cos_lb_ctx_id.get().into(),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn vnic_cfg(&mut self, vnic: &Vnic) -> Result<(), Error> {
        let flags = if vnic.is_default {
            VNIC_CFG_FLAGS_DEFAULT
        } else {
            0
        };
        self.hwrm.request(VnicCfgInput {
            flags: U32::new(flags),
            enables: U32::new(VNIC_CFG_ENABLES_DFLT_RING_GRP | VNIC_CFG_ENABLES_MRU),
            vnic_id: U16::new(vnic.id),
            dflt_ring_grp: U16::new(vnic.ring_grp),
            rss_rule: U16::new(vnic.rss_rule),
            cos_rule: U16::new(vnic.cos_rule),
            lb_rule: U16::new(vnic.lb_rule),
            mru: U16::new(vnic.mru),
            ..FromZeros::new_zeroed()
        })?;
        Ok(())
    }

    /// Steers frames addressed to `mac` to the VNIC.
    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn l2_filter_alloc(&mut self, vnic: &mut Vnic, mac: [u8; 6]) -> Result<(), Error> {
        let resp = self.hwrm.request(CfaL2FilterAllocInput {
            flags: U32::new(CFA_L2_FILTER_ALLOC_FLAGS_PATH_RX),
            enables: U32::new(
                CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR
                    | CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR_MASK
                    | CFA_L2_FILTER_ALLOC_ENABLES_DST_ID,
            ),
            l2_addr: mac,
            l2_addr_mask: [0xff; 6],
            dst_id: U16::new(vnic.id),
            ..FromZeros::new_zeroed()
        })?;
        vnic.filter_id = resp.l2_filter_id.get();
        vnic.flow_id = resp.flow_id.get();
        Ok(())
    }

    #[tracing::instrument(skip(self, mc_list), level = "debug", err)]
    pub fn set_rx_mask(
        &mut self,
        vnic_id: u16,
        mask: RxMask,
        mc_list: &MemoryBlock,
        mc_count: u32,
    ) -> Result<(), Error> {
        self.hwrm.request(CfaL2SetRxMaskInput {
            vnic_id: U32::new(vnic_id.into()),
            mask: U32::new(mask.into()),
            mc_tbl_addr: U64::new(mc_list.phys_addr()),
            num_mc_entries: U32::new(mc_count),
            ..FromZeros::new_zeroed()
        })?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn port_phy_qcfg(&mut self) -> Result<PortPhyQcfgOutput, Error> {
        let port_id = self.hwrm.info().port_id;
        self.hwrm.request(PortPhyQcfgInput {
            port_id: U16::new(port_id),
            ..FromZeros::new_zeroed()
        })
    }
}

/// Narrows a firmware handle to the 16 bits rings, groups and VNICs carry.
fn valid_handle(opcode: HwrmOpcode, id: u32) -> Result<u16, Error> {
    match u16::try_from(id) {
        Ok(id) if id != INVALID_HW_RING_ID => Ok(id),
        _ => Err(Error::BadResponse {
            opcode,
            reason: "invalid handle",
        }),
    }
}
