// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The HWRM firmware command channel and the function-level commands.

use crate::backing::DeviceRegisterIo;
use crate::backoff::Backoff;
use crate::error::Error;
use crate::memory::DmaClient;
use crate::memory::MemoryBlock;
use crate::memory::PAGE_SIZE;
use crate::store_fence::store_fence;
use bnxt_defs::ETHER_ADDR_LEN;
use bnxt_defs::hwrm::FID_SELF;
use bnxt_defs::hwrm::FUNC_DRV_RGTR_ENABLES_OS_TYPE;
use bnxt_defs::hwrm::FUNC_DRV_RGTR_ENABLES_VER;
use bnxt_defs::hwrm::FUNC_DRV_RGTR_OS_TYPE_OTHER;
use bnxt_defs::hwrm::FUNC_RESET_LEVEL_RESETME;
use bnxt_defs::hwrm::FuncDrvRgtrInput;
use bnxt_defs::hwrm::FuncDrvUnrgtrInput;
use bnxt_defs::hwrm::FuncQcapsInput;
use bnxt_defs::hwrm::FuncResetInput;
use bnxt_defs::hwrm::HWRM_CMPL_RING_NONE;
use bnxt_defs::hwrm::HWRM_COMM_CHAN_OFFSET;
use bnxt_defs::hwrm::HWRM_COMM_TRIGGER_OFFSET;
use bnxt_defs::hwrm::HWRM_RESP_VALID_KEY;
use bnxt_defs::hwrm::HWRM_SHORT_REQ_SIGNATURE;
use bnxt_defs::hwrm::HWRM_TARGET_ID_SELF;
use bnxt_defs::hwrm::HWRM_VERSION_MAJOR;
use bnxt_defs::hwrm::HWRM_VERSION_MINOR;
use bnxt_defs::hwrm::HWRM_VERSION_UPDATE;
use bnxt_defs::hwrm::HwrmInputHeader;
use bnxt_defs::hwrm::HwrmOutputHeader;
use bnxt_defs::hwrm::HwrmRequest;
use bnxt_defs::hwrm::HwrmShortInput;
use bnxt_defs::hwrm::QueueQportcfgInput;
use bnxt_defs::hwrm::VerGetInput;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;
use zerocopy::FromZeros;
use zerocopy::IntoBytes;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::byteorder::little_endian::U64;

/// Size of the channel's DMA buffer: one page for requests, one for
/// responses.
pub(crate) const HWRM_DMA_LEN: usize = 2 * PAGE_SIZE;
const REQ_OFFSET: usize = 0;
const RESP_OFFSET: usize = PAGE_SIZE;

/// Driver version reported to firmware at registration.
const DRIVER_VERSION: (u8, u8, u8) = (1, 0, 0);

/// What firmware reported about itself and the function at attach time.
#[derive(Debug, Clone, Default)]
pub struct FirmwareInfo {
    /// HWRM interface version (major, minor, update).
    pub hwrm_intf_version: (u8, u8, u8),
    /// Firmware version (major, minor, build).
    pub fw_version: (u8, u8, u8),
    /// Chip number.
    pub chip_num: u16,
    /// Longest request firmware accepts.
    pub max_req_win_len: u16,
    /// Longest response firmware produces.
    pub max_resp_len: u16,
    /// Firmware's default command timeout in milliseconds, zero if none.
    pub def_req_timeout: u16,
    /// The function's MAC address.
    pub mac_address: [u8; ETHER_ADDR_LEN],
    /// The port this function belongs to.
    pub port_id: u16,
    /// Maximum completion rings.
    pub max_cmpl_rings: u16,
    /// Maximum transmit rings.
    pub max_tx_rings: u16,
    /// Maximum receive rings.
    pub max_rx_rings: u16,
    /// Maximum VNICs.
    pub max_vnics: u16,
    /// Maximum statistics contexts.
    pub max_stat_ctx: u16,
    /// Maximum ring groups.
    pub max_hw_ring_grps: u32,
    /// Maximum RSS/CoS/LB contexts.
    pub max_rsscos_ctx: u16,
    /// Maximum L2 contexts.
    pub max_l2_ctxs: u16,
    /// CoS queue ids configured on the port.
    pub cos_queue_ids: Vec<u8>,
}

/// The firmware command channel.
///
/// Only one command is ever in flight: callers hold `&mut self` from the
/// request write until the response is read.
pub(crate) struct HwrmChannel<R> {
    bar0: R,
    dma: Option<MemoryBlock>,
    seq_id: u16,
    timeout: Duration,
    info: FirmwareInfo,
}

impl<R: DeviceRegisterIo> HwrmChannel<R> {
    pub fn new(bar0: R, dma_client: &dyn DmaClient, timeout: Duration) -> Result<Self, Error> {
        let dma = dma_client
            .allocate_dma_buffer(HWRM_DMA_LEN)
            .map_err(Error::oom("hwrm channel buffer"))?;
        Ok(Self {
            bar0,
            dma: Some(dma),
            seq_id: 0,
            timeout,
            info: FirmwareInfo::default(),
        })
    }

    pub fn info(&self) -> &FirmwareInfo {
        &self.info
    }

    pub fn is_open(&self) -> bool {
        self.dma.is_some()
    }

    /// Releases the channel's DMA buffer. Later commands fail with
    /// [`Error::ChannelClosed`].
    pub fn close(&mut self) {
        if let Some(dma) = self.dma.take() {
            tracing::debug!(phys = dma.phys_addr(), "closing hwrm channel");
        }
    }

    /// Sends a command and waits for its response.
    pub fn request<Req: HwrmRequest>(&mut self, req: Req) -> Result<Req::Response, Error> {
        let opcode = Req::OPCODE;
        let dma = self.dma.as_ref().ok_or(Error::ChannelClosed)?;
        let req_page = dma.subblock(REQ_OFFSET, PAGE_SIZE);
        let resp_page = dma.subblock(RESP_OFFSET, PAGE_SIZE);

        let seq_id = self.seq_id;
        self.seq_id = self.seq_id.wrapping_add(1);

        let header = HwrmInputHeader {
            req_type: U16::new(opcode.0),
            cmpl_ring: U16::new(HWRM_CMPL_RING_NONE),
            seq_id: U16::new(seq_id),
            target_id: U16::new(HWRM_TARGET_ID_SELF),
            resp_addr: U64::new(resp_page.phys_addr()),
        };
        let size = size_of::<HwrmInputHeader>() + size_of::<Req>();
        assert!(size <= PAGE_SIZE);

        resp_page.zero();
        req_page.write_obj(0, &header);
        req_page.write_at(size_of::<HwrmInputHeader>(), req.as_bytes());

        let short = HwrmShortInput {
            req_type: U16::new(opcode.0),
            signature: U16::new(HWRM_SHORT_REQ_SIGNATURE),
            target_id: U16::new(HWRM_TARGET_ID_SELF),
            size: U16::new(size as u16),
            req_addr: U64::new(req_page.phys_addr()),
        };

        tracing::trace!(?opcode, seq_id, size, "hwrm request");

        store_fence();
        for (i, word) in short.as_bytes().chunks_exact(4).enumerate() {
            let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            self.bar0
                .write_u32(HWRM_COMM_CHAN_OFFSET as usize + i * 4, word);
        }
        self.bar0.write_u32(HWRM_COMM_TRIGGER_OFFSET as usize, 1);

        let resp_hdr = self.wait_response(&resp_page).ok_or_else(|| {
            tracing::error!(?opcode, seq_id, timeout = ?self.timeout, "hwrm command timed out");
            Error::Timeout { opcode, seq_id }
        })?;

        tracing::trace!(
            ?opcode,
            seq_id,
            error_code = resp_hdr.error_code.get(),
            resp_len = resp_hdr.resp_len.get(),
            "hwrm response"
        );

        if resp_hdr.seq_id.get() != seq_id {
            return Err(Error::BadResponse {
                opcode,
                reason: "sequence id mismatch",
            });
        }
        if resp_hdr.req_type.get() != opcode.0 {
            return Err(Error::BadResponse {
                opcode,
                reason: "request type mismatch",
            });
        }
        if resp_hdr.error_code.get() != 0 {
            return Err(Error::Firmware {
                opcode,
                status: resp_hdr.error_code.get(),
            });
        }
        let resp_size = size_of::<HwrmOutputHeader>() + size_of::<Req::Response>();
        if (resp_hdr.resp_len.get() as usize) < resp_size {
            return Err(Error::BadResponse {
                opcode,
                reason: "response too short",
            });
        }
        Ok(resp_page.read_obj(size_of::<HwrmOutputHeader>()))
    }

    /// Polls the response page until firmware posts a response whose last
    /// byte is the valid key.
    fn wait_response(&self, resp_page: &MemoryBlock) -> Option<HwrmOutputHeader> {
        let deadline = Instant::now() + self.timeout;
        let mut backoff = Backoff::new();
        loop {
            let hdr: HwrmOutputHeader = resp_page.read_obj(0);
            let len = hdr.resp_len.get() as usize;
            if len >= size_of::<HwrmOutputHeader>() && len <= resp_page.len() {
                let mut key = [0];
                resp_page.read_at(len - 1, &mut key);
                if key[0] == HWRM_RESP_VALID_KEY {
                    // The key is written last; order the header and payload
                    // reads after it.
                    std::sync::atomic::fence(Ordering::Acquire);
                    return Some(resp_page.read_obj(0));
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            backoff.back_off();
        }
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn ver_get(&mut self) -> Result<(), Error> {
        let resp = self.request(VerGetInput {
            hwrm_intf_maj: HWRM_VERSION_MAJOR,
            hwrm_intf_min: HWRM_VERSION_MINOR,
            hwrm_intf_upd: HWRM_VERSION_UPDATE,
            ..FromZeros::new_zeroed()
        })?;

        self.info.hwrm_intf_version = (resp.hwrm_intf_maj, resp.hwrm_intf_min, resp.hwrm_intf_upd);
        self.info.fw_version = (resp.hwrm_fw_maj, resp.hwrm_fw_min, resp.hwrm_fw_bld);
        self.info.chip_num = resp.chip_num.get();
        self.info.max_req_win_len = resp.max_req_win_len.get();
        self.info.max_resp_len = resp.max_resp_len.get();
        self.info.def_req_timeout = resp.def_req_timeout.get();
        if self.info.def_req_timeout != 0 {
            self.timeout = Duration::from_millis(self.info.def_req_timeout.into());
        }

        tracing::info!(
            intf = ?self.info.hwrm_intf_version,
            fw = ?self.info.fw_version,
            chip = self.info.chip_num,
            timeout = ?self.timeout,
            "hwrm version"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn drv_rgtr(&mut self) -> Result<(), Error> {
        let (maj, min, upd) = DRIVER_VERSION;
        self.request(FuncDrvRgtrInput {
            enables: U32::new(FUNC_DRV_RGTR_ENABLES_OS_TYPE | FUNC_DRV_RGTR_ENABLES_VER),
            os_type: U16::new(FUNC_DRV_RGTR_OS_TYPE_OTHER),
            ver_maj: maj,
            ver_min: min,
            ver_upd: upd,
            ..FromZeros::new_zeroed()
        })?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn drv_unrgtr(&mut self) -> Result<(), Error> {
        self.request(FuncDrvUnrgtrInput::new_zeroed())?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn func_reset(&mut self) -> Result<(), Error> {
        self.request(FuncResetInput {
            func_reset_level: FUNC_RESET_LEVEL_RESETME,
            ..FromZeros::new_zeroed()
        })?;
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn func_qcaps(&mut self) -> Result<(), Error> {
        let resp = self.request(FuncQcapsInput {
            fid: U16::new(FID_SELF),
            ..FromZeros::new_zeroed()
        })?;
        let info = &mut self.info;
        info.mac_address = resp.mac_address;
        info.port_id = resp.port_id.get();
        info.max_cmpl_rings = resp.max_cmpl_rings.get();
        info.max_tx_rings = resp.max_tx_rings.get();
        info.max_rx_rings = resp.max_rx_rings.get();
        info.max_vnics = resp.max_vnics.get();
        info.max_stat_ctx = resp.max_stat_ctx.get();
        info.max_hw_ring_grps = resp.max_hw_ring_grps.get();
        info.max_rsscos_ctx = resp.max_rsscos_ctx.get();
        info.max_l2_ctxs = resp.max_l2_ctxs.get();
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    pub fn queue_qportcfg(&mut self) -> Result<(), Error> {
        let resp = self.request(QueueQportcfgInput {
            port_id: U16::new(self.info.port_id),
            ..FromZeros::new_zeroed()
        })?;
        let count = (resp.max_configurable_queues as usize).min(resp.queues.len());
        if count == 0 {
            return Err(Error::BadResponse {
                opcode: QueueQportcfgInput::OPCODE,
                reason: "no cos queues configured",
            });
        }
        self.info.cos_queue_ids = resp.queues[..count].iter().map(|q| q.id).collect();
        Ok(())
    }

    /// The CoS queue id rings are allocated on.
    pub fn default_queue_id(&self) -> u16 {
        self.info.cos_queue_ids.first().copied().unwrap_or(0).into()
    }
}
