// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! An emulated bnxt function for tests: a DMA allocator backed by heap
//! memory, and an in-process firmware that decodes HWRM requests out of
//! that memory and posts responses back into it.

use crate::backing::DeviceBacking;
use crate::backing::DeviceRegisterIo;
use crate::interrupt::InterruptRegistrar;
use crate::interrupt::InterruptRegistration;
use crate::interrupt::InterruptRequest;
use crate::link::LinkReport;
use crate::link::LinkStateNotify;
use crate::memory::AtomicSliceOps;
use crate::memory::DmaClient;
use crate::memory::MappedDmaTarget;
use crate::memory::MemoryBlock;
use crate::memory::PAGE_SIZE;
use bnxt_defs::HWRM_BAR;
use bnxt_defs::hwrm::*;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU8;
use zerocopy::FromBytes;
use zerocopy::FromZeros;
use zerocopy::IntoBytes;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::byteorder::little_endian::U64;

const DMA_BASE: u64 = 0x1000_0000;

#[derive(Default)]
struct DmaState {
    next_phys: u64,
    allocations: usize,
    fail_after: Option<usize>,
    buffers: BTreeMap<u64, Weak<[AtomicU8]>>,
    alloc_log: Vec<u64>,
    free_log: Vec<u64>,
}

/// A DMA allocator that hands out heap memory at fake, page-aligned device
/// addresses and records what it allocated and released.
#[derive(Clone)]
pub struct TestDmaClient {
    state: Arc<Mutex<DmaState>>,
}

struct TestBuffer {
    data: Arc<[AtomicU8]>,
    phys: u64,
    state: Arc<Mutex<DmaState>>,
}

impl MappedDmaTarget for TestBuffer {
    fn as_slice(&self) -> &[AtomicU8] {
        &self.data
    }

    fn phys_addr(&self) -> u64 {
        self.phys
    }
}

impl Drop for TestBuffer {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.buffers.remove(&self.phys);
        state.free_log.push(self.phys);
    }
}

impl TestDmaClient {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DmaState {
                next_phys: DMA_BASE,
                ..Default::default()
            })),
        }
    }

    /// Fails every allocation after the first `n` successful ones.
    pub fn fail_after(&self, n: usize) {
        let mut state = self.state.lock();
        state.fail_after = Some(state.allocations + n);
    }

    /// Buffers allocated and not yet released.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Addresses of every successful allocation, oldest first.
    pub fn alloc_log(&self) -> Vec<u64> {
        self.state.lock().alloc_log.clone()
    }

    /// Addresses of every released buffer, in release order.
    pub fn free_log(&self) -> Vec<u64> {
        self.state.lock().free_log.clone()
    }

    fn lookup(&self, phys: u64, len: usize) -> Option<(Arc<[AtomicU8]>, usize)> {
        let state = self.state.lock();
        let (&base, buffer) = state.buffers.range(..=phys).next_back()?;
        let data = buffer.upgrade()?;
        let offset = (phys - base) as usize;
        (offset + len <= data.len()).then_some((data, offset))
    }

    /// Reads device memory at `phys`, as the device would.
    pub fn read(&self, phys: u64, data: &mut [u8]) -> bool {
        let Some((mem, offset)) = self.lookup(phys, data.len()) else {
            return false;
        };
        mem[offset..offset + data.len()].atomic_read(data);
        true
    }

    /// Writes device memory at `phys`, as the device would.
    pub fn write(&self, phys: u64, data: &[u8]) -> bool {
        let Some((mem, offset)) = self.lookup(phys, data.len()) else {
            return false;
        };
        mem[offset..offset + data.len()].atomic_write(data);
        true
    }
}

impl DmaClient for TestDmaClient {
    fn allocate_dma_buffer(&self, len: usize) -> anyhow::Result<MemoryBlock> {
        let mut state = self.state.lock();
        if state.fail_after.is_some_and(|n| state.allocations >= n) {
            anyhow::bail!("injected allocation failure");
        }
        state.allocations += 1;
        let phys = state.next_phys;
        // Leave a guard page between buffers.
        state.next_phys += (len.div_ceil(PAGE_SIZE) + 1) as u64 * PAGE_SIZE as u64;
        let data: Arc<[AtomicU8]> = (0..len).map(|_| AtomicU8::new(0)).collect();
        state.buffers.insert(phys, Arc::downgrade(&data));
        state.alloc_log.push(phys);
        drop(state);
        Ok(MemoryBlock::new(TestBuffer {
            data,
            phys,
            state: self.state.clone(),
        }))
    }
}

/// A command failure to inject.
struct InjectedFailure {
    opcode: Option<HwrmOpcode>,
    skip: usize,
    status: u16,
}

struct FirmwareState {
    short: [u32; 4],
    partial: bool,
    overlapped: bool,
    requests: Vec<(HwrmOpcode, Vec<u8>)>,
    failure: Option<InjectedFailure>,
    respond: bool,
    mangle_seq_id: bool,
    def_req_timeout: u16,
    cos_queues: u8,
    next_handle: u32,
    live_handles: usize,
    link: u8,
    link_speed: u16,
    auto_mode: u8,
}

/// The in-process firmware behind BAR 0.
pub struct EmulatedFirmware {
    dma: TestDmaClient,
    state: Mutex<FirmwareState>,
}

/// The MAC address the emulated function reports.
pub const TEST_MAC: [u8; 6] = [0x00, 0x0a, 0xf7, 0x12, 0x34, 0x56];

impl EmulatedFirmware {
    fn new(dma: TestDmaClient) -> Self {
        Self {
            dma,
            state: Mutex::new(FirmwareState {
                short: [0; 4],
                partial: false,
                overlapped: false,
                requests: Vec::new(),
                failure: None,
                respond: true,
                mangle_seq_id: false,
                def_req_timeout: 0,
                cos_queues: 2,
                next_handle: 0x10,
                live_handles: 0,
                link: PORT_PHY_QCFG_LINK_NO_LINK,
                link_speed: LINK_SPEED_25GB,
                auto_mode: PORT_PHY_QCFG_AUTO_MODE_ALL_SPEEDS,
            }),
        }
    }

    /// Fails a command with `status`: the first one matching `opcode` (any
    /// command if `None`) after skipping `skip` matches.
    pub fn fail_request(&self, opcode: Option<HwrmOpcode>, skip: usize, status: u16) {
        self.state.lock().failure = Some(InjectedFailure {
            opcode,
            skip,
            status,
        });
    }

    /// Stops posting responses.
    pub fn set_respond(&self, respond: bool) {
        self.state.lock().respond = respond;
    }

    /// Echoes the wrong sequence number in responses.
    pub fn set_mangle_seq_id(&self, mangle: bool) {
        self.state.lock().mangle_seq_id = mangle;
    }

    /// Sets the default command timeout reported by `VER_GET`.
    pub fn set_def_req_timeout(&self, ms: u16) {
        self.state.lock().def_req_timeout = ms;
    }

    /// Sets the number of CoS queues `QUEUE_QPORTCFG` reports.
    pub fn set_cos_queues(&self, n: u8) {
        self.state.lock().cos_queues = n;
    }

    /// Sets the physical link state.
    pub fn set_link(&self, up: bool, speed: u16) {
        let mut state = self.state.lock();
        state.link = if up {
            PORT_PHY_QCFG_LINK_LINK
        } else {
            PORT_PHY_QCFG_LINK_NO_LINK
        };
        state.link_speed = speed;
    }

    /// Opcodes of every command received, oldest first.
    pub fn opcodes(&self) -> Vec<HwrmOpcode> {
        self.state.lock().requests.iter().map(|(op, _)| *op).collect()
    }

    /// Clears the command log.
    pub fn clear_log(&self) {
        self.state.lock().requests.clear();
    }

    /// Every received request of type `Req`, oldest first.
    pub fn requests<Req: HwrmRequest + FromBytes>(&self) -> Vec<Req> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(op, _)| *op == Req::OPCODE)
            .filter_map(|(_, body)| Req::read_from_bytes(body).ok())
            .collect()
    }

    /// Handles allocated since the last function reset.
    pub fn live_handles(&self) -> usize {
        self.state.lock().live_handles
    }

    /// Whether a command was started while another was being written.
    pub fn overlapped(&self) -> bool {
        self.state.lock().overlapped
    }

    fn write_window(&self, offset: usize, value: u32) {
        let mut state = self.state.lock();
        if offset == HWRM_COMM_TRIGGER_OFFSET as usize {
            state.partial = false;
            let short = state.short;
            drop(state);
            self.execute(short);
            return;
        }
        let word = (offset - HWRM_COMM_CHAN_OFFSET as usize) / 4;
        if word < state.short.len() {
            if word == 0 {
                if state.partial {
                    state.overlapped = true;
                }
                state.partial = true;
            }
            state.short[word] = value;
        }
    }

    fn execute(&self, words: [u32; 4]) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let Ok(short) = HwrmShortInput::read_from_bytes(&bytes) else {
            return;
        };
        assert_eq!(short.signature.get(), HWRM_SHORT_REQ_SIGNATURE);
        let size = short.size.get() as usize;
        let mut request = vec![0; size];
        assert!(self.dma.read(short.req_addr.get(), &mut request));
        let (header, body) = HwrmInputHeader::read_from_prefix(&request)
            .expect("request shorter than its header");
        let opcode = HwrmOpcode(header.req_type.get());
        assert_eq!(opcode.0, short.req_type.get());

        let mut state = self.state.lock();
        state.requests.push((opcode, body.to_vec()));
        if !state.respond {
            return;
        }

        let injected = match &mut state.failure {
            Some(f) if f.opcode.is_none_or(|op| op == opcode) => {
                if f.skip == 0 {
                    Some(f.status)
                } else {
                    f.skip -= 1;
                    None
                }
            }
            _ => None,
        };
        let (error_code, payload) = match injected {
            Some(status) => {
                state.failure = None;
                (status, NoOutput::new_zeroed().as_bytes().to_vec())
            }
            None => (0, self.dispatch(&mut state, opcode, body)),
        };

        let seq_id = if state.mangle_seq_id {
            header.seq_id.get().wrapping_add(1)
        } else {
            header.seq_id.get()
        };
        drop(state);

        let resp_len = size_of::<HwrmOutputHeader>() + payload.len();
        let out = HwrmOutputHeader {
            error_code: U16::new(error_code),
            req_type: U16::new(opcode.0),
            seq_id: U16::new(seq_id),
            resp_len: U16::new(resp_len as u16),
        };
        let mut response = out.as_bytes().to_vec();
        response.extend_from_slice(&payload);
        // The valid key is written last.
        let last = response.len() - 1;
        response[last] = 0;
        let resp_addr = header.resp_addr.get();
        assert!(self.dma.write(resp_addr, &response));
        assert!(self.dma.write(resp_addr + last as u64, &[HWRM_RESP_VALID_KEY]));
    }

    fn handle(state: &mut FirmwareState) -> u32 {
        let id = state.next_handle;
        state.next_handle += 1;
        state.live_handles += 1;
        id
    }

    fn dispatch(&self, state: &mut FirmwareState, opcode: HwrmOpcode, body: &[u8]) -> Vec<u8> {
        match opcode {
            HwrmOpcode::VER_GET => VerGetOutput {
                hwrm_intf_maj: HWRM_VERSION_MAJOR,
                hwrm_intf_min: HWRM_VERSION_MINOR,
                hwrm_intf_upd: HWRM_VERSION_UPDATE,
                hwrm_fw_maj: 20,
                hwrm_fw_min: 6,
                hwrm_fw_bld: 1,
                max_req_win_len: U16::new(128),
                max_resp_len: U16::new(512),
                def_req_timeout: U16::new(state.def_req_timeout),
                chip_num: U16::new(0x16d7),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::FUNC_QCAPS => FuncQcapsOutput {
                fid: U16::new(0),
                port_id: U16::new(1),
                mac_address: TEST_MAC,
                max_rsscos_ctx: U16::new(64),
                max_cmpl_rings: U16::new(64),
                max_tx_rings: U16::new(32),
                max_rx_rings: U16::new(32),
                max_l2_ctxs: U16::new(32),
                max_vnics: U16::new(32),
                max_stat_ctx: U16::new(64),
                max_hw_ring_grps: U32::new(32),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::QUEUE_QPORTCFG => {
                let mut out = QueueQportcfgOutput::new_zeroed();
                out.max_configurable_queues = state.cos_queues;
                for (i, q) in out.queues.iter_mut().enumerate() {
                    q.id = (i * 4) as u8;
                }
                out.as_bytes().to_vec()
            }
            HwrmOpcode::FUNC_RESET => {
                state.live_handles = 0;
                NoOutput::new_zeroed().as_bytes().to_vec()
            }
            HwrmOpcode::PORT_PHY_QCFG => PortPhyQcfgOutput {
                link: state.link,
                link_speed: U16::new(state.link_speed),
                duplex: PORT_PHY_QCFG_DUPLEX_FULL,
                pause: PORT_PHY_QCFG_PAUSE_BOTH,
                auto_mode: state.auto_mode,
                auto_pause: PORT_PHY_QCFG_PAUSE_BOTH,
                auto_link_speed: U16::new(state.link_speed),
                auto_link_speed_mask: U16::new(SUPPORT_SPEEDS_10GB | SUPPORT_SPEEDS_25GB),
                support_speeds: U16::new(SUPPORT_SPEEDS_10GB | SUPPORT_SPEEDS_25GB),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::RING_ALLOC => {
                let req = RingAllocInput::read_from_bytes(body).expect("ring alloc");
                assert!(self.dma.read(req.page_tbl_addr.get(), &mut [0; 16]));
                RingAllocOutput {
                    ring_id: U16::new(Self::handle(state) as u16),
                    logical_ring_id: req.logical_id,
                    ..FromZeros::new_zeroed()
                }
                .as_bytes()
                .to_vec()
            }
            HwrmOpcode::RING_GRP_ALLOC => RingGrpAllocOutput {
                ring_group_id: U32::new(Self::handle(state)),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::STAT_CTX_ALLOC => StatCtxAllocOutput {
                stat_ctx_id: U32::new(Self::handle(state)),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::VNIC_ALLOC => VnicAllocOutput {
                vnic_id: U32::new(Self::handle(state)),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::VNIC_RSS_COS_LB_CTX_ALLOC => VnicRssCosLbCtxAllocOutput {
                rss_cos_lb_ctx_id: U16::new(Self::handle(state) as u16),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            HwrmOpcode::CFA_L2_FILTER_ALLOC => CfaL2FilterAllocOutput {
                l2_filter_id: U64::new(0x1_0000_0000 | u64::from(Self::handle(state))),
                flow_id: U32::new(0x77),
                ..FromZeros::new_zeroed()
            }
            .as_bytes()
            .to_vec(),
            _ => NoOutput::new_zeroed().as_bytes().to_vec(),
        }
    }

    /// Reads the multicast table a `CFA_L2_SET_RX_MASK` request points at.
    pub fn mc_table(&self, req: &CfaL2SetRxMaskInput) -> Vec<[u8; 6]> {
        (0..req.num_mc_entries.get() as u64)
            .map(|i| {
                let mut addr = [0; 6];
                assert!(self.dma.read(req.mc_tbl_addr.get() + i * 6, &mut addr));
                addr
            })
            .collect()
    }
}

/// Doorbell writes, in order.
#[derive(Default)]
pub struct DoorbellLog {
    writes: Mutex<Vec<(usize, u32)>>,
}

impl DoorbellLog {
    /// Every doorbell write so far.
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.writes.lock().clone()
    }

    /// Forgets recorded writes.
    pub fn clear(&self) {
        self.writes.lock().clear();
    }
}

/// A mapped BAR of the emulated function.
pub enum EmulatedBar {
    Hwrm(Arc<EmulatedFirmware>),
    Doorbell(Arc<DoorbellLog>),
}

impl DeviceRegisterIo for EmulatedBar {
    fn len(&self) -> usize {
        match self {
            EmulatedBar::Hwrm(_) => 0x1000,
            EmulatedBar::Doorbell(_) => 0x10000,
        }
    }

    fn read_u32(&self, _offset: usize) -> u32 {
        0
    }

    fn read_u64(&self, _offset: usize) -> u64 {
        0
    }

    fn write_u32(&self, offset: usize, data: u32) {
        match self {
            EmulatedBar::Hwrm(fw) => fw.write_window(offset, data),
            EmulatedBar::Doorbell(log) => log.writes.lock().push((offset, data)),
        }
    }

    fn write_u64(&self, offset: usize, data: u64) {
        self.write_u32(offset, data as u32);
        self.write_u32(offset + 4, (data >> 32) as u32);
    }
}

/// The emulated PCI function.
pub struct EmulatedDevice {
    pub dma: TestDmaClient,
    pub firmware: Arc<EmulatedFirmware>,
    pub doorbells: Arc<DoorbellLog>,
    pub fail_bar: Option<u8>,
}

impl EmulatedDevice {
    pub fn new() -> Self {
        let dma = TestDmaClient::new();
        Self {
            firmware: Arc::new(EmulatedFirmware::new(dma.clone())),
            dma,
            doorbells: Default::default(),
            fail_bar: None,
        }
    }
}

impl DeviceBacking for EmulatedDevice {
    type Registers = EmulatedBar;

    fn id(&self) -> &str {
        "emulated-bnxt"
    }

    fn map_bar(&mut self, n: u8) -> anyhow::Result<Self::Registers> {
        if self.fail_bar == Some(n) {
            anyhow::bail!("bar {n} unavailable");
        }
        Ok(if n == HWRM_BAR {
            EmulatedBar::Hwrm(self.firmware.clone())
        } else {
            EmulatedBar::Doorbell(self.doorbells.clone())
        })
    }

    fn dma_client(&self) -> Arc<dyn DmaClient> {
        Arc::new(self.dma.clone())
    }
}

/// Records every registration and release.
#[derive(Default)]
pub struct TestRegistrar {
    pub fail_at: Option<usize>,
    pub registered: Vec<InterruptRequest>,
    pub released: Arc<Mutex<Vec<u32>>>,
}

struct TestRegistration {
    vector: u32,
    released: Arc<Mutex<Vec<u32>>>,
}

impl InterruptRegistration for TestRegistration {
    fn vector(&self) -> u32 {
        self.vector
    }
}

impl Drop for TestRegistration {
    fn drop(&mut self) {
        self.released.lock().push(self.vector);
    }
}

impl InterruptRegistrar for TestRegistrar {
    fn register(
        &mut self,
        request: &InterruptRequest,
    ) -> anyhow::Result<Box<dyn InterruptRegistration>> {
        if self.fail_at == Some(self.registered.len()) {
            anyhow::bail!("no vectors left");
        }
        self.registered.push(request.clone());
        Ok(Box::new(TestRegistration {
            vector: request.vector,
            released: self.released.clone(),
        }))
    }
}

/// Collects link reports.
#[derive(Clone, Default)]
pub struct RecordingNotify {
    pub reports: Arc<Mutex<Vec<LinkReport>>>,
}

impl LinkStateNotify for RecordingNotify {
    fn link_state_changed(&self, report: &LinkReport) {
        self.reports.lock().push(report.clone());
    }
}
