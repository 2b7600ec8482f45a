// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HWRM (hardware resource manager) firmware command definitions.
//!
//! Every request starts with [`HwrmInputHeader`] and every response with
//! [`HwrmOutputHeader`]. Responses end with a one-byte valid key written last
//! by firmware.

use std::fmt;
use std::fmt::Debug;
use std::mem::offset_of;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;
use zerocopy::byteorder::little_endian::U16;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::byteorder::little_endian::U64;

pub const HWRM_VERSION_MAJOR: u8 = 1;
pub const HWRM_VERSION_MINOR: u8 = 5;
pub const HWRM_VERSION_UPDATE: u8 = 1;

/// Offset of the command window in the HWRM BAR.
pub const HWRM_COMM_CHAN_OFFSET: u32 = 0;
/// Offset of the trigger register in the HWRM BAR.
pub const HWRM_COMM_TRIGGER_OFFSET: u32 = 0x100;

pub const HWRM_SHORT_REQ_SIGNATURE: u16 = 0x4321;
pub const HWRM_RESP_VALID_KEY: u8 = 1;
pub const HWRM_NA_SIGNATURE: u32 = 0xffff_ffff;
/// Target id addressing the function's own firmware agent.
pub const HWRM_TARGET_ID_SELF: u16 = 0xffff;
pub const HWRM_CMPL_RING_NONE: u16 = 0xffff;

pub const HWRM_DEFAULT_TIMEOUT_MS: u64 = 1000;

macro_rules! hwrm_opcodes {
    ($($(#[$attr:meta])* $name:ident = $value:expr,)*) => {
        /// HWRM request type.
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct HwrmOpcode(pub u16);

        impl HwrmOpcode {
            $($(#[$attr])* pub const $name: Self = Self($value);)*
        }

        impl Debug for HwrmOpcode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match *self {
                    $(Self::$name => f.pad(stringify!($name)),)*
                    Self(n) => write!(f, "{:#x}", n),
                }
            }
        }
    };
}

hwrm_opcodes! {
    VER_GET = 0x00,
    FUNC_RESET = 0x11,
    FUNC_QCAPS = 0x15,
    FUNC_DRV_UNRGTR = 0x1a,
    FUNC_DRV_RGTR = 0x1d,
    PORT_PHY_QCFG = 0x27,
    QUEUE_QPORTCFG = 0x30,
    VNIC_ALLOC = 0x40,
    VNIC_CFG = 0x42,
    RING_ALLOC = 0x50,
    RING_GRP_ALLOC = 0x60,
    VNIC_RSS_COS_LB_CTX_ALLOC = 0x70,
    CFA_L2_FILTER_ALLOC = 0x90,
    CFA_L2_SET_RX_MASK = 0x93,
    STAT_CTX_ALLOC = 0xb0,
}

impl fmt::Display for HwrmOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Implemented by every request payload.
pub trait HwrmRequest: IntoBytes + Immutable {
    const OPCODE: HwrmOpcode;
    type Response: FromBytes + IntoBytes + Immutable + KnownLayout;
}

macro_rules! hwrm_request {
    ($req:ty => $resp:ty, $op:ident) => {
        impl HwrmRequest for $req {
            const OPCODE: HwrmOpcode = HwrmOpcode::$op;
            type Response = $resp;
        }
    };
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct HwrmInputHeader {
    pub req_type: U16,
    pub cmpl_ring: U16,
    pub seq_id: U16,
    pub target_id: U16,
    pub resp_addr: U64,
}

const _: () = assert!(size_of::<HwrmInputHeader>() == 16);

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct HwrmOutputHeader {
    pub error_code: U16,
    pub req_type: U16,
    pub seq_id: U16,
    pub resp_len: U16,
}

const _: () = assert!(size_of::<HwrmOutputHeader>() == 8);

/// Written to the command window in place of the full request; firmware
/// fetches the request itself from `req_addr`.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct HwrmShortInput {
    pub req_type: U16,
    pub signature: U16,
    pub target_id: U16,
    pub size: U16,
    pub req_addr: U64,
}

const _: () = assert!(size_of::<HwrmShortInput>() == 16);

pub const HWRM_ERR_CODE_SUCCESS: u16 = 0;
pub const HWRM_ERR_CODE_FAIL: u16 = 1;
pub const HWRM_ERR_CODE_INVALID_PARAMS: u16 = 2;
pub const HWRM_ERR_CODE_RESOURCE_ACCESS_DENIED: u16 = 3;
pub const HWRM_ERR_CODE_RESOURCE_ALLOC_ERROR: u16 = 4;
pub const HWRM_ERR_CODE_INVALID_FLAGS: u16 = 5;
pub const HWRM_ERR_CODE_INVALID_ENABLES: u16 = 6;
pub const HWRM_ERR_CODE_CMD_NOT_SUPPORTED: u16 = 0xffff;

/// Response payload of commands that return nothing but the valid key.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct NoOutput {
    pub unused_0: [u8; 7],
    pub valid: u8,
}

// VER_GET

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VerGetInput {
    pub hwrm_intf_maj: u8,
    pub hwrm_intf_min: u8,
    pub hwrm_intf_upd: u8,
    pub unused_0: [u8; 5],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VerGetOutput {
    pub hwrm_intf_maj: u8,
    pub hwrm_intf_min: u8,
    pub hwrm_intf_upd: u8,
    pub hwrm_intf_rsvd: u8,
    pub hwrm_fw_maj: u8,
    pub hwrm_fw_min: u8,
    pub hwrm_fw_bld: u8,
    pub hwrm_fw_rsvd: u8,
    pub max_req_win_len: U16,
    pub max_resp_len: U16,
    pub def_req_timeout: U16,
    pub chip_num: U16,
    pub chip_rev: u8,
    pub chip_metal: u8,
    pub chip_bond_id: u8,
    pub chip_platform_type: u8,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

const _: () = assert!(size_of::<VerGetOutput>() == 24);

hwrm_request!(VerGetInput => VerGetOutput, VER_GET);

// FUNC_RESET

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FuncResetInput {
    pub enables: U32,
    pub vf_id: U16,
    pub func_reset_level: u8,
    pub unused_0: u8,
}

pub const FUNC_RESET_LEVEL_RESETME: u8 = 1;

hwrm_request!(FuncResetInput => NoOutput, FUNC_RESET);

// FUNC_QCAPS

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FuncQcapsInput {
    pub fid: U16,
    pub unused_0: [u8; 6],
}

pub const FID_SELF: u16 = 0xffff;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FuncQcapsOutput {
    pub fid: U16,
    pub port_id: U16,
    pub flags: U32,
    pub mac_address: [u8; 6],
    pub max_rsscos_ctx: U16,
    pub max_cmpl_rings: U16,
    pub max_tx_rings: U16,
    pub max_rx_rings: U16,
    pub max_l2_ctxs: U16,
    pub max_vnics: U16,
    pub max_stat_ctx: U16,
    pub max_hw_ring_grps: U32,
    pub unused_0: [u8; 7],
    pub valid: u8,
}

const _: () = assert!(size_of::<FuncQcapsOutput>() == 40);

hwrm_request!(FuncQcapsInput => FuncQcapsOutput, FUNC_QCAPS);

// FUNC_DRV_RGTR

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FuncDrvRgtrInput {
    pub flags: U32,
    pub enables: U32,
    pub os_type: U16,
    pub ver_maj: u8,
    pub ver_min: u8,
    pub ver_upd: u8,
    pub unused_0: [u8; 3],
    pub timestamp: U32,
    pub unused_1: [u8; 4],
}

const _: () = assert!(size_of::<FuncDrvRgtrInput>() == 24);

pub const FUNC_DRV_RGTR_ENABLES_OS_TYPE: u32 = 0x1;
pub const FUNC_DRV_RGTR_ENABLES_VER: u32 = 0x2;
pub const FUNC_DRV_RGTR_OS_TYPE_OTHER: u16 = 0x1;

hwrm_request!(FuncDrvRgtrInput => NoOutput, FUNC_DRV_RGTR);

// FUNC_DRV_UNRGTR

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FuncDrvUnrgtrInput {
    pub flags: U32,
    pub unused_0: [u8; 4],
}

pub const FUNC_DRV_UNRGTR_FLAGS_PREPARE_FOR_SHUTDOWN: u32 = 0x1;

hwrm_request!(FuncDrvUnrgtrInput => NoOutput, FUNC_DRV_UNRGTR);

// PORT_PHY_QCFG

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct PortPhyQcfgInput {
    pub port_id: U16,
    pub unused_0: [u8; 6],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct PortPhyQcfgOutput {
    pub link: u8,
    pub unused_0: u8,
    pub link_speed: U16,
    pub duplex: u8,
    pub pause: u8,
    pub support_speeds: U16,
    pub force_link_speed: U16,
    pub auto_mode: u8,
    pub auto_pause: u8,
    pub auto_link_speed: U16,
    pub auto_link_speed_mask: U16,
    pub wirespeed: u8,
    pub lpbk: u8,
    pub force_pause: u8,
    pub module_status: u8,
    pub preemphasis: U32,
    pub phy_maj: u8,
    pub phy_min: u8,
    pub phy_bld: u8,
    pub phy_type: u8,
    pub media_type: u8,
    pub xcvr_pkg_type: u8,
    pub eee_config_phy_addr: u8,
    pub parallel_detect: u8,
    pub unused_1: [u8; 7],
    pub valid: u8,
}

const _: () = assert!(size_of::<PortPhyQcfgOutput>() == 40);

hwrm_request!(PortPhyQcfgInput => PortPhyQcfgOutput, PORT_PHY_QCFG);

pub const PORT_PHY_QCFG_LINK_NO_LINK: u8 = 0;
pub const PORT_PHY_QCFG_LINK_SIGNAL: u8 = 1;
pub const PORT_PHY_QCFG_LINK_LINK: u8 = 2;

pub const PORT_PHY_QCFG_DUPLEX_HALF: u8 = 0;
pub const PORT_PHY_QCFG_DUPLEX_FULL: u8 = 1;

pub const PORT_PHY_QCFG_PAUSE_TX: u8 = 0x1;
pub const PORT_PHY_QCFG_PAUSE_RX: u8 = 0x2;
pub const PORT_PHY_QCFG_PAUSE_BOTH: u8 = 0x3;

pub const PORT_PHY_QCFG_AUTO_MODE_NONE: u8 = 0;
pub const PORT_PHY_QCFG_AUTO_MODE_ALL_SPEEDS: u8 = 1;
pub const PORT_PHY_QCFG_AUTO_MODE_ONE_SPEED: u8 = 2;
pub const PORT_PHY_QCFG_AUTO_MODE_ONE_OR_BELOW: u8 = 3;
pub const PORT_PHY_QCFG_AUTO_MODE_SPEED_MASK: u8 = 4;

pub const PORT_PHY_QCFG_PHY_ADDR_MASK: u8 = 0x1f;

pub const LINK_SPEED_100MB: u16 = 0x1;
pub const LINK_SPEED_1GB: u16 = 0xa;
pub const LINK_SPEED_2GB: u16 = 0x14;
pub const LINK_SPEED_2_5GB: u16 = 0x19;
pub const LINK_SPEED_10GB: u16 = 0x64;
pub const LINK_SPEED_20GB: u16 = 0xc8;
pub const LINK_SPEED_25GB: u16 = 0xfa;
pub const LINK_SPEED_40GB: u16 = 0x190;
pub const LINK_SPEED_50GB: u16 = 0x1f4;

pub const SUPPORT_SPEEDS_100MBHD: u16 = 0x1;
pub const SUPPORT_SPEEDS_100MB: u16 = 0x2;
pub const SUPPORT_SPEEDS_1GBHD: u16 = 0x4;
pub const SUPPORT_SPEEDS_1GB: u16 = 0x8;
pub const SUPPORT_SPEEDS_2GB: u16 = 0x10;
pub const SUPPORT_SPEEDS_2_5GB: u16 = 0x20;
pub const SUPPORT_SPEEDS_10GB: u16 = 0x40;
pub const SUPPORT_SPEEDS_20GB: u16 = 0x80;
pub const SUPPORT_SPEEDS_25GB: u16 = 0x100;
pub const SUPPORT_SPEEDS_40GB: u16 = 0x200;
pub const SUPPORT_SPEEDS_50GB: u16 = 0x400;

/// Converts a firmware link speed code to bits per second.
pub fn link_speed_bps(speed: u16) -> u64 {
    const MBPS: u64 = 1_000_000;
    match speed {
        LINK_SPEED_100MB => 100 * MBPS,
        LINK_SPEED_1GB => 1000 * MBPS,
        LINK_SPEED_2GB => 2000 * MBPS,
        LINK_SPEED_2_5GB => 2500 * MBPS,
        LINK_SPEED_10GB => 10_000 * MBPS,
        LINK_SPEED_20GB => 20_000 * MBPS,
        LINK_SPEED_25GB => 25_000 * MBPS,
        LINK_SPEED_40GB => 40_000 * MBPS,
        LINK_SPEED_50GB => 50_000 * MBPS,
        _ => 0,
    }
}

// QUEUE_QPORTCFG

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct QueueQportcfgInput {
    pub flags: U32,
    pub port_id: U16,
    pub unused_0: [u8; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CosQueueInfo {
    pub id: u8,
    pub service_profile: u8,
}

pub const MAX_COS_QUEUES: usize = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct QueueQportcfgOutput {
    pub max_configurable_queues: u8,
    pub max_configurable_lossless_queues: u8,
    pub queue_cfg_allowed: u8,
    pub queue_buffers_cfg: u8,
    pub queue_pfcenable_cfg: u8,
    pub queue_pri2cos_cfg: u8,
    pub queue_cos2bw_cfg: u8,
    pub unused_0: u8,
    pub queues: [CosQueueInfo; MAX_COS_QUEUES],
    pub unused_1: [u8; 7],
    pub valid: u8,
}

const _: () = assert!(size_of::<QueueQportcfgOutput>() == 32);

hwrm_request!(QueueQportcfgInput => QueueQportcfgOutput, QUEUE_QPORTCFG);

// RING_ALLOC

pub const RING_TYPE_CMPL: u8 = 0;
pub const RING_TYPE_TX: u8 = 1;
pub const RING_TYPE_RX: u8 = 2;

pub const RING_ALLOC_ENABLES_STAT_CTX_ID_VALID: u32 = 0x8;

pub const RING_ALLOC_INT_MODE_MSIX: u8 = 2;
pub const RING_ALLOC_INT_MODE_POLL: u8 = 3;

/// Page size encoding used by RING_ALLOC: log2 of the page size in bytes.
pub const RING_ALLOC_PAGE_SIZE_4K: u8 = 12;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct RingAllocInput {
    pub enables: U32,
    pub ring_type: u8,
    pub unused_0: u8,
    pub unused_1: U16,
    pub page_tbl_addr: U64,
    pub fbo: U32,
    pub page_size: u8,
    pub page_tbl_depth: u8,
    pub unused_2: [u8; 2],
    pub length: U32,
    pub logical_id: U16,
    pub cmpl_ring_id: U16,
    pub queue_id: U16,
    pub unused_3: [u8; 2],
    pub reserved1: U32,
    pub ring_arb_cfg: U16,
    pub unused_4: [u8; 2],
    pub reserved3: U32,
    pub stat_ctx_id: U32,
    pub reserved4: U32,
    pub max_bw: U32,
    pub int_mode: u8,
    pub unused_5: [u8; 3],
}

const _: () = {
    assert!(size_of::<RingAllocInput>() == 64);
    assert!(offset_of!(RingAllocInput, queue_id) == 32);
    assert!(offset_of!(RingAllocInput, stat_ctx_id) == 48);
    assert!(offset_of!(RingAllocInput, int_mode) == 60);
};

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct RingAllocOutput {
    pub ring_id: U16,
    pub logical_ring_id: U16,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

hwrm_request!(RingAllocInput => RingAllocOutput, RING_ALLOC);

// RING_GRP_ALLOC

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct RingGrpAllocInput {
    pub cr: U16,
    pub rr: U16,
    pub ar: U16,
    pub sc: U16,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct RingGrpAllocOutput {
    pub ring_group_id: U32,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

hwrm_request!(RingGrpAllocInput => RingGrpAllocOutput, RING_GRP_ALLOC);

// STAT_CTX_ALLOC

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct StatCtxAllocInput {
    pub stats_dma_addr: U64,
    pub update_period_ms: U32,
    pub unused_0: [u8; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct StatCtxAllocOutput {
    pub stat_ctx_id: U32,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

hwrm_request!(StatCtxAllocInput => StatCtxAllocOutput, STAT_CTX_ALLOC);

// VNIC_ALLOC

pub const VNIC_ALLOC_FLAGS_DEFAULT: u32 = 0x1;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VnicAllocInput {
    pub flags: U32,
    pub unused_0: [u8; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VnicAllocOutput {
    pub vnic_id: U32,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

hwrm_request!(VnicAllocInput => VnicAllocOutput, VNIC_ALLOC);

// VNIC_RSS_COS_LB_CTX_ALLOC

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VnicRssCosLbCtxAllocInput {}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VnicRssCosLbCtxAllocOutput {
    pub rss_cos_lb_ctx_id: U16,
    pub unused_0: [u8; 5],
    pub valid: u8,
}

hwrm_request!(VnicRssCosLbCtxAllocInput => VnicRssCosLbCtxAllocOutput, VNIC_RSS_COS_LB_CTX_ALLOC);

// VNIC_CFG

pub const VNIC_CFG_FLAGS_DEFAULT: u32 = 0x1;

pub const VNIC_CFG_ENABLES_DFLT_RING_GRP: u32 = 0x1;
pub const VNIC_CFG_ENABLES_MRU: u32 = 0x10;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VnicCfgInput {
    pub flags: U32,
    pub enables: U32,
    pub vnic_id: U16,
    pub dflt_ring_grp: U16,
    pub rss_rule: U16,
    pub cos_rule: U16,
    pub lb_rule: U16,
    pub mru: U16,
    pub unused_0: [u8; 4],
}

const _: () = assert!(size_of::<VnicCfgInput>() == 24);

hwrm_request!(VnicCfgInput => NoOutput, VNIC_CFG);

// CFA_L2_FILTER_ALLOC

pub const CFA_L2_FILTER_ALLOC_FLAGS_PATH_RX: u32 = 0x1;

pub const CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR: u32 = 0x1;
pub const CFA_L2_FILTER_ALLOC_ENABLES_L2_ADDR_MASK: u32 = 0x2;
pub const CFA_L2_FILTER_ALLOC_ENABLES_DST_ID: u32 = 0x8000;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CfaL2FilterAllocInput {
    pub flags: U32,
    pub enables: U32,
    pub l2_addr: [u8; 6],
    pub unused_0: [u8; 2],
    pub l2_addr_mask: [u8; 6],
    pub l2_ovlan: U16,
    pub l2_ovlan_mask: U16,
    pub l2_ivlan: U16,
    pub l2_ivlan_mask: U16,
    pub unused_1: [u8; 2],
    pub t_l2_addr: [u8; 6],
    pub unused_2: [u8; 2],
    pub t_l2_addr_mask: [u8; 6],
    pub t_l2_ovlan: U16,
    pub t_l2_ovlan_mask: U16,
    pub t_l2_ivlan: U16,
    pub t_l2_ivlan_mask: U16,
    pub src_type: u8,
    pub unused_3: u8,
    pub src_id: U32,
    pub tunnel_type: u8,
    pub unused_4: u8,
    pub dst_id: U16,
    pub mirror_vnic_id: U16,
    pub pri_hint: u8,
    pub unused_5: u8,
    pub unused_6: U32,
    pub l2_filter_id_hint: U64,
}

const _: () = {
    assert!(size_of::<CfaL2FilterAllocInput>() == 80);
    assert!(offset_of!(CfaL2FilterAllocInput, l2_addr_mask) == 16);
    assert!(offset_of!(CfaL2FilterAllocInput, src_type) == 54);
    assert!(offset_of!(CfaL2FilterAllocInput, dst_id) == 62);
};

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CfaL2FilterAllocOutput {
    pub l2_filter_id: U64,
    pub flow_id: U32,
    pub unused_0: [u8; 3],
    pub valid: u8,
}

hwrm_request!(CfaL2FilterAllocInput => CfaL2FilterAllocOutput, CFA_L2_FILTER_ALLOC);

// CFA_L2_SET_RX_MASK

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CfaL2SetRxMaskInput {
    pub vnic_id: U32,
    pub mask: U32,
    pub mc_tbl_addr: U64,
    pub num_mc_entries: U32,
    pub unused_0: [u8; 4],
    pub vlan_tag_tbl_addr: U64,
    pub num_vlan_tags: U32,
    pub unused_1: [u8; 4],
}

const _: () = assert!(size_of::<CfaL2SetRxMaskInput>() == 40);

hwrm_request!(CfaL2SetRxMaskInput => NoOutput, CFA_L2_SET_RX_MASK);
