// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Link state tracking.

use bnxt_defs::hwrm::PORT_PHY_QCFG_AUTO_MODE_NONE;
use bnxt_defs::hwrm::PORT_PHY_QCFG_DUPLEX_FULL;
use bnxt_defs::hwrm::PORT_PHY_QCFG_LINK_LINK;
use bnxt_defs::hwrm::PORT_PHY_QCFG_PAUSE_RX;
use bnxt_defs::hwrm::PORT_PHY_QCFG_PAUSE_TX;
use bnxt_defs::hwrm::PORT_PHY_QCFG_PHY_ADDR_MASK;
use bnxt_defs::hwrm::PortPhyQcfgOutput;
use bnxt_defs::hwrm::link_speed_bps;

/// Receives link transitions.
pub trait LinkStateNotify: Send + Sync {
    /// Called once per up/down transition. Called with the command channel
    /// held, so it must not call back into the device.
    fn link_state_changed(&self, report: &LinkReport);
}

/// Pause (flow control) state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Pause {
    /// Honor received pause frames.
    pub rx: bool,
    /// Send pause frames.
    pub tx: bool,
}

impl Pause {
    fn from_bits(bits: u8) -> Self {
        Self {
            rx: bits & PORT_PHY_QCFG_PAUSE_RX != 0,
            tx: bits & PORT_PHY_QCFG_PAUSE_TX != 0,
        }
    }
}

/// A link transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    /// The new link state.
    pub up: bool,
    /// Full duplex.
    pub full_duplex: bool,
    /// Negotiated flow control.
    pub pause: Pause,
    /// Link speed in bits per second, zero when down.
    pub speed_bps: u64,
}

/// What `media_status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStatus {
    /// Link is up.
    pub active: bool,
    /// Full duplex.
    pub full_duplex: bool,
    /// Link speed in bits per second.
    pub speed_bps: u64,
    /// Negotiated flow control.
    pub pause: Pause,
    /// Whether autonegotiation is enabled.
    pub autoneg: bool,
}

/// Settings requested at probe time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedLink {
    /// Autonegotiate speed.
    pub autoneg: bool,
    /// Autonegotiate flow control.
    pub flow_ctrl_autoneg: bool,
    /// Requested flow control.
    pub flow_ctrl: Pause,
    /// Requested speed, as a firmware speed code.
    pub link_speed: u16,
    /// Advertised speeds, as a firmware speed mask.
    pub advertising: u16,
}

/// The last PHY snapshot queried from firmware.
#[derive(Debug, Clone, Default)]
pub struct LinkInfo {
    /// Raw link status.
    pub phy_link_status: u8,
    /// Whether the link is reported up.
    pub link_up: bool,
    /// Raw duplex.
    pub duplex: u8,
    /// Raw negotiated pause bits.
    pub pause: u8,
    /// Raw autonegotiation mode.
    pub auto_mode: u8,
    /// Raw autonegotiated pause bits.
    pub auto_pause: u8,
    /// Raw forced pause bits.
    pub force_pause: u8,
    /// Current speed code.
    pub link_speed: u16,
    /// Forced speed code.
    pub force_link_speed: u16,
    /// Autonegotiated speed code.
    pub auto_link_speed: u16,
    /// Supported speed mask.
    pub support_speeds: u16,
    /// Advertised speed mask.
    pub auto_link_speed_mask: u16,
    /// Preemphasis setting.
    pub preemphasis: u32,
    /// PHY firmware version.
    pub phy_ver: (u8, u8, u8),
    /// PHY type.
    pub phy_type: u8,
    /// Media type.
    pub media_type: u8,
    /// Transceiver package type.
    pub transceiver: u8,
    /// PHY address.
    pub phy_addr: u8,
    /// Settings derived at probe time.
    pub req: RequestedLink,
}

impl LinkInfo {
    /// Refreshes the snapshot from a `PORT_PHY_QCFG` response and updates
    /// the up flag.
    ///
    /// With `report_transition` unset, the link is forced down. Otherwise
    /// the up flag follows firmware and a report is returned if it changed.
    pub(crate) fn update(
        &mut self,
        resp: &PortPhyQcfgOutput,
        report_transition: bool,
    ) -> Option<LinkReport> {
        let was_up = self.link_up;
        self.phy_link_status = resp.link;
        self.duplex = resp.duplex;
        self.pause = resp.pause;
        self.auto_mode = resp.auto_mode;
        self.auto_pause = resp.auto_pause;
        self.force_pause = resp.force_pause;
        // No speed is reported without a link.
        self.link_speed = if resp.link == PORT_PHY_QCFG_LINK_LINK {
            resp.link_speed.get()
        } else {
            0
        };
        self.force_link_speed = resp.force_link_speed.get();
        self.auto_link_speed = resp.auto_link_speed.get();
        self.support_speeds = resp.support_speeds.get();
        self.auto_link_speed_mask = resp.auto_link_speed_mask.get();
        self.preemphasis = resp.preemphasis.get();
        self.phy_ver = (resp.phy_maj, resp.phy_min, resp.phy_bld);
        self.phy_type = resp.phy_type;
        self.media_type = resp.media_type;
        self.transceiver = resp.xcvr_pkg_type;
        self.phy_addr = resp.eee_config_phy_addr & PORT_PHY_QCFG_PHY_ADDR_MASK;

        if !report_transition {
            self.link_up = false;
            return None;
        }
        self.link_up = self.phy_link_status == PORT_PHY_QCFG_LINK_LINK;
        (was_up != self.link_up).then(|| self.report())
    }

    /// Derives the requested settings from the current snapshot.
    pub(crate) fn probe(&mut self) {
        let mut req = RequestedLink::default();
        if self.auto_mode == PORT_PHY_QCFG_AUTO_MODE_NONE {
            req.link_speed = self.force_link_speed;
        } else {
            req.autoneg = true;
            req.link_speed = self.auto_link_speed;
            req.advertising = self.auto_link_speed_mask;
        }
        let auto_pause = Pause::from_bits(self.auto_pause);
        if auto_pause.rx || auto_pause.tx {
            req.flow_ctrl_autoneg = true;
            req.flow_ctrl = auto_pause;
        } else {
            req.flow_ctrl = Pause::from_bits(self.force_pause);
        }
        self.req = req;
    }

    /// Full duplex, as reported.
    pub fn full_duplex(&self) -> bool {
        self.duplex == PORT_PHY_QCFG_DUPLEX_FULL
    }

    /// The current link speed in bits per second, zero when down.
    pub fn speed_bps(&self) -> u64 {
        if self.link_up {
            link_speed_bps(self.link_speed)
        } else {
            0
        }
    }

    /// Builds a report of the current state.
    pub fn report(&self) -> LinkReport {
        LinkReport {
            up: self.link_up,
            full_duplex: self.full_duplex(),
            pause: Pause::from_bits(self.pause),
            speed_bps: self.speed_bps(),
        }
    }

    /// Builds the media status of the current state.
    pub fn media_status(&self) -> MediaStatus {
        MediaStatus {
            active: self.link_up,
            full_duplex: self.full_duplex(),
            speed_bps: self.speed_bps(),
            pause: Pause::from_bits(self.pause),
            autoneg: self.req.autoneg,
        }
    }
}
