// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The bnxt device: attach, queue management, bring-up and bring-down, and
//! the interrupt, filter and link entry points.

use crate::backing::DeviceBacking;
use crate::config::BnxtConfig;
use crate::error::Error;
use crate::filter::PromiscFlags;
use crate::filter::RxFilter;
use crate::hwrm::FirmwareInfo;
use crate::hwrm::HwrmChannel;
use crate::interrupt;
use crate::interrupt::FilterResult;
use crate::interrupt::InterruptRegistrar;
use crate::interrupt::InterruptRegistration;
use crate::interrupt::InterruptSource;
use crate::l2_driver::L2Driver;
use crate::l2_driver::RingAllocParams;
use crate::link::LinkInfo;
use crate::link::LinkStateNotify;
use crate::link::MediaStatus;
use crate::memory::DmaClient;
use crate::memory::MemoryBlock;
use crate::memory::PAGE_SIZE;
use crate::queues::DEFAULT_CMPL_RING_ID;
use crate::queues::DEFAULT_CMPL_RING_SIZE;
use crate::queues::QueueGeometry;
use crate::queues::QueueSets;
use crate::rings::CompletionRing;
use crate::rings::Ring;
use crate::rings::RingGroup;
use bnxt_defs::CmplBase;
use bnxt_defs::CtxHwStats;
use bnxt_defs::DOORBELL_BAR;
use bnxt_defs::ETHER_ADDR_LEN;
use bnxt_defs::ETHER_CRC_LEN;
use bnxt_defs::ETHER_HDR_LEN;
use bnxt_defs::HWRM_BAR;
use bnxt_defs::INVALID_HW_RING_ID;
use bnxt_defs::MAX_MTU;
use bnxt_defs::MIN_MTU;
use bnxt_defs::hwrm::RING_TYPE_RX;
use bnxt_defs::hwrm::RING_TYPE_TX;
use parking_lot::Mutex;
use std::sync::Arc;

/// Where the device is in its bring-up/bring-down cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// No firmware rings are bound.
    Cold,
    /// A function reset is in progress.
    Resetting,
    /// Rings, groups and VNICs are being bound.
    RingAllocating,
    /// Every ring is bound and the device passes traffic.
    Running,
    /// The device is being reset on the way to `Cold`.
    Stopping,
}

/// Statistics summed across queue sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Counter {
    /// Received packets.
    RxPackets,
    /// Received bytes.
    RxBytes,
    /// Received multicast packets.
    RxMulticast,
    /// Received packets discarded or dropped.
    RxDrops,
    /// Transmitted packets.
    TxPackets,
    /// Transmitted bytes.
    TxBytes,
    /// Transmitted multicast packets.
    TxMulticast,
    /// Transmit packets discarded or dropped.
    TxDrops,
}

/// State only touched with the command channel held.
pub(crate) struct Firmware<R> {
    pub hwrm: HwrmChannel<R>,
    pub link: LinkInfo,
    pub rx_filters: Vec<RxFilter>,
}

/// A bnxt network adapter.
pub struct BnxtDevice<T: DeviceBacking> {
    device: T,
    config: BnxtConfig,
    dma_client: Arc<dyn DmaClient>,
    doorbell: T::Registers,
    firmware: Mutex<Firmware<T::Registers>>,
    link_notify: Box<dyn LinkStateNotify>,
    state: DeviceState,
    default_cpr: Option<CompletionRing>,
    queues: Option<QueueSets>,
    irqs: Vec<Box<dyn InterruptRegistration>>,
    mtu: u32,
    max_frame_size: u32,
}

impl<T: DeviceBacking> BnxtDevice<T> {
    /// Attaches to the device: maps its BARs, opens the command channel,
    /// registers the driver with firmware and queries the function's
    /// capabilities.
    pub fn attach(
        mut device: T,
        config: BnxtConfig,
        link_notify: Box<dyn LinkStateNotify>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let dma_client = device.dma_client();
        let bar0 = device
            .map_bar(HWRM_BAR)
            .map_err(|source| Error::Bar {
                bar: HWRM_BAR,
                source,
            })?;
        let doorbell = device
            .map_bar(DOORBELL_BAR)
            .map_err(|source| Error::Bar {
                bar: DOORBELL_BAR,
                source,
            })?;

        let mut hwrm = HwrmChannel::new(bar0, dma_client.as_ref(), config.hwrm_timeout)?;
        hwrm.ver_get()?;
        hwrm.drv_rgtr()?;
        let default_cpr = match Self::attach_registered(&mut hwrm, dma_client.as_ref()) {
            Ok(cpr) => cpr,
            Err(err) => {
                if let Err(unrgtr_err) = hwrm.drv_unrgtr() {
                    tracing::warn!(
                        error = &unrgtr_err as &dyn std::error::Error,
                        "failed to unregister driver after attach failure"
                    );
                }
                return Err(err);
            }
        };

        tracing::info!(
            device = device.id(),
            mac = ?hwrm.info().mac_address,
            "attached"
        );

        let mtu = config.mtu;
        Ok(Self {
            device,
            config,
            dma_client,
            doorbell,
            firmware: Mutex::new(Firmware {
                hwrm,
                link: LinkInfo::default(),
                rx_filters: Vec::new(),
            }),
            link_notify,
            state: DeviceState::Cold,
            default_cpr: Some(default_cpr),
            queues: None,
            irqs: Vec::new(),
            mtu,
            max_frame_size: max_frame_size(mtu),
        })
    }

    fn attach_registered(
        hwrm: &mut HwrmChannel<T::Registers>,
        dma_client: &dyn DmaClient,
    ) -> Result<CompletionRing, Error> {
        hwrm.func_qcaps()?;
        hwrm.queue_qportcfg()?;
        hwrm.func_reset()?;
        let mem = dma_client
            .allocate_dma_buffer(PAGE_SIZE)
            .map_err(Error::oom("default completion ring"))?;
        Ok(CompletionRing::new(Ring::new(
            DEFAULT_CMPL_RING_ID,
            DEFAULT_CMPL_RING_SIZE,
            mem,
        )))
    }

    /// Completes attach once the host has set up its side: probes the PHY
    /// and computes the maximum frame size.
    pub fn attach_post(&mut self) -> Result<(), Error> {
        self.update_link(false)?;
        self.firmware.get_mut().link.probe();
        self.max_frame_size = max_frame_size(self.mtu);
        Ok(())
    }

    /// Resets the function and releases the interrupts and the default
    /// completion ring. The command channel stays open for
    /// [`Self::queues_free`].
    pub fn detach(&mut self) -> Result<(), Error> {
        let result = self.reset();
        self.state = DeviceState::Cold;
        interrupt::release_all(&mut self.irqs);
        self.default_cpr = None;
        tracing::info!(device = self.device.id(), "detached");
        result
    }

    /// Returns the device's current state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Returns the underlying device.
    pub fn device(&self) -> &T {
        &self.device
    }

    /// Returns the configuration the device was attached with.
    pub fn config(&self) -> &BnxtConfig {
        &self.config
    }

    /// Returns what firmware reported at attach time.
    pub fn firmware_info(&self) -> FirmwareInfo {
        self.firmware.lock().hwrm.info().clone()
    }

    /// Returns the last link snapshot.
    pub fn link_info(&self) -> LinkInfo {
        self.firmware.lock().link.clone()
    }

    /// Returns the receive filter state of receive queue set `qid`.
    pub fn rx_filter(&self, qid: u16) -> Option<RxFilter> {
        self.firmware.lock().rx_filters.get(usize::from(qid)).cloned()
    }

    /// Returns the queue sets, if allocated.
    pub fn queues(&self) -> Option<&QueueSets> {
        self.queues.as_ref()
    }

    /// Returns the default completion ring, if attached.
    pub fn default_cpr(&self) -> Option<&CompletionRing> {
        self.default_cpr.as_ref()
    }

    /// Returns the current MTU.
    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    /// Returns the largest frame the device receives.
    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }

    /// Allocates `ntx` transmit and `nrx` receive queue sets.
    pub fn queues_alloc(&mut self, ntx: u16, nrx: u16) -> Result<(), Error> {
        if self.queues.is_some() {
            return Err(Error::InvalidState("queues already allocated"));
        }
        if !self.firmware.get_mut().hwrm.is_open() {
            return Err(Error::ChannelClosed);
        }
        let queues = QueueSets::allocate(
            self.dma_client.as_ref(),
            QueueGeometry {
                ntx,
                nrx,
                tx_descriptors: self.config.tx_descriptors,
                rx_descriptors: self.config.rx_descriptors,
            },
        )?;
        self.firmware.get_mut().rx_filters = vec![RxFilter::default(); nrx.into()];
        self.queues = Some(queues);
        Ok(())
    }

    /// Frees the queue sets, unregisters the driver and closes the command
    /// channel. Firmware must no longer reference the rings.
    pub fn queues_free(&mut self) -> Result<(), Error> {
        if self.state != DeviceState::Cold {
            return Err(Error::InvalidState("queues in use"));
        }
        let fw = self.firmware.get_mut();
        fw.rx_filters.clear();
        self.queues = None;
        if !fw.hwrm.is_open() {
            return Ok(());
        }
        let result = fw.hwrm.drv_unrgtr();
        fw.hwrm.close();
        result
    }

    /// Issues a function reset, then clears every firmware handle whether
    /// or not the reset succeeded.
    fn reset(&mut self) -> Result<(), Error> {
        let result = self.firmware.get_mut().hwrm.func_reset();
        self.clear_ids();
        result
    }

    /// Resets every ring id, statistics context, ring group and VNIC handle
    /// to its sentinel.
    fn clear_ids(&mut self) {
        if let Some(cpr) = &mut self.default_cpr {
            cpr.clear();
            cpr.rewind();
        }
        if let Some(queues) = &mut self.queues {
            queues.clear_ids();
        }
    }

    /// Brings the device up: binds the default completion ring, then every
    /// receive queue set, then every transmit queue set.
    ///
    /// On failure the function is reset, every handle is cleared and the
    /// device is left `Cold`.
    pub fn init(&mut self) -> Result<(), Error> {
        if self.queues.is_none() {
            return Err(Error::InvalidState("queues not allocated"));
        }
        if self.default_cpr.is_none() {
            return Err(Error::InvalidState("device detached"));
        }

        self.state = DeviceState::Resetting;
        let result = self.reset().and_then(|()| {
            self.state = DeviceState::RingAllocating;
            self.bring_up()
        });

        match result {
            Ok(()) => {
                self.state = DeviceState::Running;
                tracing::info!(device = self.device.id(), "running");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    error = &err as &dyn std::error::Error,
                    state = ?self.state,
                    "bring-up failed"
                );
                if let Err(reset_err) = self.reset() {
                    tracing::warn!(
                        error = &reset_err as &dyn std::error::Error,
                        "reset after failed bring-up failed"
                    );
                }
                self.state = DeviceState::Cold;
                Err(err)
            }
        }
    }

    fn bring_up(&mut self) -> Result<(), Error> {
        let Self {
            firmware,
            default_cpr,
            queues,
            config,
            max_frame_size,
            ..
        } = self;
        let (Some(default_cpr), Some(queues)) = (default_cpr.as_mut(), queues.as_mut()) else {
            return Err(Error::InvalidState("queues not allocated"));
        };
        let fw = firmware.get_mut();
        let mac = fw.hwrm.info().mac_address;
        let mru = u16::try_from(*max_frame_size).map_err(|_| Error::InvalidMtu(*max_frame_size))?;
        let period = config.stats_update_period_ms;
        let mut l2 = L2Driver::new(&mut fw.hwrm);

        l2.cmpl_ring_alloc(default_cpr, true)?;

        for set in &mut queues.rx {
            l2.stat_ctx_alloc(&mut set.cpr, &set.stats, period)?;
            l2.cmpl_ring_alloc(&mut set.cpr, true)?;
            l2.ring_alloc(set.rx.ring_mut(), RingAllocParams::unlinked(RING_TYPE_RX, false))?;
            l2.ring_alloc(set.ag.ring_mut(), RingAllocParams::unlinked(RING_TYPE_RX, false))?;

            set.grp = RingGroup {
                grp_id: INVALID_HW_RING_ID,
                rx_ring_id: set.rx.ring().phys_id(),
                ag_ring_id: set.ag.ring().phys_id(),
                cp_ring_id: set.cpr.ring().phys_id(),
                stats_ctx: set.cpr.stats_ctx_handle(),
            };
            l2.ring_grp_alloc(&mut set.grp)?;

            set.vnic.ring_grp = set.grp.grp_id;
            set.vnic.mru = mru;
            l2.vnic_alloc(&mut set.vnic)?;
            l2.vnic_ctx_alloc(&mut set.vnic)?;
            l2.vnic_cfg(&set.vnic)?;

            if set.vnic.is_default {
                l2.l2_filter_alloc(&mut set.vnic, mac)?;
                let filter = fw.rx_filters.first().cloned().unwrap_or_default();
                l2.set_rx_mask(set.vnic.id, filter.mask, &set.mc_list, filter.mc_count)?;
            }
        }

        for set in &mut queues.tx {
            l2.stat_ctx_alloc(&mut set.cpr, &set.stats, period)?;
            l2.cmpl_ring_alloc(&mut set.cpr, false)?;
            let params = RingAllocParams {
                ring_type: RING_TYPE_TX,
                cmpl_ring_id: set.cpr.ring().phys_id(),
                stat_ctx_id: set.cpr.stats_ctx_id(),
                irq: false,
            };
            l2.ring_alloc(set.tx.ring_mut(), params)?;
        }

        Ok(())
    }

    /// Brings the device down. Every firmware handle is cleared even if the
    /// reset fails; memory is kept.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.state = DeviceState::Stopping;
        let result = self.reset();
        if let Err(err) = &result {
            tracing::warn!(error = err as &dyn std::error::Error, "reset on stop failed");
        }
        self.state = DeviceState::Cold;
        result
    }

    /// Registers the admin vector, one vector per receive queue set and one
    /// soft context per transmit queue set.
    pub fn msix_intr_assign(&mut self, registrar: &mut dyn InterruptRegistrar) -> Result<(), Error> {
        if !self.irqs.is_empty() {
            return Err(Error::InvalidState("interrupts already assigned"));
        }
        let (Some(default_cpr), Some(queues)) = (&self.default_cpr, &self.queues) else {
            return Err(Error::InvalidState("queues not allocated"));
        };
        let rx_ids: Vec<u16> = queues.rx.iter().map(|s| s.cpr.ring().id()).collect();
        let requests = interrupt::vector_requests(
            default_cpr.ring().id(),
            &rx_ids,
            queues.tx.len() as u16,
        );
        self.irqs = interrupt::register_all(registrar, &requests)?;
        Ok(())
    }

    /// Arms every completion ring.
    pub fn intr_enable(&self) {
        for cpr in self.completion_rings() {
            cpr.arm(&self.doorbell);
        }
    }

    /// Disarms every completion ring.
    pub fn intr_disable(&self) {
        for cpr in self.completion_rings() {
            cpr.disable(&self.doorbell);
        }
    }

    fn completion_rings(&self) -> impl Iterator<Item = &CompletionRing> {
        let queues = self.queues.iter();
        self.default_cpr
            .iter()
            .chain(queues.clone().flat_map(|q| q.tx.iter().map(|s| &s.cpr)))
            .chain(queues.flat_map(|q| q.rx.iter().map(|s| &s.cpr)))
    }

    fn rx_cpr(&self, qid: u16) -> Result<&CompletionRing, Error> {
        let queues = self.queues.as_ref().ok_or(Error::InvalidState("queues not allocated"))?;
        queues
            .rx
            .get(usize::from(qid))
            .map(|s| &s.cpr)
            .ok_or(Error::InvalidConfig("no such receive queue"))
    }

    fn tx_cpr(&self, qid: u16) -> Result<&CompletionRing, Error> {
        let queues = self.queues.as_ref().ok_or(Error::InvalidState("queues not allocated"))?;
        queues
            .tx
            .get(usize::from(qid))
            .map(|s| &s.cpr)
            .ok_or(Error::InvalidConfig("no such transmit queue"))
    }

    /// Re-arms receive queue set `qid`'s completion ring.
    pub fn queue_intr_enable(&self, qid: u16) -> Result<(), Error> {
        self.rx_cpr(qid)?.arm(&self.doorbell);
        Ok(())
    }

    /// Re-arms transmit queue set `qid`'s completion ring.
    pub fn tx_queue_intr_enable(&self, qid: u16) -> Result<(), Error> {
        self.tx_cpr(qid)?.arm(&self.doorbell);
        Ok(())
    }

    /// Publishes transmit descriptors up to `pidx` on transmit queue set
    /// `qid`.
    pub fn txd_flush(&self, qid: u16, pidx: u32) -> Result<(), Error> {
        let queues = self.queues.as_ref().ok_or(Error::InvalidState("queues not allocated"))?;
        let set = queues
            .tx
            .get(usize::from(qid))
            .ok_or(Error::InvalidConfig("no such transmit queue"))?;
        set.tx.ring_doorbell(&self.doorbell, pidx);
        Ok(())
    }

    /// Publishes receive buffers up to `pidx` on receive queue set `qid`,
    /// on the aggregation ring if `aggregation` is set.
    pub fn rxd_flush(&self, qid: u16, aggregation: bool, pidx: u32) -> Result<(), Error> {
        let queues = self.queues.as_ref().ok_or(Error::InvalidState("queues not allocated"))?;
        let set = queues
            .rx
            .get(usize::from(qid))
            .ok_or(Error::InvalidConfig("no such receive queue"))?;
        let ring = if aggregation { &set.ag } else { &set.rx };
        ring.ring_doorbell(&self.doorbell, pidx);
        Ok(())
    }

    /// The interrupt filter. Receive rings are masked before anything else
    /// and processed by the deferred handler, which re-arms them.
    pub fn handle_interrupt(&self, source: InterruptSource) -> FilterResult {
        match source {
            // Admin events are drained by `update_admin_status`.
            InterruptSource::Admin => FilterResult::Handled,
            InterruptSource::Rx(qid) => match self.rx_cpr(qid) {
                Ok(cpr) => {
                    cpr.disable(&self.doorbell);
                    FilterResult::ScheduleThread
                }
                Err(err) => {
                    tracing::warn!(
                        qid,
                        error = &err as &dyn std::error::Error,
                        "interrupt for unknown queue"
                    );
                    FilterResult::Handled
                }
            },
        }
    }

    /// Consumes up to `budget` entries from receive queue set `qid`'s
    /// completion ring, returning how many were consumed. The caller re-arms
    /// the ring with [`Self::queue_intr_enable`] once it is drained.
    pub fn process_rx_completions(
        &self,
        qid: u16,
        budget: usize,
        f: impl FnMut(&CmplBase),
    ) -> Result<usize, Error> {
        Ok(drain(self.rx_cpr(qid)?, budget, f))
    }

    /// Consumes up to `budget` entries from transmit queue set `qid`'s
    /// completion ring.
    pub fn process_tx_completions(
        &self,
        qid: u16,
        budget: usize,
        f: impl FnMut(&CmplBase),
    ) -> Result<usize, Error> {
        Ok(drain(self.tx_cpr(qid)?, budget, f))
    }

    /// Drains the default completion ring, refreshing the link on link
    /// status events, then re-arms it.
    pub fn update_admin_status(&self) -> Result<(), Error> {
        let cpr = self
            .default_cpr
            .as_ref()
            .ok_or(Error::InvalidState("device detached"))?;
        let mut link_events = 0;
        drain(cpr, usize::MAX, |entry| {
            if entry.is_link_change() {
                link_events += 1;
            } else {
                tracing::trace!(kind = entry.kind(), "ignoring admin completion");
            }
        });
        let result = if link_events > 0 {
            self.update_link(true)
        } else {
            Ok(())
        };
        cpr.arm(&self.doorbell);
        result
    }

    /// Queries the PHY and refreshes the link snapshot.
    ///
    /// With `report_transition` set, an up/down change is reported to the
    /// link-state collaborator. Otherwise the link is recorded as down.
    pub fn update_link(&self, report_transition: bool) -> Result<(), Error> {
        let mut fw = self.firmware.lock();
        let Firmware { hwrm, link, .. } = &mut *fw;
        let resp = L2Driver::new(hwrm).port_phy_qcfg()?;
        if let Some(report) = link.update(&resp, report_transition) {
            if report.up {
                tracing::info!(
                    speed_bps = report.speed_bps,
                    full_duplex = report.full_duplex,
                    pause = ?report.pause,
                    "link up"
                );
            } else {
                tracing::info!("link down");
            }
            self.link_notify.link_state_changed(&report);
        }
        Ok(())
    }

    /// Refreshes the link and reports the media state.
    pub fn media_status(&self) -> Result<MediaStatus, Error> {
        self.update_link(true)?;
        Ok(self.firmware.lock().link.media_status())
    }

    /// Replaces the default VNIC's multicast list.
    ///
    /// The new mask and list are pushed to firmware when the default VNIC is
    /// bound. A firmware failure is returned but the local state keeps the
    /// new values.
    pub fn multi_set(&self, addrs: &[[u8; ETHER_ADDR_LEN]]) -> Result<(), Error> {
        self.update_rx_filter(|filter, mc_list| filter.set_multicast(mc_list, addrs))
    }

    /// Sets promiscuous and all-multicast reception on the default VNIC.
    pub fn promisc_set(&self, flags: PromiscFlags) -> Result<(), Error> {
        self.update_rx_filter(|filter, _| filter.set_promisc(flags))
    }

    fn update_rx_filter(
        &self,
        f: impl FnOnce(&mut RxFilter, &MemoryBlock),
    ) -> Result<(), Error> {
        let queues = self.queues.as_ref().ok_or(Error::InvalidState("queues not allocated"))?;
        let set = queues
            .rx
            .first()
            .ok_or(Error::InvalidState("no receive queues"))?;

        let mut fw = self.firmware.lock();
        let Firmware {
            hwrm, rx_filters, ..
        } = &mut *fw;
        let filter = rx_filters
            .first_mut()
            .ok_or(Error::InvalidState("no receive filter"))?;
        f(filter, &set.mc_list);

        if !set.vnic.is_bound() {
            tracing::debug!("default vnic not bound, rx mask will be pushed at init");
            return Ok(());
        }
        L2Driver::new(hwrm)
            .set_rx_mask(set.vnic.id, filter.mask, &set.mc_list, filter.mc_count)
            .inspect_err(|err| {
                tracing::error!(
                    error = err as &dyn std::error::Error,
                    "failed to set rx mask"
                );
            })
    }

    /// Changes the MTU. When running, every VNIC's MRU is updated.
    pub fn mtu_set(&mut self, mtu: u32) -> Result<(), Error> {
        if !(MIN_MTU..=MAX_MTU).contains(&mtu) {
            return Err(Error::InvalidMtu(mtu));
        }
        self.mtu = mtu;
        self.max_frame_size = max_frame_size(mtu);
        if self.state != DeviceState::Running {
            return Ok(());
        }
        let mru = u16::try_from(self.max_frame_size).map_err(|_| Error::InvalidMtu(mtu))?;
        let Some(queues) = &mut self.queues else {
            return Ok(());
        };
        let mut l2 = L2Driver::new(&mut self.firmware.get_mut().hwrm);
        for set in &mut queues.rx {
            set.vnic.mru = mru;
            l2.vnic_cfg(&set.vnic)?;
        }
        Ok(())
    }

    /// Sums a statistic across queue sets. Hardware counters wrap, and so
    /// does the sum.
    pub fn get_counter(&self, counter: Counter) -> u64 {
        let Some(queues) = &self.queues else {
            return 0;
        };
        let rx = |f: fn(&CtxHwStats) -> [u64; 3]| {
            wrapping_sum(queues.rx.iter().flat_map(|s| f(&s.stats())))
        };
        let tx = |f: fn(&CtxHwStats) -> [u64; 3]| {
            wrapping_sum(queues.tx.iter().flat_map(|s| f(&s.stats())))
        };
        match counter {
            Counter::RxPackets => rx(|s| {
                [
                    s.rx_ucast_pkts.get(),
                    s.rx_mcast_pkts.get(),
                    s.rx_bcast_pkts.get(),
                ]
            }),
            Counter::RxBytes => rx(|s| {
                [
                    s.rx_ucast_bytes.get(),
                    s.rx_mcast_bytes.get(),
                    s.rx_bcast_bytes.get(),
                ]
            }),
            Counter::RxMulticast => rx(|s| [s.rx_mcast_pkts.get(), 0, 0]),
            Counter::RxDrops => rx(|s| [s.rx_discard_pkts.get(), s.rx_drop_pkts.get(), 0]),
            Counter::TxPackets => tx(|s| {
                [
                    s.tx_ucast_pkts.get(),
                    s.tx_mcast_pkts.get(),
                    s.tx_bcast_pkts.get(),
                ]
            }),
            Counter::TxBytes => tx(|s| {
                [
                    s.tx_ucast_bytes.get(),
                    s.tx_mcast_bytes.get(),
                    s.tx_bcast_bytes.get(),
                ]
            }),
            Counter::TxMulticast => tx(|s| [s.tx_mcast_pkts.get(), 0, 0]),
            Counter::TxDrops => tx(|s| [s.tx_discard_pkts.get(), s.tx_drop_pkts.get(), 0]),
        }
    }
}

fn wrapping_sum(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::wrapping_add)
}

fn max_frame_size(mtu: u32) -> u32 {
    mtu + ETHER_HDR_LEN + ETHER_CRC_LEN
}

fn drain(cpr: &CompletionRing, budget: usize, mut f: impl FnMut(&CmplBase)) -> usize {
    let mut n = 0;
    while n < budget {
        let Some(entry) = cpr.pop() else {
            break;
        };
        f(&entry);
        n += 1;
    }
    n
}
