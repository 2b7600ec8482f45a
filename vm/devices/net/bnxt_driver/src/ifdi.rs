// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The device control surface a network stack drives.

use crate::backing::DeviceBacking;
use crate::bnxt::BnxtDevice;
use crate::bnxt::Counter;
use crate::error::Error;
use crate::filter::PromiscFlags;
use crate::interrupt::InterruptRegistrar;
use crate::link::MediaStatus;
use bnxt_defs::ETHER_ADDR_LEN;

/// Operations the host's network stack invokes on an attached adapter.
pub trait IfDriver {
    /// Allocates `ntx` transmit and `nrx` receive queue sets.
    fn tx_rx_queues_alloc(&mut self, ntx: u16, nrx: u16) -> Result<(), Error>;
    /// Frees the queue sets and closes the command channel.
    fn queues_free(&mut self) -> Result<(), Error>;
    /// Completes attach.
    fn attach_post(&mut self) -> Result<(), Error>;
    /// Resets the function and releases interrupts.
    fn detach(&mut self) -> Result<(), Error>;
    /// Brings the device up.
    fn init(&mut self) -> Result<(), Error>;
    /// Brings the device down.
    fn stop(&mut self) -> Result<(), Error>;
    /// Arms every completion ring.
    fn intr_enable(&self);
    /// Disarms every completion ring.
    fn intr_disable(&self);
    /// Arms one receive queue set's completion ring.
    fn rx_queue_intr_enable(&self, qid: u16) -> Result<(), Error>;
    /// Arms one transmit queue set's completion ring.
    fn tx_queue_intr_enable(&self, qid: u16) -> Result<(), Error>;
    /// Registers interrupt vectors.
    fn msix_intr_assign(&mut self, registrar: &mut dyn InterruptRegistrar) -> Result<(), Error>;
    /// Replaces the multicast list.
    fn multi_set(&self, addrs: &[[u8; ETHER_ADDR_LEN]]) -> Result<(), Error>;
    /// Sets promiscuous reception.
    fn promisc_set(&self, flags: PromiscFlags) -> Result<(), Error>;
    /// Changes the MTU.
    fn mtu_set(&mut self, mtu: u32) -> Result<(), Error>;
    /// Queries the link.
    fn media_status(&self) -> Result<MediaStatus, Error>;
    /// Reads a statistic.
    fn get_counter(&self, counter: Counter) -> u64;
    /// Services the administrative completion ring.
    fn update_admin_status(&self) -> Result<(), Error>;
}

impl<T: DeviceBacking> IfDriver for BnxtDevice<T> {
    fn tx_rx_queues_alloc(&mut self, ntx: u16, nrx: u16) -> Result<(), Error> {
        self.queues_alloc(ntx, nrx)
    }

    fn queues_free(&mut self) -> Result<(), Error> {
        BnxtDevice::queues_free(self)
    }

    fn attach_post(&mut self) -> Result<(), Error> {
        BnxtDevice::attach_post(self)
    }

    fn detach(&mut self) -> Result<(), Error> {
        BnxtDevice::detach(self)
    }

    fn init(&mut self) -> Result<(), Error> {
        BnxtDevice::init(self)
    }

    fn stop(&mut self) -> Result<(), Error> {
        BnxtDevice::stop(self)
    }

    fn intr_enable(&self) {
        BnxtDevice::intr_enable(self)
    }

    fn intr_disable(&self) {
        BnxtDevice::intr_disable(self)
    }

    fn rx_queue_intr_enable(&self, qid: u16) -> Result<(), Error> {
        self.queue_intr_enable(qid)
    }

    fn tx_queue_intr_enable(&self, qid: u16) -> Result<(), Error> {
        BnxtDevice::tx_queue_intr_enable(self, qid)
    }

    fn msix_intr_assign(&mut self, registrar: &mut dyn InterruptRegistrar) -> Result<(), Error> {
        BnxtDevice::msix_intr_assign(self, registrar)
    }

    fn multi_set(&self, addrs: &[[u8; ETHER_ADDR_LEN]]) -> Result<(), Error> {
        BnxtDevice::multi_set(self, addrs)
    }

    fn promisc_set(&self, flags: PromiscFlags) -> Result<(), Error> {
        BnxtDevice::promisc_set(self, flags)
    }

    fn mtu_set(&mut self, mtu: u32) -> Result<(), Error> {
        BnxtDevice::mtu_set(self, mtu)
    }

    fn media_status(&self) -> Result<MediaStatus, Error> {
        BnxtDevice::media_status(self)
    }

    fn get_counter(&self, counter: Counter) -> u64 {
        BnxtDevice::get_counter(self, counter)
    }

    fn update_admin_status(&self) -> Result<(), Error> {
        BnxtDevice::update_admin_status(self)
    }
}
