// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Traits for the host services the driver consumes: BAR access and DMA
//! allocation.

use crate::memory::DmaClient;
use std::sync::Arc;

/// Access to a mapped device register region.
pub trait DeviceRegisterIo: Send + Sync {
    /// Returns the length of the register space.
    fn len(&self) -> usize;
    /// Reads a `u32` register.
    fn read_u32(&self, offset: usize) -> u32;
    /// Reads a `u64` register.
    fn read_u64(&self, offset: usize) -> u64;
    /// Writes a `u32` register.
    fn write_u32(&self, offset: usize, data: u32);
    /// Writes a `u64` register.
    fn write_u64(&self, offset: usize, data: u64);
}

/// A PCI function the driver is attached to.
pub trait DeviceBacking: 'static + Send {
    /// An object for accessing device registers.
    type Registers: 'static + DeviceRegisterIo;

    /// Returns a device ID for diagnostics.
    fn id(&self) -> &str;

    /// Maps a BAR.
    fn map_bar(&mut self, n: u8) -> anyhow::Result<Self::Registers>;

    /// Returns the DMA allocator for the device.
    fn dma_client(&self) -> Arc<dyn DmaClient>;
}
