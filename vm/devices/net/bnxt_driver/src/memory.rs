// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Memory shared between the driver and the device.

use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

pub use bnxt_defs::PAGE_SIZE;
pub use bnxt_defs::PAGE_SIZE64;

/// A mapped buffer that can be accessed by the host and by the device.
pub trait MappedDmaTarget: Send + Sync {
    /// The buffer contents. Device writes may race with host accesses, so
    /// the memory is only reachable through atomics.
    fn as_slice(&self) -> &[AtomicU8];

    /// The device-visible address of the first byte of the buffer.
    fn phys_addr(&self) -> u64;
}

/// Byte-wise atomic copies between a shared slice and private memory.
pub trait AtomicSliceOps {
    /// Copies the slice into `data`, which must be the same length.
    fn atomic_read(&self, data: &mut [u8]);
    /// Copies `data` into the slice, which must be the same length.
    fn atomic_write(&self, data: &[u8]);
    /// Sets every byte of the slice to `value`.
    fn atomic_fill(&self, value: u8);
}

impl AtomicSliceOps for [AtomicU8] {
    fn atomic_read(&self, data: &mut [u8]) {
        assert_eq!(self.len(), data.len());
        for (d, s) in data.iter_mut().zip(self) {
            *d = s.load(Ordering::Relaxed);
        }
    }

    fn atomic_write(&self, data: &[u8]) {
        assert_eq!(self.len(), data.len());
        for (d, s) in self.iter().zip(data) {
            d.store(*s, Ordering::Relaxed);
        }
    }

    fn atomic_fill(&self, value: u8) {
        for d in self {
            d.store(value, Ordering::Relaxed);
        }
    }
}

/// A DMA buffer, or a view of part of one.
///
/// Clones share the same backing memory, which is released when the last
/// clone is dropped.
#[derive(Clone)]
pub struct MemoryBlock {
    mem: Arc<dyn MappedDmaTarget>,
    offset: usize,
    len: usize,
}

impl MemoryBlock {
    /// Creates a new memory block backed by `mem`.
    pub fn new<T: 'static + MappedDmaTarget>(mem: T) -> Self {
        let len = mem.as_slice().len();
        Self {
            mem: Arc::new(mem),
            offset: 0,
            len,
        }
    }

    /// Returns a view of a subset of the buffer.
    pub fn subblock(&self, offset: usize, len: usize) -> Self {
        assert!(self.len >= offset && self.len - offset >= len);
        Self {
            mem: self.mem.clone(),
            offset: self.offset + offset,
            len,
        }
    }

    /// Gets the length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gets the device-visible address of the buffer.
    pub fn phys_addr(&self) -> u64 {
        self.mem.phys_addr() + self.offset as u64
    }

    /// Gets the buffer as an atomic slice.
    pub fn as_slice(&self) -> &[AtomicU8] {
        &self.mem.as_slice()[self.offset..][..self.len]
    }

    /// Reads from the buffer into `data`.
    pub fn read_at(&self, offset: usize, data: &mut [u8]) {
        self.as_slice()[offset..][..data.len()].atomic_read(data);
    }

    /// Reads an object from the buffer at `offset`.
    pub fn read_obj<T: FromBytes + IntoBytes + KnownLayout>(&self, offset: usize) -> T {
        let mut obj = T::new_zeroed();
        self.read_at(offset, obj.as_mut_bytes());
        obj
    }

    /// Writes into the buffer from `data`.
    pub fn write_at(&self, offset: usize, data: &[u8]) {
        self.as_slice()[offset..][..data.len()].atomic_write(data);
    }

    /// Writes an object into the buffer at `offset`.
    pub fn write_obj<T: IntoBytes + Immutable>(&self, offset: usize, data: &T) {
        self.write_at(offset, data.as_bytes());
    }

    /// Zeroes the whole buffer.
    pub fn zero(&self) {
        self.as_slice().atomic_fill(0);
    }
}

impl std::fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("phys_addr", &format_args!("{:#x}", self.phys_addr()))
            .field("len", &self.len)
            .finish()
    }
}

/// Allocates DMA buffers for the driver.
pub trait DmaClient: Send + Sync {
    /// Allocates a zeroed, page-aligned DMA buffer of `len` bytes.
    fn allocate_dma_buffer(&self, len: usize) -> anyhow::Result<MemoryBlock>;
}
