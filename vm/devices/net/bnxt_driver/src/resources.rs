// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::Error;
use crate::memory::DmaClient;
use crate::memory::MemoryBlock;

/// An ordered list of DMA buffers owned by a set of queues.
///
/// Buffers are released in the reverse of the order they were allocated in,
/// either explicitly by [`ResourceArena::release`] or when the arena is
/// dropped. Views handed out by [`ResourceArena::allocate`] keep their
/// memory alive, so they must be dropped before the arena for the release
/// order to hold.
#[derive(Default)]
pub(crate) struct ResourceArena {
    blocks: Vec<(&'static str, MemoryBlock)>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Allocates a buffer of `len` bytes and records it in the arena.
    pub fn allocate(
        &mut self,
        dma_client: &dyn DmaClient,
        what: &'static str,
        len: usize,
    ) -> Result<MemoryBlock, Error> {
        let mem = dma_client
            .allocate_dma_buffer(len)
            .map_err(Error::oom(what))?;
        tracing::trace!(what, len, phys = mem.phys_addr(), "allocated dma buffer");
        self.blocks.push((what, mem.clone()));
        Ok(mem)
    }

    /// Releases every buffer, newest first.
    pub fn release(&mut self) {
        while let Some((what, mem)) = self.blocks.pop() {
            tracing::trace!(what, phys = mem.phys_addr(), "releasing dma buffer");
            drop(mem);
        }
    }
}

impl Drop for ResourceArena {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulated::TestDmaClient;

    #[test]
    fn releases_in_reverse() {
        let dma = TestDmaClient::new();
        let mut arena = ResourceArena::new();
        let a = arena.allocate(&dma, "a", 4096).unwrap().phys_addr();
        let b = arena.allocate(&dma, "b", 8192).unwrap().phys_addr();
        let c = arena.allocate(&dma, "c", 4096).unwrap().phys_addr();
        assert_eq!(arena.len(), 3);
        assert_eq!(dma.live_buffers(), 3);
        drop(arena);
        assert_eq!(dma.live_buffers(), 0);
        assert_eq!(dma.free_log(), vec![c, b, a]);
    }

    #[test]
    fn failed_allocation_is_not_recorded() {
        let dma = TestDmaClient::new();
        dma.fail_after(1);
        let mut arena = ResourceArena::new();
        arena.allocate(&dma, "first", 4096).unwrap();
        let err = arena.allocate(&dma, "second", 4096).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { what: "second", .. }));
        assert_eq!(arena.len(), 1);
        arena.release();
        assert_eq!(arena.len(), 0);
        assert_eq!(dma.live_buffers(), 0);
    }
}
