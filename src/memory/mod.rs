// src/memory/mod.rs

use log::warn;

/// A contiguous span of target memory backed by captured or loaded bytes.
#[derive(Debug)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub bytes: Vec<u8>,
}

impl MemoryRegion {
    /// Returns `None` when the region would wrap past the end of the
    /// 64-bit address space.
    pub fn new(start: u64, bytes: Vec<u8>) -> Option<Self> {
        let end = start.checked_add(bytes.len() as u64)?;
        Some(Self { start, end, bytes })
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Ordered collection of regions with insertion-order shadowing.
///
/// Lookup returns the first region (in insertion order) containing an
/// address, so earlier regions shadow later ones. Core dump regions are
/// pushed before firmware regions: a byte captured at crash time always
/// wins over the same address in the static image. Overlapping regions are
/// never merged.
#[derive(Debug, Default)]
pub struct MemoryMap {
    regions: Vec<MemoryRegion>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, region: MemoryRegion) {
        self.regions.push(region);
    }

    /// Read `size` bytes at `addr`.
    ///
    /// The request must fall entirely inside the first region containing
    /// `addr`; anything else (unmapped address, a request straddling two
    /// regions, a request running off a region's end) comes back zero
    /// filled. GDB probes speculative addresses while unwinding, so an
    /// unmapped read must degrade softly instead of failing the session.
    pub fn read(&self, addr: u64, size: usize) -> Vec<u8> {
        if let Some(region) = self.regions.iter().find(|r| r.contains(addr)) {
            let offset = (addr - region.start) as usize;
            if let Some(end) = offset.checked_add(size) {
                if let Some(slice) = region.bytes.get(offset..end) {
                    return slice.to_vec();
                }
            }
        }
        warn!("Unmapped addr {:#x}", addr);
        vec![0; size]
    }
}
