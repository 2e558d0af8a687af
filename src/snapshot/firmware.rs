//! Mapping firmware image files behind the dump regions.

use std::fs;
use std::path::Path;

use log::info;

use crate::config::FirmwareSpec;
use crate::error::{CoreError, Result};
use crate::memory::MemoryRegion;

/// Magic pair opening rboot / OTA-enabled ESP image files. Those images
/// carry a 16-byte relocation header, so the code sits 16 bytes past the
/// nominal load address.
const RELOC_MAGIC: [u8; 2] = [0xea, 0x04];
const RELOC_SHIFT: u64 = 0x10;

/// Read one firmware section into a region at its effective load address.
pub fn load(spec: &FirmwareSpec) -> Result<MemoryRegion> {
    let bytes = fs::read(&spec.path)?;
    let overflow = || CoreError::RegionOverflow(spec.path.display().to_string());
    let mut addr = match spec.addr {
        Some(addr) => addr,
        None => spec
            .base
            .checked_add(derive_offset(&spec.path)?)
            .ok_or_else(overflow)?,
    };
    if bytes.len() >= 2 && bytes[..2] == RELOC_MAGIC {
        addr = addr.checked_add(RELOC_SHIFT).ok_or_else(overflow)?;
    }
    info!("Mapping {} at {:#x}", spec.path.display(), addr);
    MemoryRegion::new(addr, bytes).ok_or_else(overflow)
}

/// Firmware sections are conventionally named after their flash offset,
/// e.g. `0x11000.bin` or `11000.bin`.
fn derive_offset(path: &Path) -> Result<u64> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CoreError::BadFirmwareName(path.to_path_buf()))?;
    u64::from_str_radix(stem.trim_start_matches("0x"), 16)
        .map_err(|_| CoreError::BadFirmwareName(path.to_path_buf()))
}
