//! Post-mortem target state assembled from a serial log and firmware images.

use std::fs;

use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::memory::MemoryMap;

pub mod dump;
pub mod firmware;


/// One reconstructed crash: an immutable memory map plus the register blob.
///
/// Dump regions are mapped before firmware regions, so bytes captured at
/// crash time shadow the static images. The register blob is the only
/// mutable state; a `G` packet replaces it wholesale. A snapshot lives for
/// exactly one debugger connection.
pub struct Snapshot {
    pub mem: MemoryMap,
    pub regs: Vec<u8>,
}

impl Snapshot {
    /// Build a snapshot from the configured log and firmware set.
    pub fn load(config: &Config) -> Result<Self> {
        let log = fs::read(&config.log)?;
        let decoded = dump::decode(dump::locate_snippet(&log)?)?;

        let mut mem = MemoryMap::new();
        for region in decoded.regions {
            mem.push(region);
        }
        for spec in &config.firmware {
            mem.push(firmware::load(spec)?);
        }
        info!(
            "Loaded core dump from last snippet in {}",
            config.log.display()
        );
        Ok(Self {
            mem,
            regs: decoded.regs,
        })
    }
}
