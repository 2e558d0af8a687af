//! Locating and decoding the core dump snippet inside a serial log.
//!
//! The crashed firmware prints one JSON record between literal delimiter
//! lines. A log can hold several dumps from repeated crashes; the most
//! recent complete pair wins.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info};
use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::memory::MemoryRegion;

pub const START_MARKER: &str = "--- BEGIN CORE DUMP ---";
pub const END_MARKER: &str = "---- END CORE DUMP ----";

/// Reserved record key carrying the register blob instead of a region.
const REGS_KEY: &str = "REGS";

#[derive(Deserialize)]
struct DumpEntry {
    addr: Option<u64>,
    data: String,
}

/// Decoded contents of one dump snippet.
#[derive(Debug)]
pub struct Dump {
    pub regs: Vec<u8>,
    pub regions: Vec<MemoryRegion>,
}

/// Extract the raw text of the last complete dump snippet in the log.
///
/// Searches backward: the last end marker first, then the last start
/// marker before it. The log is searched in memory as a whole, so a marker
/// can never be missed at a window boundary.
pub fn locate_snippet(log: &[u8]) -> Result<&[u8]> {
    let end = rfind(log, END_MARKER.as_bytes()).ok_or(CoreError::MarkerNotFound(END_MARKER))?;
    let start = rfind(&log[..end], START_MARKER.as_bytes())
        .ok_or(CoreError::MarkerNotFound(START_MARKER))?;
    Ok(&log[start + START_MARKER.len()..end])
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Decode a dump snippet into the register blob and captured regions.
///
/// Any structural problem (bad JSON, a region without an address, invalid
/// base64, missing register blob) is a hard failure; no partial snapshot
/// is ever served.
pub fn decode(snippet: &[u8]) -> Result<Dump> {
    // The device prints the record across several serial lines
    let json: Vec<u8> = snippet
        .iter()
        .copied()
        .filter(|b| *b != b'\n' && *b != b'\r')
        .collect();
    let record: BTreeMap<String, DumpEntry> = serde_json::from_slice(&json)?;

    let mut regs = None;
    let mut regions = Vec::new();
    for (name, entry) in record {
        let data = STANDARD
            .decode(entry.data.as_bytes())
            .map_err(|source| CoreError::Base64 {
                name: name.clone(),
                source,
            })?;
        if name == REGS_KEY {
            debug!("Decoded {} register bytes", data.len());
            regs = Some(data);
        } else {
            let addr = entry.addr.ok_or_else(|| CoreError::MissingAddress(name.clone()))?;
            info!("Mapping {} at {:#x}", name, addr);
            let region = MemoryRegion::new(addr, data)
                .ok_or_else(|| CoreError::RegionOverflow(name.clone()))?;
            regions.push(region);
        }
    }
    Ok(Dump {
        regs: regs.ok_or(CoreError::MissingRegisters)?,
        regions,
    })
}
