//! Coreserve - serve an ESP8266 crash dump from a serial log to GDB
//!
//! Reconstructs a crashed device's memory and register state from the core
//! dump snippet a panicking firmware prints to its serial console, merges
//! it with the firmware images that were flashed, and exposes the result
//! over the GDB remote serial protocol as a halted post-mortem target.

pub mod config;
pub mod error;
pub mod gdb;
pub mod memory;
pub mod snapshot;

pub use config::Config;
pub use error::CoreError;
pub use gdb::GdbSession;
pub use memory::{MemoryMap, MemoryRegion};
pub use snapshot::Snapshot;
