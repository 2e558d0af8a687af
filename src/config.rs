//! Command line arguments and the per-run configuration value.
//!
//! The configuration is built once in `main` and passed explicitly to
//! snapshot construction; no component reads global state.

use std::path::PathBuf;

use clap::Parser;

/// ESP8266 iram section base, used when deriving a load address from a
/// firmware file's name.
pub const IRAM_BASE: u64 = 0x4010_0000;

/// ESP8266 irom (flash-mapped) section base.
pub const IROM_BASE: u64 = 0x4020_0000;

/// Mask ROM base, also the default explicit address for `--rom`.
pub const ROM_BASE: u64 = 0x4000_0000;

/// Serve an ESP8266 core dump from a serial log to GDB.
#[derive(Parser, Debug)]
#[command(name = "coreserve")]
#[command(about = "Serve an ESP core dump snippet from a serial log to GDB")]
#[command(version)]
pub struct Args {
    /// Listening port
    #[arg(long, default_value_t = crate::gdb::DEFAULT_PORT)]
    pub port: u16,

    /// iram firmware section
    #[arg(long)]
    pub iram: PathBuf,

    /// iram load address (hex); derived from the filename when absent
    #[arg(long, value_parser = parse_hex)]
    pub iram_addr: Option<u64>,

    /// irom firmware section
    #[arg(long)]
    pub irom: PathBuf,

    /// irom load address (hex); derived from the filename when absent
    #[arg(long, value_parser = parse_hex)]
    pub irom_addr: Option<u64>,

    /// rom section
    #[arg(long)]
    pub rom: Option<PathBuf>,

    /// rom load address (hex)
    #[arg(long, value_parser = parse_hex, default_value = "40000000")]
    pub rom_addr: u64,

    /// serial log containing the core dump snippet
    pub log: PathBuf,
}

fn parse_hex(s: &str) -> Result<u64, std::num::ParseIntError> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
}

/// One firmware image to map behind the dump regions.
#[derive(Debug, Clone)]
pub struct FirmwareSpec {
    pub path: PathBuf,
    /// Explicit load address; when `None` the address is derived from the
    /// filename stem relative to `base`.
    pub addr: Option<u64>,
    pub base: u64,
}

/// Everything snapshot construction needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log: PathBuf,
    pub firmware: Vec<FirmwareSpec>,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut firmware = vec![
            FirmwareSpec {
                path: args.iram,
                addr: args.iram_addr,
                base: IRAM_BASE,
            },
            FirmwareSpec {
                path: args.irom,
                addr: args.irom_addr,
                base: IROM_BASE,
            },
        ];
        if let Some(rom) = args.rom {
            firmware.push(FirmwareSpec {
                path: rom,
                addr: Some(args.rom_addr),
                base: ROM_BASE,
            });
        }
        Config {
            port: args.port,
            log: args.log,
            firmware,
        }
    }
}
