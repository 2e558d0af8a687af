//! GDB Remote Serial Protocol server for post-mortem snapshots.
//!
//! Speaks the `$payload#checksum` framing over a single blocking TCP stream
//! and answers register and memory reads against a [`Snapshot`]. Connect
//! with: `xt-gdb firmware.out -ex "target remote :1234"`
//!
//! The target is a core dump, so there is nothing to resume: `Hc-1` is
//! answered with an error and everything outside the supported subset gets
//! the protocol's empty "unimplemented" response.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::snapshot::Snapshot;

/// Default GDB server port
pub const DEFAULT_PORT: u16 = 1234;

/// Compute the packet checksum: the sum of payload bytes modulo 256.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// One debugger session over one byte stream.
///
/// The session owns its snapshot; nothing is shared with other connections.
pub struct GdbSession<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    snapshot: Snapshot,
}

impl<R: BufRead, W: Write> GdbSession<R, W> {
    pub fn new(reader: R, writer: W, snapshot: Snapshot) -> Self {
        Self {
            reader,
            writer,
            snapshot,
        }
    }

    /// Drive the session until the peer closes the stream.
    ///
    /// Packets with a bad checksum are answered with `-` and dropped; the
    /// debugger retransmits on its own. Everything else is acknowledged
    /// with `+` and dispatched.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            if !self.expect_packet_start()? {
                break;
            }
            let payload = match self.read_payload()? {
                Some(payload) => payload,
                None => break,
            };
            let mut digits = [0u8; 2];
            match self.reader.read_exact(&mut digits) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            let want = checksum(&payload);
            let got = std::str::from_utf8(&digits)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok());
            if got != Some(want) {
                warn!(
                    "Bad checksum for {:?}; got: {:?} want: {:02x}",
                    String::from_utf8_lossy(&payload),
                    String::from_utf8_lossy(&digits),
                    want
                );
                self.writer.write_all(b"-")?;
                self.writer.flush()?;
                continue;
            }
            self.writer.write_all(b"+")?;
            self.writer.flush()?;

            let cmd = String::from_utf8_lossy(&payload).into_owned();
            let response = self.process_command(&cmd);
            self.send_packet(&response)?;
        }
        info!("GDB closed the connection");
        Ok(())
    }

    /// Skip to the next `$`. Stray bytes before it, including the `+`/`-`
    /// acks GDB sends for our responses, carry no information.
    fn expect_packet_start(&mut self) -> io::Result<bool> {
        let mut skipped = Vec::new();
        let n = self.reader.read_until(b'$', &mut skipped)?;
        Ok(n > 0 && skipped.last() == Some(&b'$'))
    }

    /// Read the packet payload up to (and not including) `#`.
    /// Returns `None` when the stream ends mid-packet.
    fn read_payload(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut payload = Vec::new();
        let n = self.reader.read_until(b'#', &mut payload)?;
        if n == 0 || payload.last() != Some(&b'#') {
            return Ok(None);
        }
        payload.pop();
        Ok(Some(payload))
    }

    fn send_packet(&mut self, payload: &str) -> io::Result<()> {
        let packet = format!("${}#{:02x}", payload, checksum(payload.as_bytes()));
        self.writer.write_all(packet.as_bytes())?;
        self.writer.flush()
    }

    /// Dispatch one command and produce the response payload.
    pub fn process_command(&mut self, cmd: &str) -> String {
        match cmd {
            // Why stopped: a core dump is always a trap
            "?" => "S09".to_string(),
            "g" => hex::encode(&self.snapshot.regs),
            "qC" => "1".to_string(),
            "qTStatus" | "qOffsets" => String::new(),
            "qSymbol::" => "OK".to_string(),
            "qAttached" => "1".to_string(),
            _ if cmd.starts_with('G') => self.write_registers(&cmd[1..]),
            _ if cmd.starts_with('m') => self.read_memory(&cmd[1..]),
            // Cannot continue, this is post mortem debugging
            _ if cmd.starts_with("Hc-1") => "E01".to_string(),
            // Thread selection: there is only ever one context
            _ if cmd.starts_with("Hg") => "OK".to_string(),
            _ if cmd.starts_with("qSupported") => String::new(),
            _ => {
                debug!("Ignoring unknown command '{}'", cmd);
                String::new()
            }
        }
    }

    /// `G<hex>`: overwrite the register blob wholesale.
    fn write_registers(&mut self, data: &str) -> String {
        match hex::decode(data) {
            Ok(bytes) => {
                self.snapshot.regs = bytes;
                "OK".to_string()
            }
            Err(_) => "E01".to_string(),
        }
    }

    /// `m<addr>,<len>`: read memory; unmapped addresses come back zero
    /// filled from the map, never as a protocol error.
    fn read_memory(&self, args: &str) -> String {
        let Some((addr, size)) = args.split_once(',') else {
            return "E01".to_string();
        };
        match (u64::from_str_radix(addr, 16), usize::from_str_radix(size, 16)) {
            (Ok(addr), Ok(size)) => hex::encode(self.snapshot.mem.read(addr, size)),
            _ => "E01".to_string(),
        }
    }
}

/// Accept debugger connections one at a time, each served a fresh snapshot.
///
/// The dump is reloaded from the log for every connection, so nothing
/// persists across sessions. A snapshot load failure terminates that
/// connection attempt and keeps the listener alive.
pub fn serve(config: &Config) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.port))?;
    info!("Waiting for gdb on {}", config.port);
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if let Err(e) = handle_connection(stream, config) {
                    warn!("Session ended: {}", e);
                }
            }
            Err(e) => warn!("Accept failed: {}", e),
        }
    }
    Ok(())
}

fn handle_connection(stream: TcpStream, config: &Config) -> Result<()> {
    if let Ok(peer) = stream.peer_addr() {
        info!("Accepted GDB connection from {}", peer);
    }
    let snapshot = Snapshot::load(config)?;
    let writer = stream.try_clone()?;
    GdbSession::new(BufReader::new(stream), writer, snapshot).run()?;
    Ok(())
}

#[cfg(test)]
mod tests_protocol;
