//! Delivery of a finished command stream to the printer.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};

use crate::{error::TransportError, process::CommandRunner};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9100;

/// Where a print job is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterTarget {
    /// Raw socket, usually port 9100 of a print server.
    Network { host: String, port: u16 },
    /// CUPS queue.
    Spooler { device_id: String },
    /// Windows printer fed through the raw print helper.
    RawHelper { device_id: String },
    /// Character device such as `/dev/usb/lp0`.
    Device { path: PathBuf },
}

impl PrinterTarget {
    pub fn network(host: Option<String>, port: Option<u16>) -> Self {
        PrinterTarget::Network {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Channel parameters that do not depend on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Bound for connecting to a network printer and for each write to it.
    ///
    /// Host name resolution runs before the connect and is not covered, a
    /// slow resolver can delay the call beyond this bound. Configure an IP
    /// address when that matters.
    pub network_timeout: Duration,
    /// Spooler submission command, `lp` on CUPS systems.
    pub spooler_program: String,
    /// Program invoked as `<helper> <device id> <file>` for raw Windows printing.
    pub raw_print_helper: PathBuf,
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings {
            network_timeout: Duration::from_secs(30),
            spooler_program: "lp".to_string(),
            raw_print_helper: PathBuf::from("RawPrint.exe"),
        }
    }
}

/// Write `buf` to `target`. Either the whole buffer is delivered or an
/// error is returned.
pub fn deliver<R: CommandRunner>(
    target: &PrinterTarget,
    buf: &[u8],
    settings: &TransportSettings,
    runner: &R,
) -> Result<(), TransportError> {
    info!("sending {} bytes to {:?}", buf.len(), target);
    match target {
        PrinterTarget::Network { host, port } => {
            send_network(host, *port, buf, settings.network_timeout)
        }
        PrinterTarget::Spooler { device_id } => {
            runner.run(
                &settings.spooler_program,
                &["-d", device_id.as_str(), "-o", "raw"],
                Some(buf),
            )?;
            Ok(())
        }
        PrinterTarget::RawHelper { device_id } => {
            send_raw_helper(device_id, buf, &settings.raw_print_helper, runner)
        }
        PrinterTarget::Device { path } => {
            let write = || -> io::Result<()> {
                let mut device = OpenOptions::new().write(true).open(path)?;
                device.write_all(buf)?;
                device.flush()
            };
            write().map_err(|source| TransportError::Device {
                path: path.clone(),
                source,
            })
        }
    }
}

fn send_network(host: &str, port: u16, buf: &[u8], timeout: Duration) -> Result<(), TransportError> {
    let addr = format!("{}:{}", host, port);
    let connect_err = |source: io::Error| {
        if is_timeout(&source) {
            TransportError::Timeout {
                addr: addr.clone(),
                timeout,
            }
        } else {
            TransportError::Connect {
                addr: addr.clone(),
                source,
            }
        }
    };

    let candidates: Vec<SocketAddr> = (host, port).to_socket_addrs().map_err(connect_err)?.collect();
    let mut last_err = io::Error::new(io::ErrorKind::NotFound, "host resolved to no address");
    let mut stream = None;
    for candidate in candidates {
        debug!("connecting to {}", candidate);
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(err) => last_err = err,
        }
    }
    let mut stream = stream.ok_or_else(|| connect_err(last_err))?;

    let write = |stream: &mut TcpStream| -> io::Result<()> {
        stream.set_write_timeout(Some(timeout))?;
        stream.write_all(buf)?;
        stream.flush()
    };
    write(&mut stream).map_err(|source| {
        if is_timeout(&source) {
            TransportError::Timeout {
                addr: addr.clone(),
                timeout,
            }
        } else {
            TransportError::Write {
                addr: addr.clone(),
                source,
            }
        }
    })?;

    if let Err(err) = stream.shutdown(Shutdown::Both) {
        debug!("closing {}: {}", addr, err);
    }
    Ok(())
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn send_raw_helper<R: CommandRunner>(
    device_id: &str,
    buf: &[u8],
    helper: &Path,
    runner: &R,
) -> Result<(), TransportError> {
    let mut file = tempfile::Builder::new()
        .prefix("dymo-label-")
        .suffix(".bin")
        .tempfile()
        .map_err(TransportError::TempFile)?;
    file.write_all(buf)
        .and_then(|_| file.flush())
        .map_err(TransportError::TempFile)?;

    // The path removes the file when dropped, on every return below.
    let path = file.into_temp_path();
    let file_arg = path.to_string_lossy().into_owned();
    let helper_arg = helper.to_string_lossy();
    debug!("staged print data in {}", file_arg);

    let result = runner.run(&helper_arg, &[device_id, file_arg.as_str()], None);

    if let Err(err) = path.close() {
        warn!("failed to remove {}: {}", file_arg, err);
    }
    result?;
    Ok(())
}
