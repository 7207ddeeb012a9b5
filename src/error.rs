//! Error types for LabelWriter operations.
//!
//! This module defines all possible errors that can occur while rasterizing,
//! encoding and delivering a label.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::platform::Platform;

/// Main error type for LabelWriter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad caller input such as an empty bitmap or a zero copy count.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The printer configuration can not be used.
    ///
    /// Raised at construction time, for example for an unknown interface
    /// name or a spooler interface without a device id.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Discovery finished but no installed printer matched.
    #[error("No printer matching {vendor:?} found, configure the printer interface manually")]
    NoPrinterFound { vendor: String },

    /// Label geometry does not fit into a protocol field.
    #[error("{field} is {value}, the protocol allows at most {max}")]
    ProtocolConstraint {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("Printer listing is not supported on {0:?}")]
    UnsupportedPlatform(Platform),

    /// Enumerating the installed printers failed.
    #[error("Printer discovery failed")]
    Discovery(#[source] ProcessError),

    /// Delivering the command stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// `true` when the caller has to fix its input or configuration,
    /// `false` for hardware and transport problems.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::InvalidConfiguration(_)
                | Self::NoPrinterFound { .. }
                | Self::ProtocolConstraint { .. }
                | Self::UnsupportedPlatform(_)
        )
    }
}

/// Failures of a single delivery channel.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("Connection to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("Failed to write to {addr}: {source}")]
    Write { addr: String, source: io::Error },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to stage print data in a temporary file: {0}")]
    TempFile(io::Error),

    #[error("Failed to write to device {path:?}: {source}")]
    Device { path: PathBuf, source: io::Error },
}

/// Failures of an external command.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Failed to write to stdin of {program}: {source}")]
    Stdin { program: String, source: io::Error },

    #[error("Failed to read output of {program}: {source}")]
    Output { program: String, source: io::Error },

    /// The command ran but exited unsuccessfully.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("{program} exited with {code:?}: {stderr}")]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}
