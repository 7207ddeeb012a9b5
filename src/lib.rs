//! DYMO LabelWriter Printer Driver
//!
//! This crate renders label images into the LabelWriter raster command
//! language and sends them to the printer over a raw network socket, a CUPS
//! queue, the Windows raw print helper or a character device. Without a
//! configured interface the first installed printer whose name contains
//! "dymo" is used.
//!
//! # Example
//!
//! ```rust,no_run
//! use dymo_label::{Config, Printer, PrinterTarget};
//!
//! let config = Config::new(PrinterTarget::Network {
//!     host: "10.0.0.5".to_string(),
//!     port: 9100,
//! });
//! let printer = Printer::new(config);
//! let image = image::open("label.png").unwrap();
//! printer.print(&image, 2).unwrap();
//! ```

mod bitmap;
mod config;
mod discovery;
mod error;
mod platform;
mod printer;
mod process;
pub mod protocol;
mod raster;
mod render;
mod transport;

pub use crate::{
    bitmap::{Bitmap, LabelGeometry},
    config::{Config, PrinterOptions},
    discovery::{parse_lpstat, parse_windows, DiscoveredPrinter, VendorMatch},
    error::{Error, ProcessError, TransportError},
    platform::Platform,
    printer::Printer,
    process::{CommandRunner, SystemRunner},
    raster::{rasterize, rasterize_encoded, RasterPolicy},
    render::{TextRenderer, TextRequest, FONT_SIZES},
    transport::{PrinterTarget, TransportSettings, DEFAULT_HOST, DEFAULT_PORT},
};

/// Type alias for 1-bit bitmap rows.
///
/// Each inner `Vec<u8>` represents a single scanline with 8 pixels packed
/// into each byte, leftmost pixel in the most significant bit.
pub type Matrix = Vec<Vec<u8>>;

/// Print head width of the LabelWriter 450 in dots at 300 dpi.
///
/// Wider images are accepted as long as a scanline fits the protocol's
/// one byte length field.
pub const LABELWRITER_450_WIDTH: u32 = 672;
