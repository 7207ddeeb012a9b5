use image::DynamicImage;
use log::{debug, info};

use crate::{
    bitmap::Bitmap,
    config::{Config, PrinterOptions},
    discovery::{self, DiscoveredPrinter},
    error::Error,
    process::{CommandRunner, SystemRunner},
    protocol, raster,
    render::{TextRenderer, TextRequest},
    transport::{self, PrinterTarget},
};

/// A LabelWriter reachable through one of the supported channels.
///
/// Nothing is kept between print calls: every call builds its own command
/// stream and, without a configured target, discovers the printer again.
pub struct Printer<R: CommandRunner = SystemRunner> {
    config: Config,
    runner: R,
}

/// Steps of a single print call.
#[derive(Debug)]
enum Dispatch {
    Resolve,
    Deliver(PrinterTarget),
}

impl Printer {
    pub fn new(config: Config) -> Self {
        Printer::with_runner(config, SystemRunner)
    }

    /// Build a printer from raw options, rejecting unknown interfaces.
    pub fn from_options(options: &PrinterOptions) -> Result<Self, Error> {
        Ok(Printer::new(Config::from_options(options)?))
    }
}

impl<R: CommandRunner> Printer<R> {
    /// Use `runner` for every external program (spooler, raw helper, discovery).
    pub fn with_runner(config: Config, runner: R) -> Self {
        Printer { config, runner }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Print `copies` labels of a rendered image.
    pub fn print(&self, image: &DynamicImage, copies: u32) -> Result<(), Error> {
        check_copies(copies)?;
        let bitmap = raster::rasterize(image, &self.config.raster)?;
        self.print_bitmap(&bitmap, copies)
    }

    /// Print an encoded image (PNG, BMP).
    pub fn print_encoded(&self, data: &[u8], copies: u32) -> Result<(), Error> {
        check_copies(copies)?;
        let bitmap = raster::rasterize_encoded(data, &self.config.raster)?;
        self.print_bitmap(&bitmap, copies)
    }

    /// Render `request` with `renderer` and print it.
    pub fn print_text<T: TextRenderer>(
        &self,
        renderer: &T,
        request: &TextRequest,
        copies: u32,
    ) -> Result<(), Error> {
        check_copies(copies)?;
        let image = renderer.render(request)?;
        self.print(&image, copies)
    }

    /// Print an already packed bitmap.
    pub fn print_bitmap(&self, bitmap: &Bitmap, copies: u32) -> Result<(), Error> {
        let buf = protocol::encode(bitmap, copies)?;
        self.dispatch(&buf)
    }

    /// The command stream [`Printer::print`] would send for `image`.
    pub fn command_buffer(&self, image: &DynamicImage, copies: u32) -> Result<Vec<u8>, Error> {
        check_copies(copies)?;
        let bitmap = raster::rasterize(image, &self.config.raster)?;
        protocol::encode(&bitmap, copies)
    }

    /// Printers installed on the configured platform.
    pub fn list_printers(&self) -> Result<Vec<DiscoveredPrinter>, Error> {
        discovery::list_printers(self.config.platform, &self.runner)
    }

    fn dispatch(&self, buf: &[u8]) -> Result<(), Error> {
        let mut step = Dispatch::Resolve;
        loop {
            debug!("dispatch step {:?}", step);
            step = match step {
                Dispatch::Resolve => Dispatch::Deliver(self.resolve_target()?),
                Dispatch::Deliver(target) => {
                    transport::deliver(&target, buf, &self.config.transport, &self.runner)?;
                    info!("print job delivered");
                    return Ok(());
                }
            };
        }
    }

    fn resolve_target(&self) -> Result<PrinterTarget, Error> {
        if let Some(target) = &self.config.target {
            return Ok(target.clone());
        }

        let printers = self.list_printers()?;
        let policy = &self.config.vendor_match;
        let printer = policy.select(&printers).ok_or_else(|| Error::NoPrinterFound {
            vendor: policy.pattern().to_string(),
        })?;
        info!(
            "using discovered printer {} ({})",
            printer.display_name, printer.device_id
        );

        let device_id = printer.device_id.clone();
        Ok(if self.config.platform.uses_spooler() {
            PrinterTarget::Spooler { device_id }
        } else {
            PrinterTarget::RawHelper { device_id }
        })
    }
}

fn check_copies(copies: u32) -> Result<(), Error> {
    if copies == 0 {
        Err(Error::InvalidArgument(
            "copies must be at least 1".to_string(),
        ))
    } else {
        Ok(())
    }
}
