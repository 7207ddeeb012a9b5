use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    discovery::VendorMatch,
    error::Error,
    platform::Platform,
    raster::RasterPolicy,
    transport::{PrinterTarget, TransportSettings},
};

/// Raw printer options as they come from a settings file.
///
/// ```
/// use dymo_label::PrinterOptions;
///
/// let options: PrinterOptions = serde_json::from_str(
///     r#"{ "interface": "NETWORK", "host": "10.0.0.5", "port": 9100 }"#,
/// ).unwrap();
/// assert_eq!(options.host.as_deref(), Some("10.0.0.5"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterOptions {
    /// `NETWORK`, `CUPS`, `WINDOWS` or `DEVICE`. Absent means auto-discovery.
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device: Option<PathBuf>,
}

impl PrinterOptions {
    /// Resolve the options into a target, `None` when discovery is needed.
    pub fn target(&self) -> Result<Option<PrinterTarget>, Error> {
        let interface = match &self.interface {
            Some(interface) => interface.trim().to_uppercase(),
            None => return Ok(None),
        };

        let target = match interface.as_str() {
            "NETWORK" => PrinterTarget::network(self.host.clone(), self.port),
            "CUPS" => PrinterTarget::Spooler {
                device_id: self.require_device_id(&interface)?,
            },
            "WINDOWS" => PrinterTarget::RawHelper {
                device_id: self.require_device_id(&interface)?,
            },
            "DEVICE" => match &self.device {
                Some(path) if !path.as_os_str().is_empty() => PrinterTarget::Device {
                    path: path.clone(),
                },
                _ => {
                    return Err(Error::InvalidConfiguration(
                        "DEVICE interface requires a device path".to_string(),
                    ))
                }
            },
            other => {
                return Err(Error::InvalidConfiguration(format!(
                    "unknown interface {:?}, expected NETWORK, CUPS, WINDOWS or DEVICE",
                    other
                )))
            }
        };
        Ok(Some(target))
    }

    fn require_device_id(&self, interface: &str) -> Result<String, Error> {
        match &self.device_id {
            Some(id) if !id.trim().is_empty() => Ok(id.clone()),
            _ => Err(Error::InvalidConfiguration(format!(
                "{} interface requires a deviceId",
                interface
            ))),
        }
    }
}

/// Printer configuration.
///
/// The target is fixed at construction. The remaining values start from
/// defaults and can be changed with the builder methods.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) target: Option<PrinterTarget>,
    pub(crate) platform: Platform,
    pub(crate) vendor_match: VendorMatch,
    pub(crate) raster: RasterPolicy,
    pub(crate) transport: TransportSettings,
}

impl Config {
    /// Configuration that discovers the printer on first use.
    pub fn auto() -> Config {
        Config::with_target(None)
    }

    /// Configuration for a known target.
    pub fn new(target: PrinterTarget) -> Config {
        Config::with_target(Some(target))
    }

    /// Validate raw options. Unknown interfaces fail here, not at print time.
    pub fn from_options(options: &PrinterOptions) -> Result<Config, Error> {
        Ok(Config::with_target(options.target()?))
    }

    fn with_target(target: Option<PrinterTarget>) -> Config {
        Config {
            target,
            platform: Platform::current(),
            vendor_match: VendorMatch::default(),
            raster: RasterPolicy::default(),
            transport: TransportSettings::default(),
        }
    }

    pub fn platform(self, platform: Platform) -> Self {
        Config { platform, ..self }
    }

    /// Substring a discovered printer name must contain, case-insensitive.
    pub fn vendor_match(self, pattern: &str) -> Self {
        Config {
            vendor_match: VendorMatch::new(pattern),
            ..self
        }
    }

    pub fn raster_policy(self, raster: RasterPolicy) -> Self {
        Config { raster, ..self }
    }

    pub fn network_timeout(mut self, timeout: Duration) -> Self {
        self.transport.network_timeout = timeout;
        self
    }

    pub fn spooler_program(mut self, program: &str) -> Self {
        self.transport.spooler_program = program.to_string();
        self
    }

    pub fn raw_print_helper(mut self, helper: impl Into<PathBuf>) -> Self {
        self.transport.raw_print_helper = helper.into();
        self
    }

    pub fn target(&self) -> Option<&PrinterTarget> {
        self.target.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(json: &str) -> PrinterOptions {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_options_mean_discovery() {
        assert_eq!(options("{}").target().unwrap(), None);
        assert!(Config::from_options(&options("{}")).unwrap().target().is_none());
    }

    #[test]
    fn network_fills_in_defaults() {
        assert_eq!(
            options(r#"{"interface":"NETWORK"}"#).target().unwrap(),
            Some(PrinterTarget::Network {
                host: "localhost".to_string(),
                port: 9100
            })
        );
        assert_eq!(
            options(r#"{"interface":"network","host":"10.0.0.5","port":9101}"#)
                .target()
                .unwrap(),
            Some(PrinterTarget::Network {
                host: "10.0.0.5".to_string(),
                port: 9101
            })
        );
    }

    #[test]
    fn spooler_and_raw_helper_need_device_id() {
        assert_eq!(
            options(r#"{"interface":"CUPS","deviceId":"DYMO_LabelWriter_450"}"#)
                .target()
                .unwrap(),
            Some(PrinterTarget::Spooler {
                device_id: "DYMO_LabelWriter_450".to_string()
            })
        );
        assert_eq!(
            options(r#"{"interface":"WINDOWS","deviceId":"DYMO LabelWriter 450"}"#)
                .target()
                .unwrap(),
            Some(PrinterTarget::RawHelper {
                device_id: "DYMO LabelWriter 450".to_string()
            })
        );
        assert!(matches!(
            options(r#"{"interface":"CUPS"}"#).target(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn device_needs_path() {
        assert_eq!(
            options(r#"{"interface":"DEVICE","device":"/dev/usb/lp0"}"#)
                .target()
                .unwrap(),
            Some(PrinterTarget::Device {
                path: PathBuf::from("/dev/usb/lp0")
            })
        );
        assert!(options(r#"{"interface":"DEVICE"}"#).target().is_err());
    }

    #[test]
    fn unknown_interface_fails_construction() {
        let err = Config::from_options(&options(r#"{"interface":"BLUETOOTH"}"#)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::auto()
            .platform(Platform::Windows)
            .vendor_match("LabelWriter 450")
            .network_timeout(Duration::from_secs(2))
            .raw_print_helper("C:\\Tools\\RawPrint.exe");
        assert_eq!(config.platform, Platform::Windows);
        assert_eq!(config.vendor_match.pattern(), "labelwriter 450");
        assert_eq!(config.transport.network_timeout, Duration::from_secs(2));
        assert_eq!(config.transport.spooler_program, "lp");
        assert_eq!(
            config.transport.raw_print_helper,
            PathBuf::from("C:\\Tools\\RawPrint.exe")
        );
    }
}
