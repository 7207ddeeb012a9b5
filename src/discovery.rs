//! Enumeration of the printers installed on the host.

use std::thread;

use log::{debug, info, warn};

use crate::{
    error::{Error, ProcessError},
    platform::Platform,
    process::CommandRunner,
};

/// A printer reported by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPrinter {
    /// Queue name or device id used to address the printer.
    pub device_id: String,
    /// Human readable name.
    pub display_name: String,
}

impl DiscoveredPrinter {
    pub fn new(device_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        DiscoveredPrinter {
            device_id: device_id.into(),
            display_name: display_name.into(),
        }
    }

    fn from_device_id(device_id: &str) -> Self {
        DiscoveredPrinter::new(device_id, device_id.replace('_', " "))
    }
}

/// Rule deciding which discovered printer is used when none is configured.
///
/// Matches a case-insensitive substring of the display name. When several
/// printers match, the first one in enumeration order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorMatch {
    pattern: String,
}

impl VendorMatch {
    pub fn new(pattern: impl Into<String>) -> Self {
        VendorMatch {
            pattern: pattern.into().to_lowercase(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, printer: &DiscoveredPrinter) -> bool {
        printer.display_name.to_lowercase().contains(&self.pattern)
    }

    pub fn select<'a>(&self, printers: &'a [DiscoveredPrinter]) -> Option<&'a DiscoveredPrinter> {
        printers.iter().find(|p| self.matches(p))
    }
}

impl Default for VendorMatch {
    fn default() -> Self {
        VendorMatch::new("dymo")
    }
}

const LPSTAT: &str = "lpstat";
const POWERSHELL: &str = "powershell";
const WINDOWS_LIST_SCRIPT: &str =
    "Get-CimInstance Win32_Printer | ForEach-Object { $_.DeviceID + [char]9 + $_.Name }";

/// List the printers installed on `platform`.
pub fn list_printers<R: CommandRunner>(
    platform: Platform,
    runner: &R,
) -> Result<Vec<DiscoveredPrinter>, Error> {
    let printers = match platform {
        Platform::Linux => {
            let out = lpstat(runner, &["-l", "-p"])?;
            parse_lpstat(&String::from_utf8_lossy(&out))
        }
        Platform::MacOs => {
            let out = lpstat(runner, &["-p"])?;
            let printers = parse_lpstat(&String::from_utf8_lossy(&out));
            describe_all(runner, printers)
        }
        Platform::Windows => {
            let out = runner
                .run(
                    POWERSHELL,
                    &["-NoProfile", "-NonInteractive", "-Command", WINDOWS_LIST_SCRIPT],
                    None,
                )
                .map_err(Error::Discovery)?;
            parse_windows(&String::from_utf8_lossy(&out))
        }
        Platform::Other => return Err(Error::UnsupportedPlatform(platform)),
    };
    info!("found {} installed printers", printers.len());
    debug!("{:?}", printers);
    Ok(printers)
}

/// Text lpstat prints, with a non-zero exit, when no queue is installed.
const NO_DESTINATIONS: &str = "No destinations added";

/// Run the queue listing, treating a host without queues as an empty listing.
fn lpstat<R: CommandRunner>(runner: &R, args: &[&str]) -> Result<Vec<u8>, Error> {
    match runner.run(LPSTAT, args, None) {
        Ok(out) => Ok(out),
        Err(ProcessError::NonZeroExit { ref stderr, .. }) if stderr.contains(NO_DESTINATIONS) => {
            debug!("lpstat reports no destinations");
            Ok(Vec::new())
        }
        Err(err) => Err(Error::Discovery(err)),
    }
}

/// Look up the description of every printer concurrently.
///
/// A failed lookup keeps the name derived from the device id.
fn describe_all<R: CommandRunner>(
    runner: &R,
    printers: Vec<DiscoveredPrinter>,
) -> Vec<DiscoveredPrinter> {
    thread::scope(|scope| {
        let lookups: Vec<_> = printers
            .into_iter()
            .map(|printer| scope.spawn(move || describe(runner, printer)))
            .collect();
        lookups
            .into_iter()
            .filter_map(|lookup| match lookup.join() {
                Ok(printer) => Some(printer),
                Err(_) => {
                    warn!("printer description lookup panicked");
                    None
                }
            })
            .collect()
    })
}

fn describe<R: CommandRunner>(runner: &R, printer: DiscoveredPrinter) -> DiscoveredPrinter {
    match runner.run(LPSTAT, &["-l", "-p", printer.device_id.as_str()], None) {
        Ok(out) => parse_lpstat(&String::from_utf8_lossy(&out))
            .into_iter()
            .find(|p| p.device_id == printer.device_id)
            .unwrap_or(printer),
        Err(err) => {
            warn!("no description for {}: {}", printer.device_id, err);
            printer
        }
    }
}

/// Parse `lpstat -p` / `lpstat -l -p` output.
///
/// Each printer block starts with `printer <id> ...`, long listings add an
/// indented `Description:` line.
pub fn parse_lpstat(output: &str) -> Vec<DiscoveredPrinter> {
    let mut printers: Vec<DiscoveredPrinter> = Vec::new();

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("printer ") {
            if let Some(id) = rest.split_whitespace().next() {
                printers.push(DiscoveredPrinter::from_device_id(id));
            }
        } else if let Some(description) = line.trim().strip_prefix("Description:") {
            let description = description.trim();
            if description.is_empty() {
                continue;
            }
            if let Some(current) = printers.last_mut() {
                current.display_name = description.to_string();
            }
        }
    }
    printers
}

/// Parse `deviceId<TAB>name` lines.
pub fn parse_windows(output: &str) -> Vec<DiscoveredPrinter> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('\t') {
            Some((id, name)) if !name.trim().is_empty() => {
                DiscoveredPrinter::new(id.trim(), name.trim())
            }
            Some((id, _)) => DiscoveredPrinter::new(id.trim(), id.trim()),
            None => DiscoveredPrinter::new(line, line),
        })
        .collect()
}
