/// Operating system family the driver talks to.
///
/// Resolved once with [`Platform::current`] and handed to the printer, so
/// discovery and delivery never inspect the process environment themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Other
        }
    }

    /// `true` when print jobs go through a CUPS style spooler.
    pub fn uses_spooler(&self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unix_hosts_use_the_spooler() {
        assert!(Platform::Linux.uses_spooler());
        assert!(Platform::MacOs.uses_spooler());
        assert!(!Platform::Windows.uses_spooler());
        assert!(!Platform::Other.uses_spooler());
    }
}
