//! External command execution.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use log::debug;

use crate::error::ProcessError;

/// Runs external programs on behalf of discovery and delivery.
///
/// Implementations must be shareable across threads, discovery looks up
/// printer descriptions concurrently.
pub trait CommandRunner: Sync {
    /// Run `program` with `args`, feeding `stdin` when given.
    ///
    /// Returns the captured standard output on a zero exit status.
    fn run(&self, program: &str, args: &[&str], stdin: Option<&[u8]>)
        -> Result<Vec<u8>, ProcessError>;
}

/// [`CommandRunner`] backed by `std::process::Command`.
///
/// Programs run with `LC_ALL=C`, their output is parsed and must not be
/// localized.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> Result<Vec<u8>, ProcessError> {
        debug!("running {} {:?}", program, args);

        let mut command = Command::new(program);
        command.args(args);
        command.env("LC_ALL", "C");
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        if stdin.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        // stdin is fed from a second thread so a program that exits early
        // still has its status and stderr collected.
        let pipe = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                if let (Some(mut pipe), Some(bytes)) = (pipe, stdin) {
                    pipe.write_all(bytes)?;
                    pipe.flush()?;
                }
                Ok(())
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))
            });
            (written, output)
        });

        let output = output.map_err(|source| ProcessError::Output {
            program: program.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(ProcessError::NonZeroExit {
                program: program.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(source) = written {
            return Err(ProcessError::Stdin {
                program: program.to_string(),
                source,
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = SystemRunner.run("echo", &["hello"], None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "hello");
    }

    #[test]
    fn pipes_stdin() {
        let out = SystemRunner.run("cat", &[], Some(b"\x1b@label")).unwrap();
        assert_eq!(out, b"\x1b@label");
    }

    #[test]
    fn non_zero_exit_carries_stderr() {
        let err = SystemRunner
            .run("sh", &["-c", "echo broken >&2; exit 3"], None)
            .unwrap_err();
        match err {
            ProcessError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn early_exit_keeps_stderr_of_unread_stdin() {
        let label = vec![0u8; 1 << 20];
        let err = SystemRunner
            .run(
                "sh",
                &["-c", "echo 'lp: The printer or class does not exist.' >&2; exit 1"],
                Some(&label),
            )
            .unwrap_err();
        match err {
            ProcessError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "lp: The printer or class does not exist.");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn large_stdin_is_fully_consumed() {
        let label = vec![0x1Bu8; 1 << 20];
        let out = SystemRunner.run("wc", &["-c"], Some(&label)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "1048576");
    }

    #[test]
    fn runs_in_c_locale() {
        let out = SystemRunner.run("sh", &["-c", "echo $LC_ALL"], None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim(), "C");
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = SystemRunner
            .run("definitely-not-a-real-program-1234", &[], None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
