//! Child process helpers with streamed output.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use crate::error::Result;

/// Outcome of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Interleaved stdout and stderr lines, in arrival order.
    pub combined: String,
}

impl ProcessOutput {
    #[inline]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

fn forward_lines<R: Read>(reader: R, is_stderr: bool, tx: mpsc::Sender<(bool, String)>) {
    for line in BufReader::new(reader).lines() {
        match line {
            Ok(line) => {
                if tx.send((is_stderr, line)).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

/// Runs `command` to completion, logging every output line under `label`.
///
/// No timeout is applied; the call blocks until the child exits.
pub fn run_streaming(mut command: Command, label: &str) -> Result<ProcessOutput> {
    let mut child = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut combined = String::new();

    let (tx, rx) = mpsc::channel::<(bool, String)>();
    thread::scope(|scope| {
        if let Some(stdout) = stdout {
            let tx = tx.clone();
            scope.spawn(move || forward_lines(stdout, false, tx));
        }
        if let Some(stderr) = stderr {
            let tx = tx.clone();
            scope.spawn(move || forward_lines(stderr, true, tx));
        }
        drop(tx);

        for (is_stderr, line) in rx {
            if is_stderr {
                warn!(target: "monoforge::process", source = label, stream = "stderr", "{}", line);
            } else {
                info!(target: "monoforge::process", source = label, "{}", line);
            }
            combined.push_str(&line);
            combined.push('\n');
        }
    });

    let status = child.wait()?;
    Ok(ProcessOutput {
        exit_code: status.code().unwrap_or(-1),
        combined,
    })
}

/// Quotes a token for display or for embedding in a `sh -c` command line.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=./,:@^+%".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

/// Joins tokens into a single shell command line.
pub fn join_command<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| shell_quote(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_streaming_collects_both_streams() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo out; echo err >&2; exit 2");

        let output = run_streaming(command, "test").unwrap();
        assert_eq!(output.exit_code, 2);
        assert!(!output.success());
        assert!(output.combined.contains("out\n"));
        assert!(output.combined.contains("err\n"));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("--target=build"), "--target=build");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(join_command(&["npx", "nx", ""]), "npx nx ''");
    }
}
