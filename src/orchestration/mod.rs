//! Install orchestration
//!
//! Ties the package cache to the external installer:
//! - `installer`: the external installer trait
//! - `npm`: npm child-process implementation
//! - `orchestrator`: cache-first install state machine

mod factory;
pub mod installer;
pub mod npm;
pub mod orchestrator;

pub use factory::{create_cache_store, create_orchestrator};
pub use installer::ExternalInstaller;
pub use npm::NpmInstaller;
pub use orchestrator::{BatchEntry, InstallOrchestrator, InstallSource, InstallState, Outcome};

use tokio::io::{AsyncBufReadExt, BufReader};

/// Max number of output lines to include in install error messages.
const ERROR_TAIL_LINES: usize = 20;

/// Last `ERROR_TAIL_LINES` lines of installer output, joined.
pub(crate) fn output_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. Streams that were
/// not piped are skipped.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let mut stderr_reader = child.stderr.take().map(|s| BufReader::new(s).lines());
    let mut stdout_reader = child.stdout.take().map(|s| BufReader::new(s).lines());

    let mut all_output = Vec::new();
    let mut stderr_done = stderr_reader.is_none();
    let mut stdout_done = stdout_reader.is_none();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = next_line(&mut stderr_reader), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = next_line(&mut stdout_reader), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}

async fn next_line<R>(reader: &mut Option<tokio::io::Lines<BufReader<R>>>) -> Option<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match reader {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_tail_keeps_last_lines() {
        let lines: Vec<String> = (0..30).map(|i| format!("line {}", i)).collect();
        let tail = output_tail(&lines);
        assert!(tail.starts_with("line 10\n"));
        assert!(tail.ends_with("line 29"));
    }

    #[test]
    fn output_tail_short_output() {
        let lines = vec!["npm ERR! 404".to_string()];
        assert_eq!(output_tail(&lines), "npm ERR! 404");
        assert_eq!(output_tail(&[]), "");
    }
}
