//! Running an external binary with a payload on stdin.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Spawn `program` with `args`, write `input` to its stdin, and wait for it
/// to exit. The blocking process I/O runs on the blocking pool.
///
/// Errors are returned as text so each caller can wrap them in its own
/// error variant.
pub async fn run_with_stdin(
    program: &str,
    args: &[String],
    input: Vec<u8>,
) -> std::result::Result<Output, String> {
    let program = program.to_string();
    let args = args.to_vec();

    tokio::task::spawn_blocking(move || {
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to spawn '{program}': {e}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            // a program that never reads stdin may exit before the write
            match stdin.write_all(&input) {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(format!("failed to write to '{program}' stdin: {e}"));
                }
                _ => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("'{program}' failed: {e}"))?;

        if output.status.success() {
            Ok(output)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!("'{program}' exited with {}: {}", output.status, stderr.trim()))
        }
    })
    .await
    .map_err(|e| format!("task running external process panicked: {e}"))?
}
