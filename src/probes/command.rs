//! Running external measurement tools with a deadline.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::CheckError;

/// Run `program` with `args`, returning stdout on a zero exit status.
///
/// The child is killed when `limit` expires.
pub(crate) async fn run(program: &str, args: &[String], limit: Duration) -> Result<String, CheckError> {
    debug!(program, args = ?args, "Spawning probe command");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = timeout(limit, output)
        .await
        .map_err(|_| CheckError::Timeout(limit.as_secs()))??;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            program,
            code = ?output.status.code(),
            stdout = %stdout.trim_end(),
            stderr = %stderr.trim_end(),
            "Probe command failed"
        );
        return Err(CheckError::Process {
            program: program.to_string(),
            code: output.status.code(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Short label for a failed run, used as the `error_type` of error samples.
pub(crate) fn error_type(err: &CheckError) -> String {
    match err {
        CheckError::Process { code: Some(code), .. } => code.to_string(),
        CheckError::Process { code: None, .. } => "signal".into(),
        CheckError::Parse(_) => "json_error".into(),
        CheckError::Timeout(_) => "timeout".into(),
        CheckError::Config(_) => "config_error".into(),
        _ => "unexpected_error".into(),
    }
}
