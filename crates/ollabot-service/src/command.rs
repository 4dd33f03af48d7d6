//! OS command execution.

use async_trait::async_trait;
use std::io;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Runs the external programs recovery depends on.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion, capturing its exit status and stderr.
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;

    /// Start `program` in the background and return its PID without waiting.
    fn spawn_detached(&self, program: &str, args: &[String]) -> io::Result<u32>;
}

/// Runs commands on the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        debug!("Running: {} {}", program, args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> io::Result<u32> {
        debug!("Spawning: {} {}", program, args.join(" "));
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Own process group: a Ctrl-C in the terminal must not reach the server.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;
        let pid = child.id();

        // Reap the child whenever it exits so it never lingers as a zombie.
        let reaper = std::thread::Builder::new()
            .name(format!("reap-{}", pid))
            .spawn(move || match child.wait() {
                Ok(status) => debug!("Detached process {} exited: {}", pid, status),
                Err(e) => warn!("Failed to wait on detached process {}: {}", pid, e),
            });
        if let Err(e) = reaper {
            warn!("Could not start reaper for process {}: {}", pid, e);
        }

        Ok(pid)
    }
}
