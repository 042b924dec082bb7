//! Stage backed by an external program.

use super::Stage;
use crate::context::RunContext;
use crate::core::StageOutput;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tracing::debug;

/// Number of trailing stderr lines kept for the failure message.
const STDERR_TAIL_LINES: usize = 5;

/// Runs `program args...` in the run's working directory.
///
/// Arguments may reference `{placeholders}` from the [`RunContext`]. Stdout
/// is inherited; stderr is forwarded line by line and its tail is kept to
/// explain a failure.
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    program: String,
    args: Vec<String>,
    echo_stderr: bool,
}

impl CommandStage {
    /// Creates a command stage.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            echo_stderr: true,
        }
    }

    /// Creates a command stage from a full argv (`argv[0]` is the program).
    ///
    /// Returns `None` when `argv` is empty.
    #[must_use]
    pub fn from_argv(name: impl Into<String>, argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(name, program.clone(), args.iter().cloned()))
    }

    /// Controls whether stderr lines are forwarded to this process's stderr.
    #[must_use]
    pub fn with_stderr_echo(mut self, echo: bool) -> Self {
        self.echo_stderr = echo;
        self
    }

    /// Returns the program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the unexpanded arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Reads stderr to EOF, echoing each line and keeping the last few.
    ///
    /// Lines are decoded lossily. The pipe is read until the child closes it,
    /// even after a read error.
    async fn forward_stderr(&self, stderr: ChildStderr) -> VecDeque<String> {
        let mut reader = BufReader::new(stderr);
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    if self.echo_stderr {
                        eprintln!("{line}");
                    }
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line.to_string());
                }
                Err(e) => {
                    debug!(stage = %self.name, error = %e, "Stderr read failed, draining");
                    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                        debug!(stage = %self.name, error = %e, "Stderr drain failed");
                    }
                    break;
                }
            }
        }
        tail
    }
}

#[async_trait]
impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn execute(&self, ctx: &RunContext) -> StageOutput {
        let program = match ctx.expand(&self.program) {
            Ok(program) => program,
            Err(err) => return StageOutput::fail(err.to_string()),
        };
        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match ctx.expand(arg) {
                Ok(arg) => args.push(arg),
                Err(err) => return StageOutput::fail(err.to_string()),
            }
        }

        debug!(stage = %self.name, program = %program, args = ?args, "Spawning command");

        let mut child = match Command::new(&program)
            .args(&args)
            .current_dir(ctx.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return StageOutput::fail(format!(
                    "command not found: {program} (check PATH and working directory {})",
                    ctx.working_dir().display()
                ));
            }
            Err(e) => return StageOutput::fail(format!("failed to start '{program}': {e}")),
        };

        let tail = match child.stderr.take() {
            Some(stderr) => self.forward_stderr(stderr).await,
            None => VecDeque::new(),
        };

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return StageOutput::fail(format!("failed waiting for '{program}': {e}")),
        };

        let stderr_tail = tail.into_iter().collect::<Vec<_>>().join("\n");
        if status.success() {
            return StageOutput::ok();
        }

        match status.code() {
            Some(code) => {
                let message = if stderr_tail.trim().is_empty() {
                    format!("{program} exited with status {code}")
                } else {
                    stderr_tail
                };
                StageOutput::fail_with_code(code, message)
            }
            None => StageOutput::fail(format!("{program} was terminated by a signal")),
        }
    }
}
