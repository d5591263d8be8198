//! Running `cmapbash` for one map type.
//!
//! Stdout is streamed line by line to the caller while the renderer runs.
//! Stderr is drained on its own thread into a buffer so a chatty renderer
//! can never stall on a full pipe; it is only surfaced when the run fails.

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{GlobalConfig, MapFlags, MapTypeSpec};
use crate::error::FailureReason;
use crate::resolve::WorldSpec;

/// File name of the renderer inside `bindir`.
pub const RENDERER_BINARY: &str = "cmapbash";

/// How often a renderer that closed its stdout is polled for exit while a
/// timeout is pending.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A fully-built renderer command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInvocation {
    program: PathBuf,
    args: Vec<OsString>,
    working_dir: PathBuf,
}

impl RenderInvocation {
    /// The invocation that renders `map_type` of `world`.
    ///
    /// The renderer runs inside `bindir`, so every path handed to it is
    /// anchored at the current directory first. Relative config paths then
    /// name the same place for the renderer and for this process.
    pub fn for_variant(global: &GlobalConfig, world: &WorldSpec, map_type: &MapTypeSpec) -> Self {
        let mut args: Vec<OsString> = flag_args(&map_type.flags)
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push("-w".into());
        args.push(anchored(&world.world_dir).into_os_string());
        args.push("-g".into());
        args.push(anchored(&world.output_dir(map_type)).into_os_string());

        let bindir = anchored(&global.bindir);
        Self {
            program: bindir.join(RENDERER_BINARY),
            args,
            working_dir: bindir,
        }
    }

    /// Path of the renderer binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the renderer.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Directory the renderer runs in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The command line as a single space-separated string, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the renderer to completion, handing each stdout line to
    /// `on_line` as it arrives.
    ///
    /// With a `timeout`, the renderer is killed once it has run that long.
    pub fn run(
        &self,
        timeout: Option<Duration>,
        mut on_line: impl FnMut(&str),
    ) -> Result<(), FailureReason> {
        tracing::debug!(command = %self.command_line(), cwd = %self.working_dir.display(), "starting renderer");
        let deadline = timeout.map(|t| Instant::now() + t);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FailureReason::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let lines = child.stdout.take().map(spawn_line_reader);
        let stderr = child.stderr.take().map(spawn_drain);

        if let Some(lines) = lines {
            loop {
                match next_line(&lines, deadline) {
                    Next::Line(line) => on_line(&line),
                    Next::Closed => break,
                    Next::TimedOut => return Err(kill(&mut child, timeout)),
                }
            }
        }

        let status = match wait(&mut child, deadline).map_err(FailureReason::Wait)? {
            Some(status) => status,
            None => return Err(kill(&mut child, timeout)),
        };

        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();

        if status.success() {
            if !stderr.trim().is_empty() {
                tracing::debug!(stderr = %stderr.trim(), "renderer wrote to stderr");
            }
            Ok(())
        } else {
            tracing::warn!(%status, stderr = %stderr.trim(), "renderer failed");
            Err(FailureReason::Exit { status, stderr })
        }
    }
}

/// `path` made absolute against the current directory. An empty path is
/// left as is.
fn anchored(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// The option flags for `flags`, in the renderer's expected order.
///
/// Options that are off are left out entirely. `-b` is always passed.
pub fn flag_args(flags: &MapFlags) -> Vec<String> {
    let mut args = Vec::new();
    if flags.is_dark() {
        args.push("-d".to_string());
    }
    if flags.iso {
        args.push("-i".to_string());
    }
    if flags.is_nether() {
        args.push("-n".to_string());
    }
    if flags.end {
        args.push("-e".to_string());
    }
    if flags.shadows {
        args.push("-s".to_string());
    }
    if flags.tiny {
        args.push("-t".to_string());
    }
    if let Some(rotate) = flags.rotate {
        args.push("-r".to_string());
        args.push((rotate % 4).to_string());
    }
    args.push("-b".to_string());
    args
}

enum Next {
    Line(String),
    Closed,
    TimedOut,
}

fn next_line(lines: &Receiver<String>, deadline: Option<Instant>) -> Next {
    match deadline {
        None => lines.recv().map_or(Next::Closed, Next::Line),
        Some(deadline) => {
            match lines.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(line) => Next::Line(line),
                Err(RecvTimeoutError::Disconnected) => Next::Closed,
                Err(RecvTimeoutError::Timeout) => Next::TimedOut,
            }
        }
    }
}

fn spawn_line_reader(stdout: impl Read + Send + 'static) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
    rx
}

fn spawn_drain(stderr: impl Read + Send + 'static) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let mut stderr = stderr;
        // A read error just truncates what is reported.
        let _ = stderr.read_to_end(&mut buf);
        buf
    })
}

/// Wait for exit, giving up at `deadline`. `Ok(None)` means it is still
/// running.
fn wait(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}

fn kill(child: &mut Child, timeout: Option<Duration>) -> FailureReason {
    tracing::warn!(pid = child.id(), "renderer timed out, killing it");
    if let Err(err) = child.kill() {
        return FailureReason::Wait(err);
    }
    if let Err(err) = child.wait() {
        return FailureReason::Wait(err);
    }
    FailureReason::TimedOut(timeout.unwrap_or_default())
}
