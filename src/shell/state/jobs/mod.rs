use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use std::ffi::{CStr, CString};
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::process;
use tracing::{debug, warn};
use super::super::error::{Error, Result};

pub mod pipeline;
pub mod redirect;

/// Exit status reported by a child whose `execvp` failed.
pub const EXEC_FAILURE: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Block until the child terminates.
    Foreground,
    /// Return at once, leaving the child to the background registry.
    Background,
}

impl WaitPolicy {
    pub fn from_background(background: bool) -> WaitPolicy {
        if background {
            WaitPolicy::Background
        } else {
            WaitPolicy::Foreground
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Exited(i32),
    Signaled(Signal),
    Background(Pid),
}

/// An owned raw descriptor, closed on drop.
#[derive(Debug)]
pub struct Fd(RawFd);

impl Fd {
    pub fn new(fd: RawFd) -> Fd {
        Fd(fd)
    }

    pub fn raw(&self) -> RawFd {
        self.0
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        if let Err(errno) = unistd::close(self.0) {
            warn!(fd = self.0, %errno, "failed to close descriptor");
        }
    }
}

/// An argument vector converted for `execvp` ahead of the fork.
#[derive(Debug)]
pub struct Program {
    args: Vec<CString>,
}

impl Program {
    pub fn new(argv: &[String]) -> Result<Program> {
        if argv.is_empty() {
            return Err(Error::Syntax(String::from("empty command")));
        }
        let mut args = Vec::with_capacity(argv.len());
        for arg in argv {
            args.push(CString::new(arg.as_str()).map_err(|_| Error::StringEncoding)?);
        }
        Ok(Program { args })
    }

    pub fn name(&self) -> &CStr {
        &self.args[0]
    }

    /// Replaces the current process image. Only called in a child.
    fn exec(&self) -> ! {
        match unistd::execvp(self.name(), &self.args) {
            Ok(never) => match never {},
            Err(source) => child_exit(&Error::Exec {
                program: self.name().to_string_lossy().into_owned(),
                source,
            }),
        }
    }
}

/// Reports `error` on stderr and terminates the child. Writes straight to
/// the descriptor so nothing that another thread may have locked is touched.
fn child_exit(error: &Error) -> ! {
    let message = format!("osh: {}\n", error);
    let _ = unistd::write(libc::STDERR_FILENO, message.as_bytes());
    process::exit(EXEC_FAILURE)
}

pub fn flush_stdout() {
    if let Err(error) = io::stdout().flush() {
        warn!(%error, "failed to flush stdout");
    }
}

/// Forks and execs `program`. `prepare` runs in the child just before the
/// exec and arranges its descriptors.
pub fn spawn<F>(program: &Program, prepare: F) -> Result<Pid>
where
    F: FnOnce() -> nix::Result<()>,
{
    // the child would otherwise inherit and re-emit buffered output
    flush_stdout();
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = %child, program = ?program.name(), "spawned");
            Ok(child)
        }
        Ok(ForkResult::Child) => {
            if let Err(errno) = prepare() {
                child_exit(&Error::Redirect(errno));
            }
            program.exec()
        }
        Err(errno) => Err(Error::Spawn(errno)),
    }
}

/// Blocks until `pid` terminates.
pub fn wait_for(pid: Pid) -> Result<Outcome> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!(%pid, code, "exited");
                return Ok(Outcome::Exited(code));
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!(%pid, ?signal, "killed");
                return Ok(Outcome::Signaled(signal));
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(Error::Wait(errno)),
        }
    }
}

/// Children started in the background that have not been reaped yet.
#[derive(Debug, Default)]
pub struct Jobs {
    running: Vec<Pid>,
}

impl Jobs {
    pub fn new() -> Jobs {
        Jobs { running: Vec::new() }
    }

    pub fn register(&mut self, pid: Pid) {
        self.running.push(pid);
    }

    pub fn pids(&self) -> &[Pid] {
        &self.running
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Polls every registered child without blocking and forgets the ones
    /// that have terminated. Returns their final statuses.
    pub fn reap(&mut self) -> Vec<WaitStatus> {
        let mut finished = Vec::new();
        let mut still_running = Vec::with_capacity(self.running.len());
        for pid in self.running.drain(..) {
            match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => {
                    debug!(%pid, ?status, "reaped background job");
                    finished.push(status);
                }
                Ok(_) | Err(Errno::EINTR) => still_running.push(pid),
                Err(Errno::ECHILD) => debug!(%pid, "background job already reaped"),
                Err(errno) => {
                    warn!(%pid, %errno, "failed to poll background job");
                    still_running.push(pid);
                }
            }
        }
        self.running = still_running;
        finished
    }
}

/// Waits for `pid` or hands it to `jobs`, depending on `policy`.
pub fn settle(pid: Pid, policy: WaitPolicy, jobs: &mut Jobs) -> Result<Outcome> {
    match policy {
        WaitPolicy::Foreground => wait_for(pid),
        WaitPolicy::Background => {
            jobs.register(pid);
            // best effort; a child this young has usually not exited yet
            jobs.reap();
            Ok(Outcome::Background(pid))
        }
    }
}

/// Runs `argv` as one child process under `policy`.
pub fn launch(argv: &[String], policy: WaitPolicy, jobs: &mut Jobs) -> Result<Outcome> {
    let program = Program::new(argv)?;
    launch_program(&program, policy, jobs)
}

pub fn launch_program(program: &Program, policy: WaitPolicy, jobs: &mut Jobs) -> Result<Outcome> {
    let pid = spawn(program, || Ok(()))?;
    settle(pid, policy, jobs)
}
