use nix::fcntl::{fcntl, open, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;
use std::os::unix::io::RawFd;
use std::path::Path;
use tracing::{debug, warn};
use super::{flush_stdout, launch_program, Fd, Jobs, Outcome, Program, WaitPolicy};
use super::super::super::error::{Error, Result};
use super::super::super::syntax::tokens::{Direction, Redirect};

/// Holds a standard descriptor swapped onto a file. Dropping it puts the
/// original descriptor back, whichever way the caller leaves its scope.
#[derive(Debug)]
pub struct Redirection {
    target: RawFd,
    saved: RawFd,
}

impl Redirection {
    /// Opens `path` for `direction` and swaps it onto stdin or stdout.
    ///
    /// Output files are created when missing and appended to otherwise.
    /// Input files must exist.
    pub fn open(path: &str, direction: Direction) -> Result<Redirection> {
        let flags = match direction {
            Direction::Input => OFlag::O_RDONLY,
            Direction::Output => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        };
        let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IWGRP | Mode::S_IROTH | Mode::S_IWOTH;
        let file = open(Path::new(path), flags | OFlag::O_CLOEXEC, mode).map_err(|source| Error::File {
            path: String::from(path),
            source,
        })?;
        Redirection::swap(direction.fd(), &Fd::new(file))
    }

    fn swap(target: RawFd, file: &Fd) -> Result<Redirection> {
        flush_stdout();
        let saved = unistd::dup(target).map_err(Error::Redirect)?;
        let guard = Redirection { target, saved };
        // keeps the saved copy out of the children
        fcntl(saved, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(Error::Redirect)?;
        unistd::dup2(file.raw(), target).map_err(Error::Redirect)?;
        debug!(fd = target, saved, "standard descriptor redirected");
        Ok(guard)
    }
}

impl Drop for Redirection {
    fn drop(&mut self) {
        flush_stdout();
        if let Err(errno) = unistd::dup2(self.saved, self.target) {
            warn!(fd = self.target, %errno, "failed to restore standard descriptor");
        }
        if let Err(errno) = unistd::close(self.saved) {
            warn!(fd = self.saved, %errno, "failed to close saved descriptor");
        }
    }
}

/// Runs `argv[..redirect.operator]` with stdin or stdout swapped onto the
/// file named at `redirect.file`.
pub fn launch_redirected(argv: &[String], redirect: Redirect, policy: WaitPolicy, jobs: &mut Jobs) -> Result<Outcome> {
    let path = match argv.get(redirect.file) {
        Some(path) if redirect.file > redirect.operator => path,
        _ => {
            return Err(Error::Syntax(format!("expected a file name after `{}`", redirect.direction)));
        }
    };
    let program = Program::new(&argv[..redirect.operator])?;
    let _redirection = Redirection::open(path, redirect.direction)?;
    launch_program(&program, policy, jobs)
}
