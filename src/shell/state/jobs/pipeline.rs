use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc;
use nix::unistd::{self, Pid};
use tracing::debug;
use super::{settle, spawn, wait_for, Fd, Jobs, Outcome, Program, WaitPolicy};
use super::super::super::error::{Error, Result};
use super::super::super::syntax::tokens::PIPE;

/// Both ends of one `pipe2()`, created close-on-exec so that only the
/// descriptors a child `dup2`s onto its standard streams survive into the new
/// image.
struct Channel {
    read: Fd,
    write: Fd,
}

impl Channel {
    fn open() -> Result<Channel> {
        let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(Error::Pipe)?;
        Ok(Channel {
            read: Fd::new(read),
            write: Fd::new(write),
        })
    }
}

/// Blocks until the write end of a close-on-exec handshake pipe is gone in
/// every process, i.e. the child has either exec'd or exited.
fn await_exec(handshake: Channel) -> Result<()> {
    let Channel { read, write } = handshake;
    drop(write);
    let mut buf = [0u8; 16];
    loop {
        match unistd::read(read.raw(), &mut buf) {
            Ok(0) => return Ok(()),
            Ok(_) | Err(Errno::EINTR) => continue,
            Err(errno) => return Err(Error::Pipe(errno)),
        }
    }
}

/// Starts the writing side of the pipeline and returns once it is running
/// with its stdout attached to `channel`.
fn spawn_writer(program: &Program, channel: &Channel) -> Result<Pid> {
    let handshake = Channel::open()?;
    let pid = spawn(program, || {
        unistd::close(handshake.read.raw())?;
        unistd::close(channel.read.raw())?;
        unistd::dup2(channel.write.raw(), libc::STDOUT_FILENO)?;
        unistd::close(channel.write.raw())?;
        Ok(())
    })?;
    await_exec(handshake)?;
    Ok(pid)
}

fn spawn_reader(program: &Program, channel: &Channel) -> Result<Pid> {
    spawn(program, || {
        unistd::close(channel.write.raw())?;
        unistd::dup2(channel.read.raw(), libc::STDIN_FILENO)?;
        unistd::close(channel.read.raw())?;
        Ok(())
    })
}

/// Waits for both stages, reaping the reader even when the writer's wait
/// fails. The first failure is reported.
fn wait_both(writer: Pid, reader: Pid) -> Result<Outcome> {
    let left = wait_for(writer);
    let right = wait_for(reader);
    left?;
    right
}

/// Runs `argv[..index] | argv[index + 1..]`. The status of the right-hand
/// command is the status of the pipeline.
pub fn launch_pipe(argv: &[String], index: usize, policy: WaitPolicy, jobs: &mut Jobs) -> Result<Outcome> {
    if index >= argv.len() {
        return Err(Error::Syntax(format!("missing command after `{}`", PIPE)));
    }
    let (left, right) = (&argv[..index], &argv[index + 1..]);
    if left.is_empty() {
        return Err(Error::Syntax(format!("missing command before `{}`", PIPE)));
    }
    if right.is_empty() {
        return Err(Error::Syntax(format!("missing command after `{}`", PIPE)));
    }
    let left = Program::new(left)?;
    let right = Program::new(right)?;

    let channel = Channel::open()?;
    let writer = spawn_writer(&left, &channel)?;
    let reader = match spawn_reader(&right, &channel) {
        Ok(pid) => pid,
        Err(error) => {
            // the writer sees EPIPE or finishes once the channel is closed
            drop(channel);
            let _ = wait_for(writer);
            return Err(error);
        }
    };
    drop(channel);
    debug!(%writer, %reader, "pipeline running");

    match policy {
        WaitPolicy::Foreground => wait_both(writer, reader),
        WaitPolicy::Background => {
            jobs.register(writer);
            settle(reader, policy, jobs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::fcntl::{fcntl, FcntlArg, FdFlag};

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| String::from(*w)).collect()
    }

    #[test]
    fn channel_ends_are_close_on_exec() {
        let channel = Channel::open().unwrap();
        for fd in &[&channel.read, &channel.write] {
            let flags = fcntl(fd.raw(), FcntlArg::F_GETFD).unwrap();
            assert!(FdFlag::from_bits_truncate(flags).contains(FdFlag::FD_CLOEXEC));
        }
    }

    #[test]
    fn reader_is_reaped_when_writer_wait_fails() {
        // pid 1 is never our child, so waiting on it fails with ECHILD
        let reader = spawn(&Program::new(&argv(&["true"])).unwrap(), || Ok(())).unwrap();
        assert!(matches!(wait_both(Pid::from_raw(1), reader), Err(Error::Wait(Errno::ECHILD))));
        assert!(matches!(wait_for(reader), Err(Error::Wait(Errno::ECHILD))));
    }

    #[test]
    fn bytes_flow_from_writer_to_reader() {
        let mut jobs = Jobs::new();
        let found = argv(&["echo", "hello", "|", "grep", "-q", "hello"]);
        assert_eq!(launch_pipe(&found, 2, WaitPolicy::Foreground, &mut jobs).unwrap(), Outcome::Exited(0));
        let missing = argv(&["echo", "hello", "|", "grep", "-q", "bye"]);
        assert_eq!(launch_pipe(&missing, 2, WaitPolicy::Foreground, &mut jobs).unwrap(), Outcome::Exited(1));
    }

    #[test]
    fn reader_sees_end_of_stream() {
        // `wc` only finishes once every copy of the write end is closed
        let mut jobs = Jobs::new();
        let line = argv(&["printf", "abc", "|", "sh", "-c", "test \"$(wc -c)\" -eq 3"]);
        assert_eq!(launch_pipe(&line, 2, WaitPolicy::Foreground, &mut jobs).unwrap(), Outcome::Exited(0));
    }

    #[test]
    fn writer_larger_than_pipe_buffer() {
        let mut jobs = Jobs::new();
        let line = argv(&["head", "-c", "1000000", "/dev/zero", "|", "sh", "-c", "test \"$(wc -c)\" -eq 1000000"]);
        assert_eq!(launch_pipe(&line, 4, WaitPolicy::Foreground, &mut jobs).unwrap(), Outcome::Exited(0));
    }

    #[test]
    fn failed_writer_exec_still_runs_reader() {
        let mut jobs = Jobs::new();
        let line = argv(&["osh-test-no-such-program", "|", "sh", "-c", "test \"$(wc -c)\" -eq 0"]);
        assert_eq!(launch_pipe(&line, 1, WaitPolicy::Foreground, &mut jobs).unwrap(), Outcome::Exited(0));
    }

    #[test]
    fn empty_sides_spawn_nothing() {
        let mut jobs = Jobs::new();
        assert!(matches!(launch_pipe(&argv(&["|", "wc"]), 0, WaitPolicy::Foreground, &mut jobs), Err(Error::Syntax(_))));
        assert!(matches!(launch_pipe(&argv(&["ls", "|"]), 1, WaitPolicy::Foreground, &mut jobs), Err(Error::Syntax(_))));
    }

    #[test]
    fn background_pipeline_registers_both_stages() {
        let mut jobs = Jobs::new();
        let line = argv(&["echo", "hi", "|", "cat"]);
        let outcome = launch_pipe(&line, 2, WaitPolicy::Background, &mut jobs).unwrap();
        let reader = match outcome {
            Outcome::Background(pid) => pid,
            other => panic!("expected a background pid, got {:?}", other),
        };
        // whatever the first poll did not reap is still tracked
        for pid in jobs.pids().to_vec() {
            wait_for(pid).unwrap();
        }
        jobs.reap();
        assert!(jobs.is_empty());
        assert!(reader.as_raw() > 0);
    }
}
