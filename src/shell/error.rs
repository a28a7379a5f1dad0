use nix::errno::Errno;
use std::io;
use thiserror::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

/// Everything that can go wrong during one dispatch cycle.
///
/// None of these end the interpreter except `Input`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fork: {0}")]
    Spawn(#[source] Errno),

    /// Only ever built inside a child whose `execvp` failed.
    #[error("{program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: Errno,
    },

    #[error("cannot open `{path}`: {source}")]
    File {
        path: String,
        #[source]
        source: Errno,
    },

    #[error("failed to redirect a standard descriptor: {0}")]
    Redirect(#[source] Errno),

    #[error("failed to create pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] Errno),

    #[error("{0} is not supported")]
    Capability(&'static str),

    #[error("no recent command in history")]
    EmptyHistory,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("argument contains a NUL byte")]
    StringEncoding,

    #[error("command too long (the limit is {limit} bytes)")]
    LineTooLong { limit: usize },

    #[error("failed to read input: {0}")]
    Input(#[from] io::Error),
}
