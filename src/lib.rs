//! `osh`, a small line-oriented command interpreter.
//!
//! One line per cycle: the line is split into words, classified as a plain,
//! background, piped or redirected command, and run as child processes with
//! `fork`/`exec`. `!!` replays the last command.

pub mod shell;
