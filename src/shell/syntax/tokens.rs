use std::fmt;
use std::os::unix::io::RawFd;
use nix::libc;

pub const PIPE: &str = "|";
pub const INPUT: &str = "<";
pub const OUTPUT: &str = ">";
pub const BACKGROUND: &str = "&";
pub const REPEAT: &str = "!!";
pub const EXIT: &str = "exit";

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn from_token(token: &str) -> Option<Direction> {
        match token {
            INPUT => Some(Direction::Input),
            OUTPUT => Some(Direction::Output),
            _ => None,
        }
    }

    /// The standard descriptor this direction replaces.
    pub fn fd(self) -> RawFd {
        match self {
            Direction::Input => libc::STDIN_FILENO,
            Direction::Output => libc::STDOUT_FILENO,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Direction::Input => f.write_str(INPUT),
            Direction::Output => f.write_str(OUTPUT),
        }
    }
}

/// A redirection operator and the position of its file name.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Redirect {
    pub direction: Direction,
    pub operator: usize,
    pub file: usize,
}

/// Positions of the special tokens found in one scan of an argument vector.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct SpecialTokens {
    pub redirect: Option<Redirect>,
    pub pipe: Option<usize>,
    /// Position the trailing `&` had before it was dropped from the vector.
    pub background: Option<usize>,
}
