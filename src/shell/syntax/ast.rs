use super::tokens::*;
use std::fmt;

/// How a command is dispatched.
///
/// When several operators could apply the priority is pipe, output
/// redirection, input redirection, background, plain. The classifier rejects
/// the combinations that would make this order drop an operator.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Mode {
    Plain,
    Background,
    Pipe { index: usize },
    InputRedirect { operator: usize, file: usize },
    OutputRedirect { operator: usize, file: usize },
}

/// A classified command: its argument vector (trailing `&` already dropped)
/// and the special-token positions found in it.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Command {
    argv: Vec<String>,
    specials: SpecialTokens,
}

impl Command {
    pub fn from_parts(argv: Vec<String>, specials: SpecialTokens) -> Self {
        Command { argv, specials }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn specials(&self) -> SpecialTokens {
        self.specials
    }

    pub fn is_background(&self) -> bool {
        self.specials.background.is_some()
    }

    pub fn mode(&self) -> Mode {
        if let Some(index) = self.specials.pipe {
            return Mode::Pipe { index };
        }
        match self.specials.redirect {
            Some(Redirect { direction: Direction::Output, operator, file }) => {
                Mode::OutputRedirect { operator, file }
            }
            Some(Redirect { direction: Direction::Input, operator, file }) => {
                Mode::InputRedirect { operator, file }
            }
            None if self.is_background() => Mode::Background,
            None => Mode::Plain,
        }
    }
}

/// Renders the command the way it was typed, background marker included.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.argv.join(" "))?;
        if self.is_background() {
            write!(f, " {}", BACKGROUND)?;
        }
        Ok(())
    }
}
