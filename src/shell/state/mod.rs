use super::error::{Error, Result};
use super::history::History;
use super::syntax::ast::{Command, Mode};
use super::syntax::tokens::{Direction, Redirect, EXIT, REPEAT};
use super::syntax::{lexer, parser};
use tracing::debug;
pub mod jobs;
use self::jobs::{Jobs, Outcome, WaitPolicy};

/// What a dispatch cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to run, e.g. a blank line.
    Idle,
    /// `!!` replayed `command`, which was echoed to stdout before it ran.
    Repeated { command: Command, outcome: Outcome },
    Ran(Outcome),
    Exit,
}

/// State that survives from one cycle to the next: the last command and the
/// background children not reaped yet.
pub struct ShellState {
    history: History,
    jobs: Jobs,
}

impl ShellState {
    pub fn new() -> Self {
        ShellState {
            history: History::new(),
            jobs: Jobs::new(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn jobs(&self) -> &Jobs {
        &self.jobs
    }

    /// Runs one input line to completion (or to the background).
    pub fn dispatch(&mut self, line: &str) -> Result<Step> {
        self.jobs.reap();
        let tokens = lexer::lex(line)?;
        let first = match tokens.first() {
            Some(first) => first.clone(),
            None => return Ok(Step::Idle),
        };
        match first.as_str() {
            EXIT => Ok(Step::Exit),
            REPEAT => {
                if tokens.len() > 1 {
                    return Err(Error::Syntax(format!("`{}` takes no arguments", REPEAT)));
                }
                let command = self.history.recall().ok_or(Error::EmptyHistory)?;
                println!("{}", command);
                let outcome = self.run(&command)?;
                Ok(Step::Repeated { command, outcome })
            }
            _ => {
                let command = parser::classify(tokens)?;
                self.history.remember(command.argv().to_vec(), command.specials());
                self.run(&command).map(Step::Ran)
            }
        }
    }

    /// Routes a classified command to the matching launcher.
    pub fn run(&mut self, command: &Command) -> Result<Outcome> {
        let policy = WaitPolicy::from_background(command.is_background());
        let argv = command.argv();
        debug!(%command, mode = ?command.mode(), ?policy, "dispatching");
        match command.mode() {
            Mode::Plain | Mode::Background => jobs::launch(argv, policy, &mut self.jobs),
            Mode::Pipe { index } => jobs::pipeline::launch_pipe(argv, index, policy, &mut self.jobs),
            Mode::InputRedirect { operator, file } => {
                let redirect = Redirect { direction: Direction::Input, operator, file };
                jobs::redirect::launch_redirected(argv, redirect, policy, &mut self.jobs)
            }
            Mode::OutputRedirect { operator, file } => {
                let redirect = Redirect { direction: Direction::Output, operator, file };
                jobs::redirect::launch_redirected(argv, redirect, policy, &mut self.jobs)
            }
        }
    }
}

impl Default for ShellState {
    fn default() -> Self {
        ShellState::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_do_nothing() {
        let mut state = ShellState::new();
        assert_eq!(state.dispatch("\n").unwrap(), Step::Idle);
        assert_eq!(state.dispatch("   \t\n").unwrap(), Step::Idle);
        assert!(state.history().is_empty());
    }

    #[test]
    fn exit_ignores_history() {
        let mut state = ShellState::new();
        assert_eq!(state.dispatch("exit\n").unwrap(), Step::Exit);
        state.dispatch("true\n").unwrap();
        assert_eq!(state.dispatch("exit now\n").unwrap(), Step::Exit);
    }

    #[test]
    fn repeat_without_history() {
        let mut state = ShellState::new();
        assert!(matches!(state.dispatch("!!\n"), Err(Error::EmptyHistory)));
        assert!(state.jobs().is_empty());
    }

    #[test]
    fn repeat_replays_last_command() {
        let mut state = ShellState::new();
        assert_eq!(state.dispatch("true\n").unwrap(), Step::Ran(Outcome::Exited(0)));
        assert_eq!(state.dispatch("false\n").unwrap(), Step::Ran(Outcome::Exited(1)));
        match state.dispatch("!!\n").unwrap() {
            Step::Repeated { command, outcome } => {
                assert_eq!(command.argv(), &["false"][..]);
                assert_eq!(outcome, Outcome::Exited(1));
            }
            other => panic!("unexpected {:?}", other),
        }
        // `!!` leaves the entry in place
        assert_eq!(state.history().recall().unwrap().argv(), &["false"][..]);
    }

    #[test]
    fn repeat_rejects_arguments() {
        let mut state = ShellState::new();
        state.dispatch("true\n").unwrap();
        assert!(matches!(state.dispatch("!! extra\n"), Err(Error::Syntax(_))));
    }

    #[test]
    fn rejected_commands_are_not_remembered() {
        let mut state = ShellState::new();
        state.dispatch("true\n").unwrap();
        assert!(matches!(state.dispatch("a | b | c\n"), Err(Error::Capability(_))));
        assert_eq!(state.history().recall().unwrap().argv(), &["true"][..]);
    }

    #[test]
    fn half_pipe_keeps_previous_entry() {
        let mut state = ShellState::new();
        state.dispatch("true\n").unwrap();
        assert!(matches!(state.dispatch("ls |\n"), Err(Error::Syntax(_))));
        match state.dispatch("!!\n").unwrap() {
            Step::Repeated { command, outcome } => {
                assert_eq!(command.argv(), &["true"][..]);
                assert_eq!(outcome, Outcome::Exited(0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn failed_exec_is_still_remembered() {
        let mut state = ShellState::new();
        let step = state.dispatch("osh-test-no-such-program\n").unwrap();
        assert_eq!(step, Step::Ran(Outcome::Exited(jobs::EXEC_FAILURE)));
        assert!(!state.history().is_empty());
    }
}
