mod config;
pub mod error;
pub mod history;
pub mod state;
pub mod syntax;
pub use self::config::Config;
use self::error::Error;
use self::state::jobs::{flush_stdout, Outcome};
use self::state::{ShellState, Step};
use std::io::{self, BufRead};
use std::process::ExitCode;
use termion::color;
use tracing::debug;

pub struct Shell {
    state: ShellState,
    config: Config,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Shell {
            state: ShellState::new(),
            config,
        }
    }

    /// Reads commands from stdin until `exit` or end of input. The prompt is
    /// only shown when stdin is a terminal.
    pub fn run_interactive(&mut self) -> ExitCode {
        let stdin = io::stdin();
        let interactive = termion::is_tty(&stdin);
        let mut input = stdin.lock();
        let mut line = Vec::new();
        loop {
            if interactive {
                self.prompt();
            }
            line.clear();
            match input.read_until(b'\n', &mut line) {
                Ok(0) => {
                    if interactive {
                        println!();
                    }
                    return ExitCode::SUCCESS;
                }
                Ok(_) => {
                    if let Step::Exit = self.handle(&String::from_utf8_lossy(&line)) {
                        return ExitCode::SUCCESS;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read input");
                    report(&Error::Input(e));
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    /// Runs one line and prints whatever the user should see about it.
    /// `max_line` bounds the encoded length, not the number of characters.
    pub fn handle(&mut self, line: &str) -> Step {
        let length = line.trim_end_matches(|c: char| c == '\n' || c == '\r').len();
        if length > self.config.max_line {
            report(&Error::LineTooLong { limit: self.config.max_line });
            return Step::Idle;
        }
        match self.state.dispatch(line) {
            Ok(step) => {
                match &step {
                    Step::Ran(Outcome::Background(pid))
                    | Step::Repeated { outcome: Outcome::Background(pid), .. } => {
                        println!("{}", pid);
                    }
                    Step::Ran(outcome) | Step::Repeated { outcome, .. } => {
                        debug!(?outcome, "command finished");
                    }
                    Step::Idle | Step::Exit => {}
                }
                step
            }
            Err(e) => {
                report(&e);
                Step::Idle
            }
        }
    }

    fn prompt(&self) {
        if self.config.color {
            print!("{}{}{}", color::Fg(color::Green), self.config.prompt, color::Fg(color::Reset));
        } else {
            print!("{}", self.config.prompt);
        }
        flush_stdout();
    }
}

fn report(e: &Error) {
    flush_stdout();
    eprintln!("osh: {}", e);
}
