use super::syntax::ast::Command;
use super::syntax::tokens::SpecialTokens;

/// A remembered command, replayed by `!!`.
pub type Entry = Command;

/// Holds the most recently classified command. Each `remember` replaces the
/// previous entry as a whole.
#[derive(Debug, Default)]
pub struct History {
    entry: Option<Entry>,
}

impl History {
    pub fn new() -> History {
        History { entry: None }
    }

    pub fn remember(&mut self, argv: Vec<String>, specials: SpecialTokens) {
        self.entry = Some(Command::from_parts(argv, specials));
    }

    pub fn recall(&self) -> Option<Entry> {
        self.entry.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::syntax::parser::classify;

    fn command(line: &str) -> Command {
        classify(line.split_whitespace().map(String::from).collect()).unwrap()
    }

    #[test]
    fn starts_empty() {
        let history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.recall(), None);
    }

    #[test]
    fn remember_replaces_previous_entry() {
        let mut history = History::new();
        let first = command("ls -l");
        let second = command("echo hi > out.txt");
        history.remember(first.argv().to_vec(), first.specials());
        history.remember(second.argv().to_vec(), second.specials());
        assert_eq!(history.recall(), Some(second));
    }

    #[test]
    fn recall_keeps_the_indices() {
        let mut history = History::new();
        let piped = command("cat notes | wc -l &");
        history.remember(piped.argv().to_vec(), piped.specials());
        let entry = history.recall().unwrap();
        assert_eq!(entry.mode(), piped.mode());
        assert!(entry.is_background());
        // recall does not consume the entry
        assert!(history.recall().is_some());
    }
}
