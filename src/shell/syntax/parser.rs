use super::ast::*;
use super::tokens::*;
use super::super::error::{Error, Result};

/// Records the special tokens of `argv` in a single left-to-right pass.
pub fn scan(argv: &[String]) -> Result<SpecialTokens> {
    let mut specials = SpecialTokens::default();
    let mut extra_redirect: Option<usize> = None;
    let last = argv.len().saturating_sub(1);
    for (index, token) in argv.iter().enumerate() {
        match token.as_str() {
            PIPE => {
                if specials.pipe.is_some() {
                    return Err(Error::Capability("more than one pipe"));
                }
                specials.pipe = Some(index);
            }
            BACKGROUND if index == last => specials.background = Some(index),
            other => {
                if let Some(direction) = Direction::from_token(other) {
                    if specials.redirect.is_some() {
                        extra_redirect = extra_redirect.or(Some(index));
                    } else {
                        specials.redirect = Some(Redirect {
                            direction,
                            operator: index,
                            file: index + 1,
                        });
                    }
                }
            }
        }
    }

    if let Some(index) = extra_redirect {
        return Err(Error::Syntax(format!(
            "only one redirection is allowed, found another `{}`",
            argv[index]
        )));
    }
    if specials.pipe.is_some() && specials.redirect.is_some() {
        return Err(Error::Capability("combining a pipe with a redirection"));
    }
    Ok(specials)
}

/// Classifies a word list into a `Command`. The trailing `&`, when present,
/// is dropped from the argument vector.
pub fn classify(mut argv: Vec<String>) -> Result<Command> {
    let specials = scan(&argv)?;
    let end = specials.background.unwrap_or(argv.len());
    if end == 0 {
        return Err(Error::Syntax(format!("missing command before `{}`", BACKGROUND)));
    }
    if let Some(index) = specials.pipe {
        if index == 0 {
            return Err(Error::Syntax(format!("missing command before `{}`", PIPE)));
        }
        if index + 1 >= end {
            return Err(Error::Syntax(format!("missing command after `{}`", PIPE)));
        }
    }
    if let Some(redirect) = specials.redirect {
        if redirect.operator == 0 {
            return Err(Error::Syntax(format!("missing command before `{}`", redirect.direction)));
        }
        if redirect.file >= end {
            return Err(Error::Syntax(format!("expected a file name after `{}`", redirect.direction)));
        }
        if redirect.file + 1 < end {
            return Err(Error::Syntax(format!(
                "unexpected `{}` after `{} {}`",
                argv[redirect.file + 1],
                redirect.direction,
                argv[redirect.file]
            )));
        }
    }
    argv.truncate(end);
    Ok(Command::from_parts(argv, specials))
}
