use nom::bytes::complete::is_not;
use nom::character::complete::{multispace0, multispace1};
use nom::combinator::all_consuming;
use nom::multi::separated_list0;
use nom::sequence::delimited;
use nom::IResult;
use super::super::error::{Error, Result};

fn word(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n")(input)
}

fn words(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(multispace0, separated_list0(multispace1, word), multispace0)(input)
}

/// Splits one input line into owned words. Any of space, tab, CR or LF
/// separates words. Blank lines give no words.
pub fn lex(line: &str) -> Result<Vec<String>> {
    let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
    match all_consuming(words)(line) {
        Ok((_, tokens)) => Ok(tokens.into_iter().map(String::from).collect()),
        Err(_) => Err(Error::Syntax(String::from("cannot split line into words"))),
    }
}
