//! Path data parser using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use tracing::debug;

use super::lexer::{lex, Token};
use super::segment::Segment;
use crate::error::{ParseError, Span};

/// Parse path data into unlinked segments
///
/// Accepts the `M`, `L`, `C`, `Z` and `z` commands with argument chaining.
/// Data need not start with a moveto.
pub fn parse_segments(input: &str) -> Result<Vec<Segment>, ParseError> {
    let len = input.len();
    let tokens = lex(input)?;
    let command_count = tokens
        .iter()
        .filter(|(t, _)| matches!(t, Token::Command(_)))
        .count();

    let token_stream = Stream::from_iter(tokens.into_iter().map(|(tok, span)| (tok, span.into())))
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let commands = path_data_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(ParseError::from)
                .unwrap_or_else(|| ParseError::at(0..len, "Invalid path data"))
        })?;

    let mut segments = Vec::with_capacity(commands.len());
    for command in commands {
        let created = Segment::create(command.letter, &command.coords)
            .map_err(|err| ParseError::at(command.span.clone(), err.to_string()))?;
        segments.extend(created);
    }

    debug!(commands = command_count, segments = segments.len(), "parsed path data");
    Ok(segments)
}

/// A command letter with its trailing coordinates, before arity checks
#[derive(Debug, Clone)]
struct RawCommand {
    letter: char,
    coords: Vec<f64>,
    span: Span,
}

fn path_data_parser<'a, I>() -> impl Parser<'a, I, Vec<RawCommand>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let command = select! { Token::Command(c) => c }.labelled("path command");
    let number = select! { Token::Number(n) => n }.labelled("number");

    command
        .then(number.repeated().collect::<Vec<f64>>())
        .map_with(|(letter, coords), e| {
            let span: SimpleSpan = e.span();
            RawCommand {
                letter,
                coords,
                span: span.into_range(),
            }
        })
        .repeated()
        .collect::<Vec<RawCommand>>()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;

    #[test]
    fn test_parse_simple() {
        let segments = parse_segments("M0,0 L10,0 L10,10 Z").unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], Segment::moveto(Point::new(0.0, 0.0)));
        assert_eq!(segments[3], Segment::Closepath);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_segments("").unwrap().is_empty());
        assert!(parse_segments("  ").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_segments("M 0 0 Q 1 1 2 2").unwrap_err();
        let ParseError::Syntax { span, message, .. } = err;
        assert_eq!(span.start, 6);
        assert_eq!(message, "Q is not a recognized path segment type.");
    }

    #[test]
    fn test_wrong_arity() {
        let err = parse_segments("M 0 0 L 1").unwrap_err();
        let ParseError::Syntax { message, .. } = err;
        assert_eq!(message, "segment 'L' expects 2 coordinates, got 1");
    }

    #[test]
    fn test_leading_number() {
        assert!(parse_segments("10 10").is_err());
    }
}
