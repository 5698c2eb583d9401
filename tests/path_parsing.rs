//! Integration tests for path data parsing and error reporting

use diagram_kernel::geometry::{GeometryError, Path, Point};
use diagram_kernel::ParseError;
use pretty_assertions::assert_eq;

fn serialize(data: &str) -> String {
    Path::parse(data)
        .expect("Should parse")
        .serialize()
        .expect("Should serialize")
}

fn parse_error(data: &str) -> ParseError {
    match Path::parse(data) {
        Err(GeometryError::Parse(err)) => err,
        other => panic!("expected a parse error for {:?}, got {:?}", data, other),
    }
}

#[test]
fn test_argument_chaining() {
    insta::assert_snapshot!(serialize("M 0 0 10 0 10 10 Z"), @"M 0 0 L 10 0 L 10 10 Z");
    insta::assert_snapshot!(serialize("M 0 0 C 1 1 2 2 3 3 4 4 5 5 6 6"), @"M 0 0 C 1 1 2 2 3 3 C 4 4 5 5 6 6");
}

#[test]
fn test_compact_data() {
    insta::assert_snapshot!(serialize("M0,0L10-5C1 2 3 4 5 6z"), @"M 0 0 L 10 -5 C 1 2 3 4 5 6 Z");
    insta::assert_snapshot!(serialize("M1e2,0 L.5,.5"), @"M 100 0 L 0.5 0.5");
}

#[test]
fn test_empty_data() {
    let path = Path::parse("").unwrap();
    assert!(path.is_empty());
    assert_eq!(path.serialize().unwrap(), "");
}

#[test]
fn test_data_without_moveto_is_parsed_but_invalid() {
    let path = Path::parse("L 10 10").unwrap();
    assert!(!path.is_valid());
    assert!(matches!(path.serialize(), Err(GeometryError::InvalidPath)));
    // the first segment has nothing before it to start from
    assert_eq!(path.get_segment(0).unwrap().start, None);
    assert_eq!(path.get_segment(0).unwrap().end, Point::new(10.0, 10.0));
}

#[test]
fn test_unknown_command() {
    let err = parse_error("M 0 0 Q 1 1 2 2");
    let ParseError::Syntax { span, message, .. } = &err;
    assert_eq!(span.start, 6);
    assert_eq!(message, "Q is not a recognized path segment type.");
}

#[test]
fn test_wrong_arity() {
    let err = parse_error("M 0 0 C 1 1 2 2");
    let ParseError::Syntax { message, .. } = &err;
    assert_eq!(message, "segment 'C' expects 6 coordinates, got 4");

    let err = parse_error("M 0 0 Z 5");
    let ParseError::Syntax { message, .. } = &err;
    assert_eq!(message, "segment 'Z' expects 0 coordinates, got 1");
}

#[test]
fn test_leading_number() {
    let err = parse_error("10 10");
    let ParseError::Syntax { span, message, .. } = &err;
    assert_eq!(span, &(0..2));
    assert_eq!(message, "Unexpected number 10");
}

#[test]
fn test_unexpected_character() {
    let err = parse_error("M 0 0 L 1 # 2");
    let ParseError::Syntax { span, message, .. } = &err;
    assert_eq!(span, &(10..11));
    assert_eq!(message, "Unexpected character '#'");
}

#[test]
fn test_formatted_report_names_source() {
    let data = "M 0 0 Q 1 1 2 2";
    let report = parse_error(data).format(data, "<path>");
    assert!(report.contains("Q is not a recognized path segment type."));
    assert!(report.contains("<path>"));
}
