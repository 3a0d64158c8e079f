//! Source preprocessing
//!
//! Runs before tokenization: joins lines broken inside a bracketed field,
//! then applies the grammar's header rules in order, splicing every match
//! out of the text it was found in.

use crate::grammar::{CompiledGrammar, HeaderMatcher};
use crate::models::HeaderField;

/// Preprocessed source: extracted header fields and residual text, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Header(HeaderField),
}

fn bracket_balance(line: &str) -> i32 {
    line.chars().fold(0, |depth, c| match c {
        '(' | '[' | '{' => depth + 1,
        ')' | ']' | '}' => depth - 1,
        _ => depth,
    })
}

/// Join a line that leaves a bracket open with the following lines until
/// the brackets balance. A line whose brackets never balance is left alone.
pub fn repair_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut repaired = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let mut depth = bracket_balance(lines[i]);
        if depth <= 0 {
            repaired.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let mut end = None;
        for (j, line) in lines.iter().enumerate().skip(i + 1) {
            depth += bracket_balance(line);
            if depth <= 0 {
                end = Some(j);
                break;
            }
        }

        match end {
            Some(j) => {
                repaired.push(lines[i..=j].join("\n"));
                i = j + 1;
            }
            None => {
                repaired.push(lines[i].to_string());
                i += 1;
            }
        }
    }

    repaired
}

fn push_text(out: &mut Vec<Segment>, text: &str) {
    if !text.trim().is_empty() {
        out.push(Segment::Text(text.to_string()));
    }
}

/// Split one text segment around every match of a header rule
fn splice(matcher: &HeaderMatcher, text: &str) -> Vec<Segment> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(caps) = matcher.find(rest) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        if whole.as_str().is_empty() {
            break;
        }
        let (start, end) = (whole.start(), whole.end());

        push_text(&mut out, &rest[..start]);
        if let Some(field) = &matcher.field {
            match caps.name(field) {
                Some(value) => out.push(Segment::Header(HeaderField::new(field, value.as_str()))),
                None => log::warn!(
                    "Malformed header field '{}' in {:?}, dropping",
                    field,
                    whole.as_str()
                ),
            }
        }
        rest = &rest[end..];
    }

    push_text(&mut out, rest);
    out
}

/// Repair the source and extract its header fields
pub fn preprocess(grammar: &CompiledGrammar, source: &str) -> Vec<Segment> {
    let mut segments: Vec<Segment> = repair_lines(source)
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .map(Segment::Text)
        .collect();

    for matcher in grammar.header_matchers() {
        segments = segments
            .into_iter()
            .flat_map(|segment| match segment {
                Segment::Text(text) => splice(matcher, &text),
                header => vec![header],
            })
            .collect();
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> CompiledGrammar {
        CompiledGrammar::from_json(
            r#"{
                "_docstring": {
                    "FormatName": "Headers",
                    "HeaderInfo": [
                        {"pattern": "Bagpipe Reader:[0-9.]+"},
                        {"field": "title", "pattern": "\"(?P<title>[^\"]*)\",\\(T,[^)]*\\)"},
                        {"field": "footer", "pattern": "\"(?P<footer>[^\"]*)\",\\([FIX],[^)]*\\)"},
                        {"field": "tempo", "pattern": "TuneTempo,(?P<speed>[0-9]+)"}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_repair_joins_open_bracket() {
        let lines = repair_lines("\"A\",(F,R,0,0,Times New\nRoman,10)\nLA_4");
        assert_eq!(lines, vec!["\"A\",(F,R,0,0,Times New\nRoman,10)", "LA_4"]);
    }

    #[test]
    fn test_repair_leaves_unbalanced_line() {
        let lines = repair_lines("(never closed\nLA_4\nB_4");
        assert_eq!(lines, vec!["(never closed", "LA_4", "B_4"]);
    }

    #[test]
    fn test_filter_header_is_dropped() {
        let segments = preprocess(&grammar(), "Bagpipe Reader:1.0\nLA_4");
        assert_eq!(segments, vec![Segment::Text("LA_4".to_string())]);
    }

    #[test]
    fn test_inline_header_splits_line() {
        let segments = preprocess(&grammar(), "B_32 \"Slide\",(I,L,0,0) C_16");
        assert_eq!(
            segments,
            vec![
                Segment::Text("B_32 ".to_string()),
                Segment::Header(HeaderField::new("footer", "Slide")),
                Segment::Text(" C_16".to_string()),
            ]
        );
    }

    #[test]
    fn test_header_across_lines() {
        let segments = preprocess(&grammar(), "\"Long title\",(T,C,0,\n0)\nLA_4");
        assert_eq!(
            segments,
            vec![
                Segment::Header(HeaderField::new("title", "Long title")),
                Segment::Text("LA_4".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_field_group_is_dropped() {
        let segments = preprocess(&grammar(), "TuneTempo,90 LA_4");
        assert_eq!(segments, vec![Segment::Text(" LA_4".to_string())]);
    }
}
