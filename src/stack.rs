//! Stack-trace parsing for the two common engine grammars.
//!
//! V8-style engines print `    at fn (file:line:col)` / `    at file:line:col`;
//! Gecko and WebKit print `fn@file:line:col` / `file:line:col`. Each line is
//! tried against the grammars in order and the first match decides; lines
//! that match neither, or whose position is not a positive integer, are
//! dropped rather than guessed at. A `FUNC@` prefix never contains `:`, so
//! an `@` inside a bare frame's URL (`pkg@1.2.3/x.js`) stays part of the file.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};
use serde::Serialize;
use url::Url;

use crate::model::ErrorObject;

pub const ANONYMOUS: &str = "<anonymous>";

static AT_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*at\s+(?:(.*?)\s+\()?(.+?):([^:]+):([^:]+?)\)?\s*$").expect("valid frame grammar")
});

static AT_SIGN_FRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([^@:]*)@)?(.+?):([^:]+):([^:]+?)\s*$").expect("valid frame grammar")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackFrame {
    pub function_name: String,
    /// File reference exactly as the stack printed it.
    pub raw_file: String,
    /// Last path segment of the resolved reference.
    pub display_file: String,
    pub full_file_url: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    /// `at FUNC (FILE:LINE:COL)` or `at FILE:LINE:COL`
    At,
    /// `FUNC@FILE:LINE:COL` or `FILE:LINE:COL`
    AtSign,
}

impl Grammar {
    const PRIORITY: [Grammar; 2] = [Grammar::At, Grammar::AtSign];

    fn regex(self) -> &'static Regex {
        match self {
            Grammar::At => &AT_FRAME,
            Grammar::AtSign => &AT_SIGN_FRAME,
        }
    }
}

/// Frames for `error`: parsed from its stack text, or a single frame built
/// from its `file_name`/`line_number`/`column_number` fields when the stack
/// is missing or yields nothing.
pub fn parse_error(error: &ErrorObject, origin: &Url) -> Vec<StackFrame> {
    let frames = error
        .stack
        .as_deref()
        .map(|stack| parse_stack(skip_header(stack, error), origin))
        .unwrap_or_default();
    if !frames.is_empty() {
        return frames;
    }
    location_frame(error, origin).into_iter().collect()
}

/// Parses stack text that carries no header line.
pub fn parse_stack(stack: &str, origin: &Url) -> Vec<StackFrame> {
    stack
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_line(line, origin))
        .collect()
}

fn parse_line(line: &str, origin: &Url) -> Option<StackFrame> {
    let caps = Grammar::PRIORITY
        .iter()
        .find_map(|grammar| grammar.regex().captures(line))?;
    frame_from_captures(&caps, origin)
}

fn frame_from_captures(caps: &Captures<'_>, origin: &Url) -> Option<StackFrame> {
    let line = position(caps.get(3)?.as_str())?;
    let column = position(caps.get(4)?.as_str())?;
    let function_name = caps
        .get(1)
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string();
    let raw_file = caps.get(2)?.as_str().trim().to_string();
    let (full_file_url, display_file) = resolve_file(&raw_file, origin);
    Some(StackFrame {
        function_name,
        raw_file,
        display_file,
        full_file_url,
        line,
        column,
    })
}

fn position(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

/// Drops the stack's own `Name: message` header, which may span several
/// lines when the message does.
fn skip_header<'a>(stack: &'a str, error: &ErrorObject) -> &'a str {
    let header = error.to_string();
    if !header.is_empty() {
        if let Some(rest) = stack.strip_prefix(header.as_str()) {
            if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
                return rest;
            }
        }
    }
    let Some((first, rest)) = stack.split_once('\n') else {
        return if is_header_line(stack, error) { "" } else { stack };
    };
    if is_header_line(first, error) { rest } else { stack }
}

fn is_header_line(line: &str, error: &ErrorObject) -> bool {
    let line = line.trim();
    !error.name.is_empty() && (line == error.name || line.starts_with(&format!("{}:", error.name)))
}

fn location_frame(error: &ErrorObject, origin: &Url) -> Option<StackFrame> {
    let raw_file = error.file_name.as_deref()?.trim();
    if raw_file.is_empty() {
        return None;
    }
    let line = error.line_number.filter(|n| *n >= 1)?;
    let column = error.column_number.filter(|n| *n >= 1).unwrap_or(1);
    let (full_file_url, display_file) = resolve_file(raw_file, origin);
    Some(StackFrame {
        function_name: ANONYMOUS.to_string(),
        raw_file: raw_file.to_string(),
        display_file,
        full_file_url,
        line,
        column,
    })
}

/// Returns `(full_file_url, display_file)`.
fn resolve_file(raw: &str, origin: &Url) -> (String, String) {
    let cleaned = raw.split('?').next().unwrap_or(raw).trim();
    let full = if is_absolute(cleaned) {
        cleaned.to_string()
    } else {
        let relative = cleaned.trim_start_matches('/');
        origin
            .join(relative)
            .map(String::from)
            .unwrap_or_else(|_| relative.to_string())
    };
    let display = full
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(&full)
        .to_string();
    (full, display)
}

fn is_absolute(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://app.test").unwrap()
    }

    #[test]
    fn v8_frame_with_function() {
        let frames = parse_stack("    at foo (/app/script:10:5)", &origin());
        assert_eq!(
            frames,
            vec![StackFrame {
                function_name: "foo".into(),
                raw_file: "/app/script".into(),
                display_file: "script".into(),
                full_file_url: "https://app.test/app/script".into(),
                line: 10,
                column: 5,
            }]
        );
    }

    #[test]
    fn v8_frame_without_function_keeps_absolute_url() {
        let frames = parse_stack("    at http://cdn.test:8080/lib/a.js?v=3:7:21", &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, ANONYMOUS);
        assert_eq!(frames[0].full_file_url, "http://cdn.test:8080/lib/a.js");
        assert_eq!(frames[0].display_file, "a.js");
        assert_eq!((frames[0].line, frames[0].column), (7, 21));
    }

    #[test]
    fn v8_method_and_constructor_names() {
        let frames = parse_stack(
            "    at Object.render (https://app.test/ui.js:3:9)\n    at new Widget (https://app.test/ui.js:40:1)",
            &origin(),
        );
        let names: Vec<_> = frames.iter().map(|f| f.function_name.as_str()).collect();
        assert_eq!(names, ["Object.render", "new Widget"]);
    }

    #[test]
    fn gecko_frames() {
        let stack = "handleClick@https://app.test/js/main.js:12:3\n@https://app.test/js/main.js:30:1\n";
        let frames = parse_stack(stack, &origin());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].function_name, "handleClick");
        assert_eq!(frames[0].display_file, "main.js");
        assert_eq!(frames[1].function_name, ANONYMOUS);
        assert_eq!((frames[1].line, frames[1].column), (30, 1));
    }

    #[test]
    fn bare_file_frame_has_anonymous_function() {
        let frames = parse_stack("https://app.test/js/main.js:30:1", &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, ANONYMOUS);
        assert_eq!(frames[0].full_file_url, "https://app.test/js/main.js");
        assert_eq!((frames[0].line, frames[0].column), (30, 1));
    }

    #[test]
    fn at_sign_inside_url_stays_in_file() {
        let url = "https://unpkg.com/lodash@4.17.21/lodash.js";

        let bare = parse_stack(&format!("{url}:10:5"), &origin());
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].function_name, ANONYMOUS);
        assert_eq!(bare[0].raw_file, url);
        assert_eq!(bare[0].full_file_url, url);
        assert_eq!(bare[0].display_file, "lodash.js");

        let named = parse_stack(&format!("chunk@{url}:10:5"), &origin());
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].function_name, "chunk");
        assert_eq!(named[0].full_file_url, url);
        assert_eq!((named[0].line, named[0].column), (10, 5));
    }

    #[test]
    fn nested_gecko_function_names_are_kept() {
        let frames = parse_stack("outer/<@https://app.test/js/main.js:4:9", &origin());
        assert_eq!(frames[0].function_name, "outer/<");
        assert_eq!(frames[0].display_file, "main.js");
    }

    #[test]
    fn relative_reference_resolves_against_origin() {
        let frames = parse_stack("init@js/boot.js:2:4", &origin());
        assert_eq!(frames[0].full_file_url, "https://app.test/js/boot.js");
        assert_eq!(frames[0].raw_file, "js/boot.js");
    }

    #[test]
    fn non_numeric_position_drops_only_that_frame() {
        let stack = "    at good (https://app.test/a.js:1:2)\n    at bad (https://app.test/b.js:x:2)\n    at also (https://app.test/c.js:3:4)";
        let frames = parse_stack(stack, &origin());
        let names: Vec<_> = frames.iter().map(|f| f.function_name.as_str()).collect();
        assert_eq!(names, ["good", "also"]);
    }

    #[test]
    fn zero_position_is_dropped() {
        assert!(parse_stack("    at f (https://app.test/a.js:0:2)", &origin()).is_empty());
    }

    #[test]
    fn unmatched_lines_are_skipped() {
        let stack = "    at foo (native)\n    at bar (https://app.test/a.js:4:4)\nnot a frame";
        let frames = parse_stack(stack, &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, "bar");
    }

    #[test]
    fn header_is_skipped_even_when_it_looks_like_a_frame() {
        let error = ErrorObject::new("Error", "bad value at a.js:1:2")
            .with_stack("Error: bad value at a.js:1:2\n    at foo (/app/script:10:5)");
        let frames = parse_error(&error, &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, "foo");
    }

    #[test]
    fn multi_line_header_is_skipped() {
        let error = ErrorObject::new("Error", "first\nsecond:1:2")
            .with_stack("Error: first\nsecond:1:2\n    at foo (/app/script:10:5)");
        let frames = parse_error(&error, &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].line, 10);
    }

    #[test]
    fn fields_produce_synthetic_frame_without_stack() {
        let error = ErrorObject::new("SyntaxError", "unexpected token").with_location("/js/app.js?x=1", 12, 0);
        let frames = parse_error(&error, &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, ANONYMOUS);
        assert_eq!(frames[0].full_file_url, "https://app.test/js/app.js");
        assert_eq!((frames[0].line, frames[0].column), (12, 1));
    }

    #[test]
    fn fields_are_used_when_stack_is_unparseable() {
        let error = ErrorObject::new("Error", "boom")
            .with_stack("Error: boom\n    at <unknown>")
            .with_location("https://app.test/a.js", 5, 6);
        let frames = parse_error(&error, &origin());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].display_file, "a.js");
    }

    #[test]
    fn no_stack_and_no_fields_yields_nothing() {
        assert!(parse_error(&ErrorObject::new("Error", "boom"), &origin()).is_empty());
        let zero_line = ErrorObject::new("Error", "boom").with_location("a.js", 0, 1);
        assert!(parse_error(&zero_line, &origin()).is_empty());
    }
}
