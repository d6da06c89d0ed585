use std::io::{self, Write};

use bat::PrettyPrinter;
use tracing::debug;

use crate::error::Result;

#[derive(Debug, PartialEq)]
pub enum Segment {
    Prose(String),
    Code {
        language: Option<String>,
        body: String,
    },
}

/// Split a complete answer into prose and ``` fenced code blocks.
/// An unclosed fence runs to the end of the text.
pub fn split_fences(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut prose = String::new();
    let mut code: Option<(Option<String>, String)> = None;

    for line in text.lines() {
        if let Some(tag) = line.trim_start().strip_prefix("```") {
            if let Some((language, body)) = code.take() {
                segments.push(Segment::Code { language, body });
            } else {
                if !prose.is_empty() {
                    segments.push(Segment::Prose(std::mem::take(&mut prose)));
                }
                let tag = tag.trim();
                let language = (!tag.is_empty()).then(|| tag.to_string());
                code = Some((language, String::new()));
            }
        } else if let Some((_, body)) = code.as_mut() {
            body.push_str(line);
            body.push('\n');
        } else {
            prose.push_str(line);
            prose.push('\n');
        }
    }

    if let Some((language, body)) = code {
        segments.push(Segment::Code { language, body });
    }
    if !prose.is_empty() {
        segments.push(Segment::Prose(prose));
    }
    segments
}

/// Renders one fenced code block. Returns false when it could not, and the
/// block is then written as plain text.
pub trait Highlighter {
    fn highlight(&mut self, code: &str, language: Option<&str>) -> bool;
}

/// bat writes straight to the process stdout.
pub struct Bat;

impl Highlighter for Bat {
    fn highlight(&mut self, code: &str, language: Option<&str>) -> bool {
        let mut printer = PrettyPrinter::new();
        printer.input_from_bytes(code.as_bytes());
        if let Some(language) = language {
            printer.language(language);
        }
        match printer.print() {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, ?language, "highlighting failed");
                false
            }
        }
    }
}

/// Print a complete answer to stdout, highlighting its code blocks if asked.
pub fn print_answer(text: &str, highlight: bool) -> Result<()> {
    let mut out = io::stdout();
    if highlight {
        write_answer(text, &mut out, Some(&mut Bat))
    } else {
        write_answer(text, &mut out, None)
    }
}

/// Without a highlighter the answer is written verbatim with one trailing
/// newline. With one, `out` is flushed before each code block so prose and
/// highlighted code keep their order.
pub fn write_answer<W: Write>(
    text: &str,
    out: &mut W,
    highlighter: Option<&mut dyn Highlighter>,
) -> Result<()> {
    let Some(highlighter) = highlighter else {
        writeln!(out, "{}", text)?;
        return Ok(());
    };

    for segment in split_fences(text) {
        match segment {
            Segment::Prose(prose) => write!(out, "{}", prose)?,
            Segment::Code { language, body } => {
                out.flush()?;
                if !highlighter.highlight(&body, language.as_deref()) {
                    write!(out, "{}", body)?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}
