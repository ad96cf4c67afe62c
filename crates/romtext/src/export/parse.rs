//! Reading an edited dialogue file back

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::extract::StringEntry;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^<STRING (\d+)>[ \t]*$").expect("valid header regex"));

static DUPLICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[DUPLICATE OF <STRING (\d+)>\]$").expect("valid duplicate regex")
});

const POINTER_FIELD: &str = "POINTER_OFFSET";
const TEXT_FIELD: &str = "TEXT_OFFSET";

/// Parse the contents of a dialogue file.
///
/// Each block runs from its header to the next one, so edited text may
/// contain blank lines. Structural problems are errors; duplicates that point
/// at unknown or later ids are only warned about here and left for the repack
/// to report.
pub fn parse_export(content: &str) -> Result<Vec<StringEntry>> {
    let content = content.replace("\r\n", "\n");
    let headers: Vec<_> = HEADER_RE.captures_iter(&content).collect();

    if let Some(first) = headers.first() {
        let start = first.get(0).map_or(0, |m| m.start());
        if !content[..start].trim().is_empty() {
            return Err(parse_error(&content, 0, "text before the first <STRING> header"));
        }
    } else if !content.trim().is_empty() {
        return Err(parse_error(&content, 0, "no <STRING> headers found"));
    }

    let mut entries = Vec::with_capacity(headers.len());
    let mut ids = HashSet::new();

    for (i, caps) in headers.iter().enumerate() {
        let (Some(header), Some(id_match)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let id: u32 = id_match
            .as_str()
            .parse()
            .map_err(|_| parse_error(&content, header.start(), "string id out of range"))?;
        if !ids.insert(id) {
            return Err(parse_error(
                &content,
                header.start(),
                &format!("string id {} appears more than once", id),
            ));
        }
        if id as usize != i {
            warn!("<STRING {:04}> found at position {}; ids are not sequential", id, i);
        }

        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let block = &content[header.end()..end];
        let block = block.strip_prefix('\n').unwrap_or(block);
        let block_start = header.end() + 1;

        let (pointer_line, rest) = split_line(block);
        let pointer_offset = parse_field(&content, block_start, pointer_line, POINTER_FIELD)?;
        let (text_line, body) = split_line(rest);
        let text_line_start = block_start + pointer_line.len() + 1;
        let text_offset = parse_field(&content, text_line_start, text_line, TEXT_FIELD)?;

        let body = strip_separator(body);
        let entry = match DUPLICATE_RE.captures(body.trim_end()) {
            Some(dup) => {
                let of: u32 = dup[1].parse().map_err(|_| {
                    parse_error(&content, header.start(), "duplicate reference out of range")
                })?;
                if of >= id {
                    warn!("<STRING {:04}> refers to <STRING {:04}> which is not earlier", id, of);
                }
                StringEntry::duplicate(id, pointer_offset, text_offset, of)
            }
            None => StringEntry::canonical(id, pointer_offset, text_offset, body.to_string()),
        };
        entries.push(entry);
    }

    Ok(entries)
}

fn split_line(text: &str) -> (&str, &str) {
    text.split_once('\n').unwrap_or((text, ""))
}

/// Drop the line break ending the text and the blank separator line
fn strip_separator(body: &str) -> &str {
    body.strip_suffix("\n\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
}

fn parse_field(content: &str, at: usize, line: &str, name: &str) -> Result<usize> {
    let value = line
        .strip_prefix(name)
        .and_then(|rest| rest.trim_start().strip_prefix(':'))
        .map(str::trim)
        .ok_or_else(|| parse_error(content, at, &format!("expected {}: 0x...", name)))?;

    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    usize::from_str_radix(digits, 16)
        .map_err(|_| parse_error(content, at, &format!("invalid {} value '{}'", name, value)))
}

fn parse_error(content: &str, at: usize, message: &str) -> Error {
    let at = at.min(content.len());
    let line = content.as_bytes()[..at]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1;
    Error::ExportParse {
        line,
        message: message.to_string(),
    }
}
