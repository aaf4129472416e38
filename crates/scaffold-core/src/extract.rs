use serde::Deserialize;
use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticCode;
use crate::error::ParseError;

// Tag matching is ASCII-case-insensitive against these lower-cased forms.
const OPEN_PREFIX: &str = "<agentaction";
const CLOSE_TAG: &str = "</agentaction>";

pub const DEFAULT_MAX_INPUT_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_MAX_ACTIONS: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    pub target_path: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorLimits {
    pub max_input_bytes: usize,
    pub max_actions: usize,
}

impl Default for ExtractorLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_actions: DEFAULT_MAX_ACTIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub actions: Vec<Action>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    limits: ExtractorLimits,
}

impl Extractor {
    pub fn new(limits: ExtractorLimits) -> Self {
        Self { limits }
    }

    /// Scans `raw` left to right and returns every well-formed action block in
    /// document order. Runs in a single forward pass over the input.
    pub fn extract(&self, raw: &str) -> Result<Extraction, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyInput);
        }
        if raw.len() > self.limits.max_input_bytes {
            return Err(ParseError::InputTooLarge {
                len: raw.len(),
                limit: self.limits.max_input_bytes,
            });
        }

        let text = raw.replace("\r\n", "\n");
        // ASCII lower-casing keeps byte offsets identical to `text`.
        let lowered = text.to_ascii_lowercase();
        let mut extraction = Extraction::default();
        let mut cursor = 0usize;
        let mut block = 0u64;

        while let Some(offset) = lowered[cursor..].find(OPEN_PREFIX) {
            let start = cursor + offset;
            let after_name = start + OPEN_PREFIX.len();
            if !is_tag_boundary(lowered.as_bytes().get(after_name).copied()) {
                cursor = after_name;
                continue;
            }

            let Some(open_end) = find_tag_end(text.as_bytes(), after_name) else {
                extraction.diagnostics.push(
                    Diagnostic::warn(
                        DiagnosticCode::MalformedTag,
                        format!("opening action tag at byte {start} has no closing '>'"),
                    )
                    .at(block),
                );
                block += 1;
                cursor = after_name;
                continue;
            };

            let mut attr_src = &text[after_name..open_end];
            let self_closing = attr_src.trim_end().ends_with('/');
            if self_closing {
                attr_src = attr_src.trim_end().trim_end_matches('/');
            }

            let attrs = TagAttributes::parse(attr_src);
            let Some(kind) = attrs.kind else {
                // Prose mentioning the tag lands here; the next real block may
                // start right after it.
                extraction.diagnostics.push(
                    Diagnostic::warn(
                        DiagnosticCode::MalformedTag,
                        format!("action tag at byte {start} has no type attribute"),
                    )
                    .at(block),
                );
                block += 1;
                cursor = after_name;
                continue;
            };

            let (body, next_cursor) = if self_closing {
                ("", open_end + 1)
            } else {
                let body_start = open_end + 1;
                match lowered[body_start..].find(CLOSE_TAG) {
                    Some(rel) => {
                        let close_start = body_start + rel;
                        (
                            &text[body_start..close_start],
                            close_start + CLOSE_TAG.len(),
                        )
                    }
                    None => {
                        extraction.diagnostics.push(
                            Diagnostic::warn(
                                DiagnosticCode::UnterminatedBlock,
                                format!("action block at byte {start} is never closed"),
                            )
                            .at(block),
                        );
                        break;
                    }
                }
            };

            if extraction.actions.len() >= self.limits.max_actions {
                extraction.diagnostics.push(
                    Diagnostic::warn(
                        DiagnosticCode::ActionLimitReached,
                        format!(
                            "stopped after {} actions; remaining input ignored",
                            self.limits.max_actions
                        ),
                    )
                    .at(block),
                );
                break;
            }
            extraction.actions.push(Action {
                kind,
                target_path: attrs.file_path,
                body: body.trim().to_string(),
            });

            block += 1;
            cursor = next_cursor;
        }

        if extraction.actions.is_empty() {
            extraction.diagnostics.push(Diagnostic::warn(
                DiagnosticCode::NoActions,
                "no agent actions found in input",
            ));
        }

        Ok(extraction)
    }
}

pub fn extract(raw: &str) -> Result<Extraction, ParseError> {
    Extractor::default().extract(raw)
}

/// Cheap check for whether `raw` contains at least one opening and one
/// closing action tag. Does not validate structure.
pub fn has_action_markup(raw: &str) -> bool {
    let lowered = raw.to_ascii_lowercase();
    lowered.contains(OPEN_PREFIX) && lowered.contains(CLOSE_TAG)
}

fn is_tag_boundary(byte: Option<u8>) -> bool {
    matches!(byte, Some(b) if b.is_ascii_whitespace() || b == b'>' || b == b'/')
}

// Index of the '>' closing the open tag. Quotes only count when they open an
// attribute value; a bare '<' means this was never a tag.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut after_eq = false;
    for (idx, &byte) in bytes.iter().enumerate().skip(from) {
        if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
            continue;
        }
        match byte {
            b'>' => return Some(idx),
            b'<' => return None,
            b'=' => after_eq = true,
            b'"' | b'\'' if after_eq => {
                quote = Some(byte);
                after_eq = false;
            }
            b if b.is_ascii_whitespace() => {}
            _ => after_eq = false,
        }
    }
    None
}

#[derive(Debug, Default, PartialEq, Eq)]
struct TagAttributes {
    kind: Option<String>,
    file_path: Option<String>,
}

impl TagAttributes {
    fn parse(src: &str) -> Self {
        let mut attrs = Self::default();
        for (name, value) in scan_attributes(src) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name.to_ascii_lowercase().as_str() {
                "type" if attrs.kind.is_none() => attrs.kind = Some(value.to_ascii_lowercase()),
                "filepath" if attrs.file_path.is_none() => {
                    attrs.file_path = Some(value.to_string())
                }
                _ => {}
            }
        }
        attrs
    }
}

fn scan_attributes(src: &str) -> Vec<(&str, &str)> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut idx = 0usize;

    while idx < bytes.len() {
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        let name_start = idx;
        while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'=' {
            idx += 1;
        }
        let name = &src[name_start..idx];
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        if idx >= bytes.len() || bytes[idx] != b'=' {
            // Bare attribute or trailing junk: nothing to record.
            if idx == name_start {
                idx += 1;
            }
            continue;
        }
        idx += 1;
        while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
            idx += 1;
        }
        let value = match bytes.get(idx) {
            Some(&q) if q == b'"' || q == b'\'' => {
                let value_start = idx + 1;
                let value_end = bytes[value_start..]
                    .iter()
                    .position(|&b| b == q)
                    .map_or(bytes.len(), |rel| value_start + rel);
                idx = value_end.saturating_add(1);
                &src[value_start..value_end]
            }
            _ => {
                let value_start = idx;
                while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() {
                    idx += 1;
                }
                &src[value_start..idx]
            }
        };
        if !name.is_empty() {
            out.push((name, value));
        }
    }

    out
}
