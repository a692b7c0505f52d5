//! Input preparation shared by the bundled engines.
//!
//! Multilingual seq2seq checkpoints select their output language through a leading
//! `>>tok<<` marker, and sentence boundaries are made explicit with `</s>`.

/// Marker substituted for every `.` in the input.
pub const SENTENCE_MARKER: &str = " </s> ";

/// Prefix `text` with the target-language token (if any) and mark sentence boundaries.
#[must_use]
pub fn prepare_input(special_token: Option<&str>, text: &str) -> String {
    let prefixed = match special_token {
        Some(token) => format!(">>{token}<< {text}"),
        None => text.to_string(),
    };
    prefixed.replace('.', SENTENCE_MARKER)
}

/// Undo [`prepare_input`]: drop a leading target token and restore sentence periods.
#[must_use]
pub fn strip_markers(text: &str) -> String {
    let body = text
        .strip_prefix(">>")
        .and_then(|rest| rest.split_once("<< "))
        .map_or(text, |(_, body)| body);
    body.replace(SENTENCE_MARKER, ".")
}
