//! Outbound text hygiene.
//!
//! Reply text is forwarded verbatim into webhook payloads that some
//! downstream tools template into JSON by string concatenation, so it
//! must carry no unescaped quote, raw CR/LF, or control byte.

/// Byte ceiling for outbound reply text (10 MiB).
const MAX_TEXT_BYTES: usize = 10 * 1024 * 1024;

/// Marker appended when text is cut at the ceiling.
const TRUNCATION_MARKER: &str = "… [truncated]";

/// Minimum length for a plausible Brevo visitor id.
const MIN_VISITOR_ID_LEN: usize = 20;

/// Escape text for safe embedding in a JSON string value.
///
/// Backslashes and double quotes are escaped, CR/LF/CRLF become the
/// two-character sequence `\n`, all other C0 control bytes are
/// dropped. Input longer than the byte ceiling is truncated on a char
/// boundary with a marker appended.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_TEXT_BYTES));
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if out.len() >= MAX_TEXT_BYTES {
            out.push_str(TRUNCATION_MARKER);
            return out;
        }
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => {
                // CRLF collapses to one newline escape
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Whether a visitor id is plausible enough to try the direct Brevo
/// channel.
///
/// The spreadsheet column this comes from has historically contained
/// literal `undefined`/`null` strings and email addresses; those must
/// fall through to the webhook channel instead.
pub fn is_valid_visitor_id(id: &str) -> bool {
    let trimmed = id.trim();
    trimmed.len() >= MIN_VISITOR_ID_LEN
        && !trimmed.contains("undefined")
        && !trimmed.contains("null")
        && !trimmed.contains("email")
}
