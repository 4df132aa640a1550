/*!
 * Reply cleanup and line formatting for translated text.
 *
 * Models tend to decorate their answers with labels, echoed prompt
 * fragments and trailing notes. This module strips those, validates the
 * cleaned reply, and wraps the final text to the in-game text box width.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::TranslationError;

/// Labels the model prepends to its answer, removed wherever they appear
const BOILERPLATE_LABELS: [&str; 10] = [
    "English Translation: ",
    "Translation: ",
    "Line to Translate = ",
    "Translation = ",
    "Translate = ",
    "English Translation:",
    "Translation:",
    "Line to Translate =",
    "Translation =",
    "Translate =",
];

/// Phrase the model uses when it declines a line
pub const REFUSAL_PHRASE: &str = "I'm sorry, but I'm unable to assist with that translation";

/// Echoed history appended after the translation
static PAST_TEXT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\n\nPast Translated Text:.*").unwrap()
});

/// Trailing commentary, up to the end of its line
static NOTE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Note:.*").unwrap()
});

/// Leading `Speaker: ` echoed back from the request
static SPEAKER_ECHO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.+?:\s").unwrap()
});

/// Escape written in place of a wrap break
pub const WRAP_BREAK: &str = "\\n";

/// Reply formatter for cleaning and wrapping model output
pub struct ReplyFormatter;

impl ReplyFormatter {
    /// Strip labels, echoed history, notes and stray sokuon from a reply
    pub fn clean_reply(reply: &str) -> String {
        let mut text = reply.to_string();
        for label in BOILERPLATE_LABELS {
            text = text.replace(label, "");
        }
        text = PAST_TEXT_REGEX.replace_all(&text, "").into_owned();
        text = NOTE_REGEX.replace_all(&text, "").into_owned();
        text = text.replace('っ', "");
        text.trim().to_string()
    }

    /// Reject refusals and implausibly long replies
    pub fn validate_reply(reply: &str, input: &str, max_ratio: usize) -> Result<(), TranslationError> {
        if reply.contains(REFUSAL_PHRASE) {
            return Err(TranslationError::Refused);
        }

        let reply_chars = reply.chars().count();
        let input_chars = input.chars().count();
        if reply_chars > max_ratio.saturating_mul(input_chars) {
            return Err(TranslationError::OversizedReply {
                reply_chars,
                input_chars,
                max_ratio,
            });
        }

        Ok(())
    }

    /// Remove a leading `Speaker: ` the model copied from the request
    pub fn strip_speaker_echo(text: &str) -> String {
        SPEAKER_ECHO_REGEX.replace(text, "").into_owned()
    }

    /// Greedy word wrap to `width` characters, joined with a literal `\n`
    ///
    /// Runs of whitespace collapse to one space and words longer than the
    /// width are broken. The result never contains a real newline.
    pub fn wrap_line(text: &str, width: usize) -> String {
        let width = width.max(1);
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for word in text.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // Fill the rest of the current line with the head of an overlong word
            while word.len() > width {
                let room = if current_len == 0 { width } else { width.saturating_sub(current_len + 1) };
                if room == 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                    continue;
                }
                if current_len > 0 {
                    current.push(' ');
                }
                current.extend(word.drain(..room));
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if word.is_empty() {
                continue;
            }

            if current_len > 0 && current_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current_len += word.len();
            current.extend(word);
        }

        if !current.is_empty() {
            lines.push(current);
        }

        lines.join(WRAP_BREAK)
    }
}
