/*!
 * Prompt templates for script translation.
 *
 * The full prompt can be replaced by a `prompt.txt` file next to the
 * configuration; the terse prompt is fixed and used for short lookups
 * such as speaker names.
 */

use log::{debug, warn};
use std::path::Path;

/// Prefix placed before the masked line in the user message
pub const LINE_MARKER: &str = "Line to Translate = ";

/// Context hint used when translating a speaker name
pub const SPEAKER_NAME_HINT: &str = "Reply with only the english translation of the NPC name";

/// Which system instruction accompanies a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// The complete domain prompt
    Full,
    /// A one-line "reply with only the translation" instruction
    Terse,
}

/// System instruction templates
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    full: String,
}

impl PromptTemplate {
    /// The built-in domain prompt.
    pub const GAME_TRANSLATOR: &'static str = r#"You are an expert game translator who translates Japanese text to English.
You are going to be translating text from a videogame.
I will give you lines of text, and you must translate each line to the best of your ability.

Notes:
- 'Game Characters' - The names, nicknames, and genders of the game characters. Reference this to know the names, nicknames, and gender of characters in the game.
- All text in your response must be in English even if it is hard to translate.
- Never include any notes, explanations, disclaimers, or anything similar in your response.
- Maintain any spacing in the translation.
- Maintain any code text in brackets if given. (e.g. `[Color_0]`, `[Ascii_0]`, `[FCode_1]`, `[N_0]`, `[Var_0]`)
- `...` can be a part of the dialogue. Translate it as it is and include it in your response.
- Check every line to ensure all text inside is in English.
- `Previous Text for Context` is only there for context. Never translate or repeat it.
- Reply with only the English translation in the following format: `Translation: <ENGLISH_TRANSLATION>`"#;

    /// Instruction used for short lookups.
    pub const TERSE: &'static str =
        "Output ONLY the english translation in the following format: `Translation: <ENGLISH_TRANSLATION>`";

    /// Create a template set around a custom full prompt.
    pub fn new(full: impl Into<String>) -> Self {
        Self { full: full.into() }
    }

    /// Load the full prompt from a file, falling back to the built-in one.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => {
                debug!("Loaded prompt from {}", path.display());
                Self::new(content)
            }
            Ok(_) => {
                warn!("Prompt file {} is empty, using the built-in prompt", path.display());
                Self::default()
            }
            Err(e) => {
                debug!("No prompt file at {} ({}), using the built-in prompt", path.display(), e);
                Self::default()
            }
        }
    }

    /// System instruction for the given prompt kind.
    pub fn system(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Full => &self.full,
            PromptKind::Terse => Self::TERSE,
        }
    }

    /// The full domain prompt.
    pub fn full(&self) -> &str {
        &self.full
    }

    /// User message carrying the masked line.
    pub fn line_message(masked: &str) -> String {
        format!("{}{}", LINE_MARKER, masked)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(Self::GAME_TRANSLATOR)
    }
}
