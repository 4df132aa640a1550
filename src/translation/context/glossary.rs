/*!
 * Character glossary sent with every translation request.
 *
 * The glossary grounds the model on fixed name renderings and genders so
 * that names and pronouns stay consistent across a whole script.
 */

use crate::app_config::CharacterEntry;

/// Fixed block of known characters.
#[derive(Debug, Clone, Default)]
pub struct CharacterGlossary {
    entries: Vec<CharacterEntry>,
}

impl CharacterGlossary {
    pub fn new(entries: Vec<CharacterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CharacterEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the glossary as a fenced context block.
    ///
    /// Each character gets one line:
    /// `Character: 如月亜里愛 == Kisaragi Aria - Nickname: Aria - Gender: Female`
    pub fn render(&self) -> String {
        let mut block = String::from("```\nGame Characters:\n");
        for entry in &self.entries {
            block.push_str(&format!("Character: {} == {}", entry.source, entry.name));
            if let Some(nickname) = entry.nickname.as_deref().filter(|n| !n.is_empty()) {
                block.push_str(&format!(" - Nickname: {}", nickname));
            }
            block.push_str(&format!(" - Gender: {}\n", entry.gender));
        }
        block.push_str("```");
        block
    }
}
