/*!
 * Prompt engineering for script translation.
 *
 * - The full game-translation system prompt, optionally read from disk
 * - The terse instruction used for speaker names
 * - Fixed message markers shared with reply cleanup
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptKind, PromptTemplate, LINE_MARKER, SPEAKER_NAME_HINT};
