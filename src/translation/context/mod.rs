/*!
 * Context management for script translation.
 *
 * - Rolling history of recent translations handed to the model
 * - Speaker lookup and tracking across marker lines
 * - The fixed character glossary block
 */

pub mod glossary;
pub mod history;
pub mod speakers;

// Re-export main types
pub use glossary::CharacterGlossary;
pub use history::{RollingHistory, CONTEXT_LABEL};
pub use speakers::{normalize_speaker_name, SpeakerState, SpeakerTable};
