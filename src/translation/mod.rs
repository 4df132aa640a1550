/*!
 * Translation of script lines using AI providers.
 *
 * This module contains the core functionality for translating dialogue
 * scripts. It is split into several submodules:
 *
 * - `placeholders`: Masking of in-game control codes around model calls
 * - `core`: The translation service wrapping a single model call
 * - `walker`: The marker state machine that drives a whole script
 * - `context`: Rolling history, speakers and the character glossary
 * - `formatting`: Reply cleanup and line wrapping
 * - `prompts`: System prompt templates
 * - `retry`: Bounded retry combinator
 * - `usage`: Token estimation and the run-wide token ledger
 */

// Re-export main types for easier usage
pub use self::core::{Translation, TranslationKind, TranslationMode, TranslationOptions, TranslationService};
pub use self::placeholders::{mask, unmask, PlaceholderClass, PlaceholderTable};
pub use self::prompts::{PromptKind, PromptTemplate};
pub use self::retry::RetryPolicy;
pub use self::usage::{estimate_tokens, TokenLedger, UsageTotals};
pub use self::walker::{ScriptWalker, WalkFailure, Walked, WalkerOptions, WalkerState};

// Submodules
pub mod context;
pub mod core;
pub mod formatting;
pub mod placeholders;
pub mod prompts;
pub mod retry;
pub mod usage;
pub mod walker;
