/*!
 * Script walker.
 *
 * Walks a script buffer line by line, recognizes control markers, keeps
 * the active speaker and the rolling history, and drives the translation
 * service for every dialogue line. Results are written back in place, so
 * the buffer keeps its length and line order.
 *
 * The marker protocol is a small state machine:
 *
 * | state          | line           | next           | step              |
 * |----------------|----------------|----------------|-------------------|
 * | Scanning       | reset marker   | Translating    | ResetSpeaker      |
 * | Scanning       | declare marker | SpeakerPending | AwaitSpeaker      |
 * | Scanning       | other          | Scanning       | TranslateDialogue |
 * | SpeakerPending | any            | Translating    | ResolveSpeaker    |
 * | Translating    | any            | Scanning       | TranslateDialogue |
 */

use log::{debug, trace};
use thiserror::Error;

use crate::app_config::ScriptConfig;
use crate::errors::TranslationError;
use crate::script_processor::{ControlMarker, ScriptBuffer};

use super::context::{normalize_speaker_name, RollingHistory, SpeakerState, SpeakerTable};
use super::core::TranslationService;
use super::formatting::ReplyFormatter;
use super::prompts::{PromptKind, SPEAKER_NAME_HINT};

/// Position in the marker protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkerState {
    /// Looking for the next marker or dialogue line
    #[default]
    Scanning,
    /// A declare marker was seen; this line is the speaker name
    SpeakerPending,
    /// This line is dialogue that follows a marker
    Translating,
}

/// Side effect of visiting one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Clear the active speaker
    ResetSpeaker,
    /// Wait for the speaker name on the next line
    AwaitSpeaker,
    /// Resolve this line as the speaker name
    ResolveSpeaker,
    /// Translate this line as dialogue
    TranslateDialogue,
    /// Leave this line alone
    Skip,
}

/// Decide the next state and the step for the current line
pub fn transition(state: WalkerState, line: &str, translate_unmarked: bool) -> (WalkerState, Step) {
    match state {
        WalkerState::Scanning => match ControlMarker::classify(line) {
            Some(ControlMarker::ResetSpeaker) => (WalkerState::Translating, Step::ResetSpeaker),
            Some(ControlMarker::DeclareSpeaker) => (WalkerState::SpeakerPending, Step::AwaitSpeaker),
            None if translate_unmarked => (WalkerState::Scanning, Step::TranslateDialogue),
            None => (WalkerState::Scanning, Step::Skip),
        },
        WalkerState::SpeakerPending => (WalkerState::Translating, Step::ResolveSpeaker),
        WalkerState::Translating => (WalkerState::Scanning, Step::TranslateDialogue),
    }
}

/// Number of lines a walk will send as dialogue
pub fn dialogue_line_count(buffer: &ScriptBuffer, translate_unmarked: bool) -> usize {
    let mut state = WalkerState::Scanning;
    let mut count = 0;
    for line in buffer.lines() {
        let (next, step) = transition(state, &line.text, translate_unmarked);
        if step == Step::TranslateDialogue {
            count += 1;
        }
        state = next;
    }
    count
}

/// Per-file walker settings
#[derive(Debug, Clone)]
pub struct WalkerOptions {
    /// Column at which dialogue is wrapped
    pub wrap_width: usize,
    /// Rolling history bound
    pub max_history: usize,
    /// Translate lines that no marker introduced
    pub translate_unmarked_lines: bool,
}

impl Default for WalkerOptions {
    fn default() -> Self {
        Self::from_config(&ScriptConfig::default())
    }
}

impl WalkerOptions {
    pub fn from_config(config: &ScriptConfig) -> Self {
        Self {
            wrap_width: config.wrap_width,
            max_history: config.max_history,
            translate_unmarked_lines: config.translate_unmarked_lines,
        }
    }
}

/// A completed walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walked {
    /// Translated buffer, same length as the input
    pub buffer: ScriptBuffer,
    /// Tokens spent on the walk
    pub tokens: u64,
    /// Dialogue lines processed
    pub dialogue_lines: usize,
}

/// An aborted walk; the input buffer is handed back untouched
#[derive(Debug, Error)]
#[error("{source}")]
pub struct WalkFailure {
    /// The buffer as it was before the walk
    pub original: ScriptBuffer,
    /// Tokens spent before the failure
    pub tokens: u64,
    /// Error that aborted the walk
    #[source]
    pub source: TranslationError,
}

/// Translates one script buffer
pub struct ScriptWalker<'a> {
    service: &'a TranslationService,
    speakers: SpeakerTable,
    options: WalkerOptions,
    history: RollingHistory,
    speaker: SpeakerState,
    on_dialogue: Option<Box<dyn Fn() + Send + Sync + 'a>>,
}

impl<'a> ScriptWalker<'a> {
    pub fn new(service: &'a TranslationService, speakers: SpeakerTable, options: WalkerOptions) -> Self {
        let history = RollingHistory::new(options.max_history);
        Self {
            service,
            speakers,
            options,
            history,
            speaker: SpeakerState::default(),
            on_dialogue: None,
        }
    }

    /// Call `callback` after every dialogue line
    pub fn with_progress(mut self, callback: impl Fn() + Send + Sync + 'a) -> Self {
        self.on_dialogue = Some(Box::new(callback));
        self
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn current_speaker(&self) -> Option<&str> {
        self.speaker.current()
    }

    /// Walk the whole buffer, starting from an empty history and no speaker
    pub async fn walk(&mut self, original: ScriptBuffer) -> Result<Walked, WalkFailure> {
        self.history = RollingHistory::new(self.options.max_history);
        self.speaker.reset();

        let mut buffer = original.clone();
        let mut state = WalkerState::Scanning;
        let mut cursor = 0;
        let mut tokens = 0;
        let mut dialogue_lines = 0;

        while cursor < buffer.len() {
            let line = buffer.text(cursor).unwrap_or_default().to_string();
            let (next, step) = transition(state, &line, self.options.translate_unmarked_lines);
            trace!("line {}: {:?} -> {:?} ({:?})", cursor, state, next, step);

            let outcome = match step {
                Step::ResetSpeaker => {
                    self.speaker.reset();
                    Ok((None, 0))
                }
                Step::AwaitSpeaker | Step::Skip => Ok((None, 0)),
                Step::ResolveSpeaker => self.resolve_speaker(&line).await,
                Step::TranslateDialogue => {
                    let result = self.translate_dialogue(&line).await;
                    if result.is_ok() {
                        dialogue_lines += 1;
                        if let Some(callback) = &self.on_dialogue {
                            callback();
                        }
                    }
                    result
                }
            };

            match outcome {
                Ok((text, spent)) => {
                    tokens += spent;
                    if let Some(text) = text {
                        buffer.set_text(cursor, text);
                    }
                }
                Err(source) => {
                    debug!("Walk aborted at line {}: {}", cursor, source);
                    return Err(WalkFailure { original, tokens, source });
                }
            }

            state = next;
            cursor += 1;
        }

        Ok(Walked {
            buffer,
            tokens,
            dialogue_lines,
        })
    }

    /// Resolve a raw speaker line to the English name to write back
    async fn resolve_speaker(&mut self, raw: &str) -> Result<(Option<String>, u64), TranslationError> {
        let (name, tokens) = match self.speakers.lookup(raw) {
            Some(known) => (normalize_speaker_name(known), 0),
            None => {
                let result = self.service.translate(raw.trim(), SPEAKER_NAME_HINT, PromptKind::Terse).await?;
                (normalize_speaker_name(&result.text), result.tokens)
            }
        };

        debug!("Speaker {:?} -> {:?}", raw, name);
        self.speaker.set(name.clone());
        Ok((Some(name), tokens))
    }

    /// Translate one dialogue line, returning the wrapped text to write back
    ///
    /// Lines the service leaves untouched are still recorded and wrapped.
    async fn translate_dialogue(&mut self, line: &str) -> Result<(Option<String>, u64), TranslationError> {
        let input = self.speaker.attribute(line);
        let context = self.history.context_hint();
        let result = self.service.translate(&input, &context, PromptKind::Full).await?;

        let text = ReplyFormatter::strip_speaker_echo(&result.text);
        self.history.record(self.speaker.current(), &text);
        let wrapped = ReplyFormatter::wrap_line(&text, self.options.wrap_width);

        Ok((Some(wrapped), result.tokens))
    }
}
