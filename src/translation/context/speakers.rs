/*!
 * Speaker tracking for dialogue translation.
 *
 * Script speakers are declared explicitly by a marker line followed by the
 * raw name. Names listed in the known-speaker table are substituted
 * literally; everything else goes through the model.
 */

use std::collections::BTreeMap;

/// Lookup table of speaker names that never need a model call.
#[derive(Debug, Clone, Default)]
pub struct SpeakerTable {
    known: BTreeMap<String, String>,
}

impl SpeakerTable {
    /// Create a table from `raw name -> English name` pairs.
    pub fn new(known: BTreeMap<String, String>) -> Self {
        Self { known }
    }

    /// English name for a raw speaker line, if it is a known speaker.
    pub fn lookup(&self, raw_name: &str) -> Option<&str> {
        self.known.get(raw_name.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Clean up a resolved speaker name before it is stored and written back.
pub fn normalize_speaker_name(name: &str) -> String {
    name.trim().trim_matches('.').trim().to_string()
}

/// Tracks the currently active speaker.
#[derive(Debug, Clone, Default)]
pub struct SpeakerState {
    current: Option<String>,
}

impl SpeakerState {
    pub fn set(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.current = if name.is_empty() { None } else { Some(name) };
    }

    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Prefix a dialogue line with the active speaker, if any.
    pub fn attribute(&self, line: &str) -> String {
        match &self.current {
            Some(speaker) => format!("{}: {}", speaker, line),
            None => line.to_string(),
        }
    }
}
