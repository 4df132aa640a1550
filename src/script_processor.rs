use encoding_rs::Encoding;
use log::debug;
use std::fmt;

use crate::errors::ScriptError;

// @module: Script buffer handling and control marker recognition

/// Marker line that resets the active speaker
pub const RESET_SPEAKER_MARKER: &str = "00000000";

/// Marker lines announcing that the next line holds a speaker name
pub const DECLARE_SPEAKER_MARKERS: [&str; 2] = ["00003000", "00002000"];

/// Structural sentinel lines of a dialogue script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMarker {
    /// Clears the speaker state
    ResetSpeaker,
    /// The following line is a speaker name
    DeclareSpeaker,
}

impl ControlMarker {
    /// Recognize a marker from the exact content of a line (terminator excluded)
    pub fn classify(line: &str) -> Option<Self> {
        if line == RESET_SPEAKER_MARKER {
            Some(Self::ResetSpeaker)
        } else if DECLARE_SPEAKER_MARKERS.contains(&line) {
            Some(Self::DeclareSpeaker)
        } else {
            None
        }
    }
}

/// Line terminator preserved for each physical line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    /// Last line of a file without a trailing newline
    None,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::None => "",
        }
    }
}

// @struct: Single physical script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    // @field: Line content without terminator
    pub text: String,

    // @field: Original terminator
    pub ending: LineEnding,
}

impl ScriptLine {
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            text: text.into(),
            ending,
        }
    }
}

impl fmt::Display for ScriptLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.text, self.ending.as_str())
    }
}

/// Ordered, fixed-length sequence of script lines
///
/// Indices address both control markers and payload lines. Entries are
/// replaced in place during translation; the length never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBuffer {
    lines: Vec<ScriptLine>,
}

impl ScriptBuffer {
    /// Split decoded text into lines, keeping each line's terminator
    pub fn from_text(content: &str) -> Self {
        let lines = content
            .split_inclusive('\n')
            .map(|raw| {
                if let Some(text) = raw.strip_suffix("\r\n") {
                    ScriptLine::new(text, LineEnding::CrLf)
                } else if let Some(text) = raw.strip_suffix('\n') {
                    ScriptLine::new(text, LineEnding::Lf)
                } else {
                    ScriptLine::new(raw, LineEnding::None)
                }
            })
            .collect();
        Self { lines }
    }

    /// Build a buffer of newline-terminated lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .map(|text| ScriptLine::new(text, LineEnding::Lf))
                .collect(),
        }
    }

    /// Decode raw file bytes with the given encoding
    pub fn decode(bytes: &[u8], encoding: &'static Encoding, path: &str) -> Result<Self, ScriptError> {
        let (content, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            return Err(ScriptError::Decode {
                path: path.to_string(),
                encoding: encoding.name().to_string(),
            });
        }
        let buffer = Self::from_text(&content);
        debug!("Decoded {} lines from {} ({})", buffer.len(), path, encoding.name());
        Ok(buffer)
    }

    /// Encode the buffer back to bytes with the given encoding
    pub fn encode(&self, encoding: &'static Encoding, path: &str) -> Result<Vec<u8>, ScriptError> {
        let content = self.to_text();
        let (bytes, _, had_errors) = encoding.encode(&content);
        if had_errors {
            return Err(ScriptError::Encode {
                path: path.to_string(),
                encoding: encoding.name().to_string(),
            });
        }
        Ok(bytes.into_owned())
    }

    /// Join all lines back together with their terminators
    pub fn to_text(&self) -> String {
        self.lines.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }

    /// Content of the line at `index` without its terminator
    pub fn text(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|line| line.text.as_str())
    }

    /// Replace the content of a line, keeping its terminator
    pub fn set_text(&mut self, index: usize, text: impl Into<String>) {
        if let Some(line) = self.lines.get_mut(index) {
            line.text = text.into();
        }
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }
}

/// Resolve an encoding label such as `shift_jis` or `utf-8`
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, ScriptError> {
    Encoding::for_label(label.as_bytes()).ok_or_else(|| ScriptError::UnknownEncoding(label.to_string()))
}
