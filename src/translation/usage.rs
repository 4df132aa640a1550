/*!
 * Token accounting.
 *
 * - Source-script character detection used to skip lines with nothing to translate
 * - Token estimation for dry runs
 * - A run-wide ledger of tokens and cost shared between concurrent files
 */

use parking_lot::Mutex;

/// Whether a character belongs to the Japanese script ranges
pub fn is_source_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FA0}'   // CJK ideographs
        | '\u{3041}'..='\u{3094}' // hiragana
        | '\u{30A1}'..='\u{30F4}' // katakana
        | '\u{FF00}'..='\u{FFEF}' // fullwidth forms
    )
}

/// Whether the text contains anything worth translating
pub fn contains_source_text(text: &str) -> bool {
    text.chars().any(is_source_char)
}

/// Approximate token count of a text
///
/// Japanese characters typically tokenize to at least one token each,
/// everything else is counted at about four characters per token.
pub fn estimate_tokens(text: &str) -> u64 {
    let (source, other) = text.chars().fold((0u64, 0u64), |(source, other), c| {
        if is_source_char(c) {
            (source + 1, other)
        } else {
            (source, other + 1)
        }
    });
    source + other.div_ceil(4)
}

/// Dollar cost of a token count at a per-1000-token rate
pub fn cost_for(tokens: u64, cost_per_1k_tokens: f64) -> f64 {
    tokens as f64 * 0.001 * cost_per_1k_tokens
}

/// Snapshot of the ledger totals
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub tokens: u64,
    pub cost: f64,
    pub files: usize,
}

/// Run-wide token and cost accumulator
#[derive(Debug)]
pub struct TokenLedger {
    cost_per_1k_tokens: f64,
    totals: Mutex<UsageTotals>,
}

impl TokenLedger {
    pub fn new(cost_per_1k_tokens: f64) -> Self {
        Self {
            cost_per_1k_tokens,
            totals: Mutex::new(UsageTotals::default()),
        }
    }

    /// Add the tokens spent on one file and return the updated totals
    pub fn record(&self, tokens: u64) -> UsageTotals {
        let mut totals = self.totals.lock();
        totals.tokens += tokens;
        totals.cost += cost_for(tokens, self.cost_per_1k_tokens);
        totals.files += 1;
        *totals
    }

    pub fn totals(&self) -> UsageTotals {
        *self.totals.lock()
    }

    pub fn cost_per_1k_tokens(&self) -> f64 {
        self.cost_per_1k_tokens
    }
}
