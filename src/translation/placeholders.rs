/*!
 * Placeholder masking for in-game control codes.
 *
 * Control sequences such as `\c[2]` or `\N[1]` must reach the game untouched,
 * so they are swapped for synthetic bracketed tokens (`[Color_0]`, `[N_0]`)
 * before a line is sent to the model and swapped back afterwards.
 *
 * Distinct codes are numbered in first-seen order, starting past any
 * token-shaped text the line already holds, and restoration walks the classes
 * in reverse masking order, so `unmask(mask(s)) == s` for any input.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ICON_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\+[iIkKwW]\[[0-9]+\]").unwrap()
});

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\+[cC]\[[0-9]+\]").unwrap()
});

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\+[nN]\[.+?\]+").unwrap()
});

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\+[vV]\[[0-9]+\]").unwrap()
});

static FORMAT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\+CL").unwrap()
});

/// Synthetic token with whitespace the model may have inserted
static SPACED_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*(Ascii|Color|N|Var|FCode)\s*_\s*([0-9]+)\s*\]").unwrap()
});

/// Category of control code, in masking priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderClass {
    /// Icon and index codes (`\i[n]`, `\k[n]`, `\w[n]`)
    Icon,
    /// Text color (`\c[n]`)
    Color,
    /// Actor/party name references (`\n[...]`)
    Name,
    /// Numeric variables (`\v[n]`)
    Variable,
    /// Literal format code (`\CL`)
    Format,
}

impl PlaceholderClass {
    /// All classes in masking order
    pub const ALL: [Self; 5] = [Self::Icon, Self::Color, Self::Name, Self::Variable, Self::Format];

    /// Tag used inside synthetic tokens
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Icon => "Ascii",
            Self::Color => "Color",
            Self::Name => "N",
            Self::Variable => "Var",
            Self::Format => "FCode",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.tag() == tag)
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Icon => &ICON_PATTERN,
            Self::Color => &COLOR_PATTERN,
            Self::Name => &NAME_PATTERN,
            Self::Variable => &VARIABLE_PATTERN,
            Self::Format => &FORMAT_PATTERN,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Icon => 0,
            Self::Color => 1,
            Self::Name => 2,
            Self::Variable => 3,
            Self::Format => 4,
        }
    }

    /// Synthetic token for the `index`-th code of this class
    pub fn token(&self, index: usize) -> String {
        format!("[{}_{}]", self.tag(), index)
    }
}

/// Original substrings recorded while masking a single line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderTable {
    originals: [Vec<String>; 5],
    /// First token index per class, above any literal token in the raw line
    bases: [usize; 5],
}

impl PlaceholderTable {
    /// Distinct originals of a class, in token index order
    pub fn originals(&self, class: PlaceholderClass) -> &[String] {
        &self.originals[class.index()]
    }

    /// Total number of distinct codes recorded
    pub fn len(&self) -> usize {
        self.originals.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token standing for the `index`-th recorded code of `class`
    pub fn token(&self, class: PlaceholderClass, index: usize) -> String {
        class.token(self.bases[class.index()] + index)
    }

    /// Position in `originals(class)` that a token index refers to
    fn slot(&self, class: PlaceholderClass, token_index: usize) -> Option<usize> {
        let slot = token_index.checked_sub(self.bases[class.index()])?;
        (slot < self.originals(class).len()).then_some(slot)
    }
}

/// One past the highest token index of each class already present in `raw`
fn literal_bases(raw: &str) -> [usize; 5] {
    let mut bases = [0; 5];
    for caps in SPACED_TOKEN_PATTERN.captures_iter(raw) {
        let (Some(class), Ok(index)) = (PlaceholderClass::from_tag(&caps[1]), caps[2].parse::<usize>()) else {
            continue;
        };
        let base = &mut bases[class.index()];
        *base = (*base).max(index.saturating_add(1));
    }
    bases
}

/// Replace every control code with a synthetic token
pub fn mask(raw: &str) -> (String, PlaceholderTable) {
    let mut table = PlaceholderTable {
        bases: literal_bases(raw),
        ..PlaceholderTable::default()
    };
    let mut text = raw.to_string();

    for class in PlaceholderClass::ALL {
        let base = table.bases[class.index()];
        let mut seen: Vec<String> = Vec::new();
        text = class
            .pattern()
            .replace_all(&text, |caps: &Captures| {
                let code = &caps[0];
                let index = match seen.iter().position(|known| known == code) {
                    Some(index) => index,
                    None => {
                        seen.push(code.to_string());
                        seen.len() - 1
                    }
                };
                class.token(base + index)
            })
            .into_owned();
        table.originals[class.index()] = seen;
    }

    (text, table)
}

/// Restore the control codes recorded in `table`
pub fn unmask(translated: &str, table: &PlaceholderTable) -> String {
    // Only tokens this table issued are tidied; literal look-alikes stay as written
    let mut text = SPACED_TOKEN_PATTERN
        .replace_all(translated, |caps: &Captures| {
            let issued = PlaceholderClass::from_tag(&caps[1])
                .zip(caps[2].parse::<usize>().ok())
                .and_then(|(class, index)| table.slot(class, index).map(|slot| table.token(class, slot)));
            issued.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    // Later classes may have swallowed tokens of earlier ones, so undo them first
    for class in PlaceholderClass::ALL.iter().rev() {
        for (index, original) in table.originals(*class).iter().enumerate() {
            text = text.replace(&table.token(*class, index), original);
        }
    }

    text
}
