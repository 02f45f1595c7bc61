//! Text cleanup shared by title and body extraction.
//!
//! [`normalize`] applies, in order:
//!
//! 1. corner-bracket quotes to typographic quotes (`「」` → `“”`, `『』` → `‘’`)
//! 2. anchor tags removed, link text kept
//! 3. `<script>`, `<blockquote>` and `<iframe>` blocks removed with their contents
//!
//! Later rules never match text produced by earlier ones, so running
//! [`normalize`] on its own output is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;

/// Corner-bracket glyph to its replacement.
pub const QUOTE_TABLE: [(char, char); 4] = [('「', '“'), ('」', '”'), ('『', '‘'), ('』', '’')];

/// Characters that are unsafe in file names and link labels downstream.
const ILLEGAL_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?a\b[^>]*>").unwrap());

static BLOCK_RES: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap(),
        Regex::new(r"(?is)<blockquote\b.*?</blockquote\s*>").unwrap(),
        Regex::new(r"(?is)<iframe\b.*?</iframe\s*>").unwrap(),
    ]
});

/// Apply every cleanup rule listed in the module docs.
///
/// # Arguments
///
/// * `text` - Raw paragraph markup or title text.
///
/// # Returns
///
/// The cleaned text. Illegal file-name characters are left alone; see
/// [`strip_illegal_chars`] for those.
pub fn normalize(text: &str) -> String {
    let quoted = replace_quotes(text);
    let mut out = ANCHOR_RE.replace_all(&quoted, "").into_owned();
    for re in BLOCK_RES.iter() {
        out = re.replace_all(&out, "").into_owned();
    }
    out
}

/// Map every glyph in [`QUOTE_TABLE`], leaving other characters untouched.
pub fn replace_quotes(text: &str) -> String {
    text.chars()
        .map(|c| {
            QUOTE_TABLE
                .iter()
                .find(|(from, _)| *from == c)
                .map_or(c, |(_, to)| *to)
        })
        .collect()
}

/// Drop path separators, shell wildcards and control characters.
pub fn strip_illegal_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect()
}
