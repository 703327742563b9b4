//! String canonicalisations used for matching routes and naming files.
//!
//! All of them decompose to NFD and drop combining marks, so `"Córdoba"`
//! and `"Cordoba"` end up identical.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

fn without_marks(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().filter(|c| !is_combining_mark(*c))
}

/// Key used to compare route segments with names: lowercase, no
/// diacritics, no whitespace. `"Ciudad de México"` → `"ciudaddemexico"`.
/// `/` is dropped too, so a key is always a single path segment.
pub fn route_key(s: &str) -> String {
    without_marks(&s.to_lowercase())
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect()
}

/// Collapse every whitespace run into `sep`
fn join_whitespace(chars: impl Iterator<Item = char>, sep: char) -> String {
    let mut out = String::new();
    let mut in_space = false;
    for c in chars {
        if c.is_whitespace() {
            if !in_space {
                out.push(sep);
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Static page filename component: `"Villa María"` → `"villa-maria"`.
/// Keeps only `[a-z0-9-]`.
pub fn filename_slug(s: &str) -> String {
    let lowered = s.to_lowercase();
    join_whitespace(without_marks(&lowered), '-')
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Narrative page directory name: `"Tierra del Fuego"` → `"tierra_del_fuego"`.
/// Quotes and apostrophes vanish, anything outside `[A-Za-z0-9_]` too.
pub fn dir_slug(s: &str) -> String {
    let unquoted = without_marks(s).filter(|c| !matches!(c, '\'' | '’' | '"'));
    join_whitespace(unquoted, '_')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase()
}

/// Download filename component: keeps `[A-Za-z0-9]` and whitespace, then
/// turns whitespace runs into `_`. Accented letters are dropped, not folded.
pub fn title_fragment(s: &str) -> String {
    join_whitespace(
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace()),
        '_',
    )
}

pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
