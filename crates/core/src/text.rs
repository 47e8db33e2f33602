// ABOUTME: ASCII folding and label normalization used for every text comparison.
// ABOUTME: Comparison-only; displayed values always keep their original spelling.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-zÀ-ÿ'.-]+").unwrap());

/// Maps a Latin-1/Latin Extended-A letter to its unaccented ASCII base.
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'À'..='Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'à'..='å' | 'ā' | 'ă' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'È'..='Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => "E",
        'è'..='ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'Ì'..='Ï' | 'Ī' | 'İ' => "I",
        'ì'..='ï' | 'ī' | 'ı' => "i",
        'Ð' => "D",
        'ð' => "d",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò'..='Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'ò'..='ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ù'..='Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ù'..='ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        'Š' | 'Ś' | 'Ş' => "S",
        'š' | 'ś' | 'ş' => "s",
        'Ž' | 'Ź' | 'Ż' => "Z",
        'ž' | 'ź' | 'ż' => "z",
        'Ł' => "L",
        'ł' => "l",
        'Ř' => "R",
        'ř' => "r",
        'Ť' | 'Ţ' => "T",
        'ť' | 'ţ' => "t",
        _ => return None,
    };
    Some(folded)
}

/// Replaces accented letters with their ASCII base; other characters pass through.
pub fn fold_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match fold_char(c) {
            Some(folded) => out.push_str(folded),
            None => out.push(c),
        }
    }
    out
}

/// Comparison key for a label: ASCII-folded, lowercase, letters and single spaces only.
///
/// "Ciudad Autónoma de Buenos Aires" and "CIUDAD AUTONOMA DE BUENOS-AIRES"
/// both become "ciudad autonoma de buenos aires".
pub fn normalize_label(s: &str) -> String {
    let folded = fold_ascii(s);
    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        if c.is_ascii_alphabetic() {
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word-like runs (letters, apostrophes, dots, hyphens) in document order.
pub fn words(s: &str) -> Vec<&str> {
    WORD_RE.find_iter(s).map(|m| m.as_str()).collect()
}

/// Mirrors `str.isupper`: at least one cased letter and no lowercase ones.
pub fn is_all_upper(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// True when `s` contains an ASCII digit; numeric symbols like `½` or `Ⅻ` do not count.
pub fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}
