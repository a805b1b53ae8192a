//! Country lookup helpers for the dropdown: accent-insensitive search and
//! shortened display names.

use super::model::CountryId;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const UNITED_KINGDOM_PREFIX: &str = "REGATUL UNIT AL MARII BRITANI";
const UNITED_KINGDOM_SHORT: &str = "MAREA BRITANIE";

/// Strip a diacritic from a lower-case letter.
fn fold_char(c: char) -> char {
    match c {
        'ă' | 'â' | 'à' | 'á' | 'ä' | 'ã' | 'å' => 'a',
        'î' | 'ì' | 'í' | 'ï' => 'i',
        'ș' | 'ş' | 'š' => 's',
        'ț' | 'ţ' => 't',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' | 'č' => 'c',
        'ñ' => 'n',
        'ž' => 'z',
        _ => c,
    }
}

/// Lower-case, accent-free, single-spaced form used for matching.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.trim().to_lowercase().chars().map(fold_char).collect();
    WHITESPACE_REGEX.replace_all(&folded, " ").into_owned()
}

fn word_regex(term: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(term))).ok()
}

/// `word` is the whole-word pattern of `term`, built once per search.
fn match_score(term: &str, word: Option<&Regex>, name: &str) -> Option<f64> {
    if !name.contains(term) {
        return None;
    }
    let ratio = term.chars().count() as f64 / name.chars().count() as f64;

    let score = if name == term {
        100.0
    } else if name.starts_with(term) {
        75.0 + ratio * 20.0
    } else if word.is_some_and(|re| re.is_match(name)) {
        60.0 + ratio * 15.0
    } else {
        30.0 + ratio * 25.0
    };
    Some(score)
}

/// Countries matching `term`, best match first, at most `max_results`.
pub fn search_countries(term: &str, countries: &[CountryId], max_results: usize) -> Vec<CountryId> {
    let term = normalize_text(term);
    if term.is_empty() {
        return countries.iter().take(max_results).cloned().collect();
    }

    let word = word_regex(&term);
    let mut matches: Vec<(&CountryId, f64)> = countries
        .iter()
        .filter_map(|c| {
            match_score(&term, word.as_ref(), &normalize_text(c.as_str())).map(|s| (c, s))
        })
        .collect();
    matches.sort_by(|a, b| b.1.total_cmp(&a.1));

    matches
        .into_iter()
        .take(max_results)
        .map(|(c, _)| c.clone())
        .collect()
}

/// Short label for names too long for the dropdown.
pub fn display_name(country: &CountryId) -> String {
    if country.as_str().starts_with(UNITED_KINGDOM_PREFIX) {
        UNITED_KINGDOM_SHORT.to_string()
    } else {
        country.to_string()
    }
}
