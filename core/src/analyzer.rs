//! Text analysis: raw text in, normalized index terms out.
//!
//! Stages run in a fixed order over a lazy token stream:
//! tokenize (NFKC) -> lowercase -> possessive strip -> ASCII fold ->
//! stopword removal (optional) -> English stemming -> consecutive duplicate collapse.

use crate::config::AnalyzerConfig;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeSet, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex =
        Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}\p{M}]*(?:['’][\p{L}\p{N}\p{M}]+)*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","can't","cannot","could","couldn't",
    "did","didn't","do","does","doesn't","doing","don't","down","during",
    "each","few","for","from","further",
    "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","her","here","hers","herself","him","himself","his","how",
    "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","its","itself",
    "me","more","most","mustn't","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","she'd","she'll","should","shouldn't","so","some","such",
    "than","that","the","their","theirs","them","themselves","then","there","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
    "under","until","up","very",
    "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","when","where","which","while","who","whom","why","with","won't","would","wouldn't",
    "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves",
];

/// The built-in English stopword list.
pub fn default_stopwords() -> BTreeSet<String> {
    ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect()
}

/// Stateless analyzer; cloning it copies the resolved stopword set.
///
/// The index owns the analyzer it was built with, and query parsing goes
/// through that same instance.
#[derive(Debug, Clone)]
pub struct Analyzer {
    stopwords: HashSet<String>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let stopwords = if config.stopwords_enabled {
            // Stopwords are matched after folding, so fold them the same way.
            config.stopwords.iter().map(|w| fold_to_ascii(&w.to_lowercase())).collect()
        } else {
            HashSet::new()
        };
        Self { stopwords }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Lazily analyze `text`. Calling this again on the same text yields the same terms.
    pub fn analyze<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let mut previous: Option<String> = None;
        tokenize(text)
            .map(|token| token.to_lowercase())
            .map(strip_possessive)
            .map(|token| fold_to_ascii(&token))
            .filter(|token| !token.is_empty())
            .filter(move |token| !self.is_stopword(token))
            .map(|token| stem(&token))
            .filter(move |term| {
                if previous.as_deref() == Some(term.as_str()) {
                    return false;
                }
                previous = Some(term.clone());
                true
            })
    }

    pub fn analyze_to_vec(&self, text: &str) -> Vec<String> {
        self.analyze(text).collect()
    }
}

/// Split on anything that is not a letter or digit. Apostrophes are kept only
/// between word characters so possessives survive until they are stripped.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    RE.find_iter(text).map(|m| m.as_str().nfkc().collect::<String>())
}

pub fn strip_possessive(mut token: String) -> String {
    for suffix in ["'s", "’s"] {
        if token.len() > suffix.len() && token.ends_with(suffix) {
            token.truncate(token.len() - suffix.len());
            break;
        }
    }
    token
}

/// Map accented Latin letters to their ASCII base. Characters with no ASCII
/// counterpart pass through unchanged.
pub fn fold_to_ascii(token: &str) -> String {
    if token.is_ascii() {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len());
    for c in token.nfd() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'þ' => out.push_str("th"),
            'ø' => out.push('o'),
            'đ' | 'ð' => out.push('d'),
            'ł' => out.push('l'),
            'ħ' => out.push('h'),
            'ı' => out.push('i'),
            '’' | '‘' => out.push('\''),
            _ => out.push(c),
        }
    }
    out
}

pub fn stem(token: &str) -> String {
    STEMMER.stem(token).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_punctuation() {
        let tokens: Vec<String> = tokenize("Hello, world! 1984-born (x)").collect();
        assert_eq!(tokens, vec!["Hello", "world", "1984", "born", "x"]);
    }

    #[test]
    fn tokenize_keeps_inner_apostrophes() {
        let tokens: Vec<String> = tokenize("Einstein's 'quoted' theory").collect();
        assert_eq!(tokens, vec!["Einstein's", "quoted", "theory"]);
    }

    #[test]
    fn possessive_strip() {
        assert_eq!(strip_possessive("einstein's".into()), "einstein");
        assert_eq!(strip_possessive("einstein’s".into()), "einstein");
        assert_eq!(strip_possessive("'s".into()), "'s");
        assert_eq!(strip_possessive("bus".into()), "bus");
    }

    #[test]
    fn ascii_folding() {
        assert_eq!(fold_to_ascii("café"), "cafe");
        assert_eq!(fold_to_ascii("müller"), "muller");
        assert_eq!(fold_to_ascii("straße"), "strasse");
        assert_eq!(fold_to_ascii("søren"), "soren");
        assert_eq!(fold_to_ascii("plain"), "plain");
    }

    #[test]
    fn basic_analyze() {
        let a = Analyzer::default();
        let t = a.analyze_to_vec("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn collapses_consecutive_duplicates_only() {
        let a = Analyzer::default();
        assert_eq!(a.analyze_to_vec("runs running"), vec!["run"]);
        assert_eq!(a.analyze_to_vec("run fast run"), vec!["run", "fast", "run"]);
    }

    #[test]
    fn stopwords_can_be_disabled() {
        let on = Analyzer::default();
        let off = Analyzer::new(AnalyzerConfig::without_stopwords());
        assert!(on.analyze_to_vec("the of a").is_empty());
        assert_eq!(off.analyze_to_vec("the of a"), vec!["the", "of", "a"]);
    }

    #[test]
    fn custom_stopword_set() {
        let config = AnalyzerConfig {
            stopwords_enabled: true,
            stopwords: ["Capital".to_string()].into_iter().collect(),
        };
        let a = Analyzer::new(config);
        assert_eq!(a.analyze_to_vec("the capital"), vec!["the"]);
    }

    #[test]
    fn accented_stopword_matches_folded_token() {
        let config = AnalyzerConfig {
            stopwords_enabled: true,
            stopwords: ["été".to_string()].into_iter().collect(),
        };
        let a = Analyzer::new(config);
        assert!(a.is_stopword("ete"));
        assert!(a.analyze_to_vec("Été").is_empty());
    }
}
