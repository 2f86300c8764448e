/// Detection of generic, auto-numbered chapter titles
///
/// Works on local titles alone, so a book still gets a signal when the
/// catalog lookup fails and no catalog chapters are available.
use super::LocalChapter;
use crate::config::DEFAULT_NEEDS_UPDATE_THRESHOLD;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// "Chapter 3", "Track 01", "Part 2", "Ch. 4", "01 - Chapter 1", "Disc 1-03",
/// "Chapter Twenty-One", "Chapter IV", "Chapter 1 of 20"
///
/// The `number` and `total` tokens are checked with [`is_numeral`].
static NUMBERED_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:\d+\s*[-.:)]\s*)?(?:chapter|chap\.?|ch\.?|track|part|disc|section|episode|book)\s*#?\s*(?P<number>[a-z0-9]+(?:[- ][a-z]+)?)(?:\s*[-._:/]\s*\d+)*(?:\s+of\s+(?P<total>[a-z0-9]+(?:[- ][a-z]+)?))?\s*[.:]?$",
    )
    .unwrap()
});

/// "07", "3.", "1-02"
static NUMERIC_ONLY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(?:\s*[-._:/]\s*\d+)*\s*[.:)]?$").unwrap()
});

/// Well-formed roman numeral up to 3999 (may match empty)
static ROMAN_NUMERAL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^m{0,3}(?:cm|cd|d?c{0,3})(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3})$").unwrap()
});

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "hundred",
];

const TENS_WORDS: &[&str] = &["twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety"];

const UNIT_WORDS: &[&str] = &["one", "two", "three", "four", "five", "six", "seven", "eight", "nine"];

/// Digits, a spelled-out number below one hundred, or a roman numeral
pub fn is_numeral(token: &str) -> bool {
    let token = token.trim().to_lowercase();
    if token.is_empty() {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let words: Vec<&str> = token.split(|c| c == '-' || c == ' ').filter(|w| !w.is_empty()).collect();
    match words.as_slice() {
        [word] => {
            NUMBER_WORDS.contains(word) || TENS_WORDS.contains(word) || ROMAN_NUMERAL_REGEX.is_match(word)
        }
        [tens, unit] => TENS_WORDS.contains(tens) && UNIT_WORDS.contains(unit),
        _ => false,
    }
}

fn is_numbered_label(title: &str) -> bool {
    let Some(captures) = NUMBERED_LABEL_REGEX.captures(title) else {
        return false;
    };

    // A spelled or roman number must be its own word: "Chi" is not "Ch. I"
    let number_ok = captures.name("number").map_or(false, |m| {
        let starts_with_letter = m.as_str().starts_with(|c: char| c.is_alphabetic());
        let glued = title[..m.start()].chars().last().map_or(false, |c| c.is_alphabetic());
        is_numeral(m.as_str()) && !(starts_with_letter && glued)
    });
    let total_ok = captures.name("total").map_or(true, |m| is_numeral(m.as_str()));
    number_ok && total_ok
}

/// Placeholder statistics for one book
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlaceholderAnalysis {
    pub total: usize,
    /// Titles that are placeholders, empty ones included
    pub placeholder_count: usize,
    pub empty_count: usize,
    pub needs_update: bool,
}

impl PlaceholderAnalysis {
    pub fn placeholder_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.placeholder_count as f64 / self.total as f64
        }
    }
}

/// Whether a title looks generic rather than descriptive
pub fn is_placeholder_title(title: &str) -> bool {
    let title = title.trim();
    title.is_empty() || is_numbered_label(title) || NUMERIC_ONLY_REGEX.is_match(title)
}

/// Analyze local titles with the default threshold
pub fn analyze(local: &[LocalChapter]) -> PlaceholderAnalysis {
    analyze_with_threshold(local, DEFAULT_NEEDS_UPDATE_THRESHOLD)
}

/// Analyze local titles; `needs_update` is set when the placeholder fraction
/// reaches `threshold` or any title is empty.
pub fn analyze_with_threshold(local: &[LocalChapter], threshold: f64) -> PlaceholderAnalysis {
    let total = local.len();
    let empty_count = local.iter().filter(|c| c.title.trim().is_empty()).count();
    let placeholder_count = local.iter().filter(|c| is_placeholder_title(&c.title)).count();

    let needs_update = total > 0
        && (empty_count > 0 || placeholder_count as f64 / total as f64 >= threshold);

    PlaceholderAnalysis {
        total,
        placeholder_count,
        empty_count,
        needs_update,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(titles: &[&str]) -> Vec<LocalChapter> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| LocalChapter::new(*title, i as u64 * 1000, (i as u64 + 1) * 1000))
            .collect()
    }

    #[test]
    fn test_placeholder_titles() {
        let placeholders = [
            "Chapter 1", "CHAPTER 12", "chapter1", "Track 01", "Part 3", "Ch. 4", "chap 7",
            "Disc 1 - 03", "Episode 9.", "01 - Chapter 1", "07", "3.", "", "   ",
        ];
        for title in placeholders {
            assert!(is_placeholder_title(title), "expected placeholder: {:?}", title);
        }
    }

    #[test]
    fn test_descriptive_titles() {
        let descriptive = [
            "Introduction",
            "Chapter 1: The Beginning",
            "The Journey Begins",
            "Chapter One: Arrival",
            "Part 2 of the Story",
            "Chapter Mixup",
            "Book Club",
            "Partings",
        ];
        for title in descriptive {
            assert!(!is_placeholder_title(title), "expected descriptive: {:?}", title);
        }

        // A bare number is indistinguishable from a track number
        assert!(is_placeholder_title("1984"));
    }

    #[test]
    fn test_word_and_roman_numbered_titles() {
        let placeholders = [
            "Chapter One",
            "CHAPTER TWELVE",
            "Part Twenty-One",
            "Chapter Forty Two",
            "Chapter IV",
            "chapter xii",
            "Book III",
            "Chapter 1 of 20",
            "Track 3 of Twelve",
            "Chapter Three of Ten",
        ];
        for title in placeholders {
            assert!(is_placeholder_title(title), "expected placeholder: {:?}", title);
        }

        assert!(!is_placeholder_title("Chapter Twenty-Bananas"));
        assert!(!is_placeholder_title("Chapter IIII"));
        assert!(!is_placeholder_title("Chapter 1 of Many"));
        assert!(!is_placeholder_title("Chi"));
    }

    #[test]
    fn test_is_numeral() {
        assert!(is_numeral("42"));
        assert!(is_numeral("seventeen"));
        assert!(is_numeral("ninety-nine"));
        assert!(is_numeral("MCMXC"));
        assert!(!is_numeral(""));
        assert!(!is_numeral("ix-one"));
        assert!(!is_numeral("story"));
    }

    #[test]
    fn test_word_numbered_book_needs_update() {
        let chapters = titled(&["Chapter One", "Chapter Two", "Chapter Three"]);
        let analysis = analyze(&chapters);
        assert_eq!(analysis.placeholder_count, 3);
        assert!(analysis.needs_update);
    }

    #[test]
    fn test_analyze_threshold() {
        let half = titled(&["Chapter 1", "The Storm"]);
        let analysis = analyze(&half);
        assert_eq!(analysis.placeholder_count, 1);
        assert_eq!(analysis.placeholder_ratio(), 0.5);
        assert!(analysis.needs_update);

        let minority = titled(&["Chapter 1", "The Storm", "Aftermath"]);
        assert!(!analyze(&minority).needs_update);
        assert!(analyze_with_threshold(&minority, 0.3).needs_update);
    }

    #[test]
    fn test_any_empty_title_needs_update() {
        let chapters = titled(&["Prologue", "", "Aftermath", "Epilogue"]);
        let analysis = analyze(&chapters);
        assert_eq!(analysis.empty_count, 1);
        assert!(analysis.placeholder_ratio() < 0.5);
        assert!(analysis.needs_update);
    }

    #[test]
    fn test_empty_list_does_not_need_update() {
        let analysis = analyze(&[]);
        assert_eq!(analysis.total, 0);
        assert!(!analysis.needs_update);
    }
}
