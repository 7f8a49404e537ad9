use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain(text) | Segment::Match(text) => text,
        }
    }
}

/// Case-insensitive keyword matcher.
///
/// Matches are leftmost and non-overlapping. When several keywords match at
/// the same position the longest one wins, so "rust" inside "rustacean" is
/// not reported if "rustacean" is also a keyword.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new<I, T>(keywords: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut words: Vec<String> = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        // regex alternation is leftmost-first, so order decides which keyword wins
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        words.dedup();

        if words.is_empty() {
            return Self { pattern: None };
        }
        let alternation = words
            .iter()
            .map(|word| regex::escape(word))
            .collect::<Vec<_>>()
            .join("|");
        // escaped literals always form a valid pattern; None only past the size limit
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()
            .ok();
        Self { pattern }
    }

    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let Some(pattern) = &self.pattern else {
            return if text.is_empty() {
                Vec::new()
            } else {
                vec![Segment::Plain(text)]
            };
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for found in pattern.find_iter(text) {
            if found.start() > last {
                segments.push(Segment::Plain(&text[last..found.start()]));
            }
            segments.push(Segment::Match(found.as_str()));
            last = found.end();
        }
        if last < text.len() {
            segments.push(Segment::Plain(&text[last..]));
        }
        segments
    }
}

pub fn highlight<'a, T: AsRef<str>>(text: &'a str, keywords: &[T]) -> Vec<Segment<'a>> {
    Highlighter::new(keywords).segments(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn matches_case_insensitively() {
        assert_eq!(
            highlight("Rust 1.80 ships; rust fans cheer", &["RUST"]),
            vec![
                Segment::Match("Rust"),
                Segment::Plain(" 1.80 ships; "),
                Segment::Match("rust"),
                Segment::Plain(" fans cheer"),
            ]
        );
    }

    #[test]
    fn longest_keyword_wins_at_same_position() {
        assert_eq!(
            highlight("Open source AI models", &["open", "open source", "AI"]),
            vec![
                Segment::Match("Open source"),
                Segment::Plain(" "),
                Segment::Match("AI"),
                Segment::Plain(" models"),
            ]
        );
    }

    #[test]
    fn leftmost_match_beats_longer_later_one() {
        assert_eq!(
            highlight("data breach", &["data", "a breach"]),
            vec![Segment::Match("data"), Segment::Plain(" breach")]
        );
    }

    #[test]
    fn metacharacters_are_literal() {
        assert_eq!(
            highlight("C++ and C#", &["c++", "C#"]),
            vec![
                Segment::Match("C++"),
                Segment::Plain(" and "),
                Segment::Match("C#"),
            ]
        );
    }

    #[test]
    fn no_keywords_yields_plain_text() {
        let none: [&str; 0] = [];
        assert_eq!(highlight("headline", &none), vec![Segment::Plain("headline")]);
        assert_eq!(highlight("headline", &["  "]), vec![Segment::Plain("headline")]);
        assert!(highlight("", &none).is_empty());
    }
}
