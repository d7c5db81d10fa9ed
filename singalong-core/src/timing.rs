//! Timed-lyrics document parsing.
//!
//! A timing document looks like this:
//!
//! ```xml
//! <data>
//!   <param><i va="0.50">Hel</i><i va="0.90">lo </i></param>
//!   <param><i va="2.10">world</i></param>
//! </data>
//! ```
//!
//! Every `param` is one lyric line and every `i` is one timed word, with `va`
//! holding its start time in seconds.

use crate::error::ParseError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const ROOT_ELEMENT: &str = "data";
const LINE_ELEMENT: &str = "param";
const WORD_ELEMENT: &str = "i";
const START_ATTRIBUTE: &str = "va";

/// Which token list drives highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One token per line.
    Line,
    /// One token per timed word.
    #[default]
    Word,
}

/// Smallest unit of text carrying its own start time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedToken {
    /// Position in the token list of its granularity.
    pub index: usize,
    /// Start time in seconds.
    pub start: f64,
    pub text: String,
}

/// A lyric line with its timed words.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    pub index: usize,
    /// Start of the first word, in seconds.
    pub start: f64,
    /// All word texts concatenated.
    pub text: String,
    /// Words with their flat word indices.
    pub words: Vec<TimedToken>,
}

/// Where a flat word index lives inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordLocation {
    pub line: usize,
    pub word: usize,
}

/// Parsed timing document with precomputed lookup sequences.
///
/// Immutable once built. The timestamp sequences are index-aligned with the
/// token lists of the same granularity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingDocument {
    lines: Vec<LyricLine>,
    line_tokens: Vec<TimedToken>,
    line_timestamps: Vec<f64>,
    word_tokens: Vec<TimedToken>,
    word_timestamps: Vec<f64>,
    /// Flat index of the first word of each line.
    line_offsets: Vec<usize>,
}

impl TimingDocument {
    /// Parse a timing document.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the markup is malformed, the `data`/`param`/`i`
    /// structure is missing, a start time is absent or invalid, or start times
    /// decrease in document order.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(input);
        let mut parser = Parser::default();

        loop {
            let position = reader.buffer_position().try_into().unwrap_or(u64::MAX);
            let event = reader
                .read_event()
                .map_err(|source| ParseError::Malformed { position, source })?;

            match event {
                Event::Start(element) => parser.open(&element, position)?,
                Event::Empty(element) => {
                    parser.open(&element, position)?;
                    parser.close();
                }
                Event::End(_) => parser.close(),
                Event::Text(text) => {
                    if parser.in_word() {
                        let text = text
                            .unescape()
                            .map_err(|source| ParseError::Malformed {
                                position,
                                source: source.into(),
                            })?;
                        parser.push_text(&text);
                    }
                }
                Event::CData(data) => {
                    if parser.in_word() {
                        parser.push_text(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        parser.finish()
    }

    /// Build a document from already-extracted lines of `(start, text)` words.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if there are no lines, a line has no words, a
    /// start time is negative or not finite, or start times decrease.
    pub fn from_lines(lines: Vec<Vec<(f64, String)>>) -> Result<Self, ParseError> {
        if lines.is_empty() {
            return Err(ParseError::MissingElement {
                element: LINE_ELEMENT,
            });
        }

        let mut document = Self::default();
        let mut previous: Option<f64> = None;

        for (line_index, raw_words) in lines.into_iter().enumerate() {
            if raw_words.is_empty() {
                return Err(ParseError::EmptyLine { line: line_index });
            }

            let offset = document.word_tokens.len();
            let mut words = Vec::with_capacity(raw_words.len());

            for (word_index, (start, text)) in raw_words.into_iter().enumerate() {
                if !start.is_finite() || start < 0.0 {
                    return Err(ParseError::InvalidTime {
                        line: line_index,
                        word: word_index,
                        value: start.to_string(),
                    });
                }
                if let Some(previous) = previous {
                    if start < previous {
                        return Err(ParseError::OutOfOrder {
                            line: line_index,
                            word: word_index,
                            start,
                            previous,
                        });
                    }
                }
                previous = Some(start);

                words.push(TimedToken {
                    index: offset + word_index,
                    start,
                    text,
                });
            }

            let start = words.first().map_or(0.0, |word| word.start);
            let text: String = words.iter().map(|word| word.text.as_str()).collect();

            document.line_offsets.push(offset);
            document.word_timestamps.extend(words.iter().map(|word| word.start));
            document.word_tokens.extend(words.iter().cloned());
            document.line_timestamps.push(start);
            document.line_tokens.push(TimedToken {
                index: line_index,
                start,
                text: text.clone(),
            });
            document.lines.push(LyricLine {
                index: line_index,
                start,
                text,
                words,
            });
        }

        Ok(document)
    }

    /// All lines in document order.
    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// Tokens of the given granularity.
    #[must_use]
    pub fn tokens(&self, granularity: Granularity) -> &[TimedToken] {
        match granularity {
            Granularity::Line => &self.line_tokens,
            Granularity::Word => &self.word_tokens,
        }
    }

    /// Flattened start times of the given granularity, in seconds.
    #[must_use]
    pub fn timestamps(&self, granularity: Granularity) -> &[f64] {
        match granularity {
            Granularity::Line => &self.line_timestamps,
            Granularity::Word => &self.word_timestamps,
        }
    }

    /// Number of tokens of the given granularity.
    #[must_use]
    pub fn token_count(&self, granularity: Granularity) -> usize {
        self.timestamps(granularity).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Map a flat word index back to its line and position within the line.
    #[must_use]
    pub fn word_location(&self, flat_index: usize) -> Option<WordLocation> {
        if flat_index >= self.word_tokens.len() {
            return None;
        }
        let line = self
            .line_offsets
            .partition_point(|&offset| offset <= flat_index)
            .checked_sub(1)?;
        Some(WordLocation {
            line,
            word: flat_index - self.line_offsets[line],
        })
    }

    /// Line containing the token at `index` of the given granularity.
    #[must_use]
    pub fn line_of(&self, granularity: Granularity, index: usize) -> Option<usize> {
        match granularity {
            Granularity::Line => (index < self.lines.len()).then_some(index),
            Granularity::Word => self.word_location(index).map(|location| location.line),
        }
    }

    /// Plain text of the whole document, one line per `param`.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl FromStr for TimingDocument {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Element currently open in the markup tree.
enum Frame {
    Root,
    Line,
    Word,
    Other(String),
}

impl Frame {
    fn name(&self) -> &str {
        match self {
            Self::Root => ROOT_ELEMENT,
            Self::Line => LINE_ELEMENT,
            Self::Word => WORD_ELEMENT,
            Self::Other(name) => name,
        }
    }
}

#[derive(Default)]
struct Parser {
    stack: Vec<Frame>,
    seen_root: bool,
    lines: Vec<Vec<(f64, String)>>,
    word: Option<(f64, String)>,
}

impl Parser {
    fn open(&mut self, element: &BytesStart<'_>, position: u64) -> Result<(), ParseError> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();

        let frame = match self.stack.last() {
            None => {
                if self.seen_root {
                    return Err(ParseError::MultipleRoots { found: name });
                }
                if name != ROOT_ELEMENT {
                    return Err(ParseError::UnexpectedRoot {
                        expected: ROOT_ELEMENT,
                        found: name,
                    });
                }
                self.seen_root = true;
                Frame::Root
            }
            Some(Frame::Root) if name == LINE_ELEMENT => {
                self.lines.push(Vec::new());
                Frame::Line
            }
            Some(Frame::Line) if name == WORD_ELEMENT => {
                let line = self.lines.len().saturating_sub(1);
                let word = self.lines.last().map_or(0, Vec::len);
                let start = parse_start(element, line, word, position)?;
                self.word = Some((start, String::new()));
                Frame::Word
            }
            Some(_) => Frame::Other(name),
        };

        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(Frame::Word) = self.stack.pop() {
            if let (Some(word), Some(line)) = (self.word.take(), self.lines.last_mut()) {
                line.push(word);
            }
        }
    }

    fn in_word(&self) -> bool {
        self.word.is_some()
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, word_text)) = self.word.as_mut() {
            word_text.push_str(text);
        }
    }

    fn finish(self) -> Result<TimingDocument, ParseError> {
        if let Some(frame) = self.stack.last() {
            return Err(ParseError::Truncated {
                element: frame.name().to_string(),
            });
        }
        if !self.seen_root {
            return Err(ParseError::MissingRoot {
                expected: ROOT_ELEMENT,
            });
        }
        TimingDocument::from_lines(self.lines)
    }
}

fn parse_start(
    element: &BytesStart<'_>,
    line: usize,
    word: usize,
    position: u64,
) -> Result<f64, ParseError> {
    let malformed = |source: quick_xml::Error| ParseError::Malformed { position, source };

    let attribute = element
        .try_get_attribute(START_ATTRIBUTE)
        .map_err(|e| malformed(e.into()))?
        .ok_or(ParseError::MissingAttribute {
            line,
            word,
            attribute: START_ATTRIBUTE,
        })?;
    let value = attribute.unescape_value().map_err(|e| malformed(e.into()))?;

    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|start| start.is_finite() && *start >= 0.0)
        .ok_or_else(|| ParseError::InvalidTime {
            line,
            word,
            value: value.into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<data>
  <param>
    <i va="0.50">Hel</i><i va="0.90">lo </i>
  </param>
  <param>
    <i va="2.10">big </i><i va="2.10">wide </i><i va="3.00">world</i>
  </param>
</data>"#;

    #[test]
    fn test_parse_lines_and_words() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.lines().len(), 2);
        assert_eq!(doc.lines()[0].text, "Hello ");
        assert!((doc.lines()[0].start - 0.5).abs() < f64::EPSILON);
        assert_eq!(doc.lines()[1].text, "big wide world");
        assert_eq!(doc.lines()[1].words.len(), 3);
    }

    #[test]
    fn test_word_tokens_carry_flat_index() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        let indices: Vec<_> = doc.lines()[1].words.iter().map(|w| w.index).collect();
        assert_eq!(indices, vec![2, 3, 4]);

        let words = doc.tokens(Granularity::Word);
        assert_eq!(words.len(), 5);
        for (i, word) in words.iter().enumerate() {
            assert_eq!(word.index, i);
        }
    }

    #[test]
    fn test_timestamps_by_granularity() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.timestamps(Granularity::Word), &[0.5, 0.9, 2.1, 2.1, 3.0]);
        assert_eq!(doc.timestamps(Granularity::Line), &[0.5, 2.1]);
        assert_eq!(doc.token_count(Granularity::Line), 2);
        assert_eq!(doc.tokens(Granularity::Line)[1].text, "big wide world");
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        for granularity in [Granularity::Line, Granularity::Word] {
            let timestamps = doc.timestamps(granularity);
            assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn test_single_line_document() {
        let doc = TimingDocument::parse(r#"<data><param><i va="1">only</i></param></data>"#)
            .unwrap();
        assert_eq!(doc.lines().len(), 1);
        assert_eq!(doc.text(), "only");
    }

    #[test]
    fn test_text_is_unescaped_and_cdata_accepted() {
        let input = r#"<data><param><i va="0">rock &amp; roll</i><i va="1"><![CDATA[ <3]]></i></param></data>"#;
        let doc = TimingDocument::parse(input).unwrap();
        assert_eq!(doc.lines()[0].text, "rock & roll <3");
    }

    #[test]
    fn test_empty_item_has_empty_text() {
        let doc =
            TimingDocument::parse(r#"<data><param><i va="1"/><i va="2">la</i></param></data>"#)
                .unwrap();
        assert_eq!(doc.tokens(Granularity::Word)[0].text, "");
        assert_eq!(doc.lines()[0].text, "la");
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let input = r#"<data><title>x</title><param><meta/><i va="1">a</i></param></data>"#;
        let doc = TimingDocument::parse(input).unwrap();
        assert_eq!(doc.token_count(Granularity::Word), 1);
        assert_eq!(doc.lines()[0].text, "a");
    }

    #[test]
    fn test_start_attribute_whitespace_trimmed() {
        let doc = TimingDocument::parse(r#"<data><param><i va=" 12.25 ">a</i></param></data>"#)
            .unwrap();
        assert!((doc.timestamps(Granularity::Word)[0] - 12.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            TimingDocument::parse(""),
            Err(ParseError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_plain_text_fails() {
        assert!(matches!(
            TimingDocument::parse("just some lyrics"),
            Err(ParseError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_truncated_document_fails() {
        let truncated = &SAMPLE[..SAMPLE.len() / 2];
        let result = TimingDocument::parse(truncated);
        assert!(matches!(
            result,
            Err(ParseError::Truncated { .. } | ParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_mismatched_end_tag_fails() {
        let result = TimingDocument::parse(r#"<data><param><i va="1">a</param></i></data>"#);
        assert!(matches!(result, Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn test_wrong_root_fails() {
        let result = TimingDocument::parse(r#"<lyrics><param><i va="1">a</i></param></lyrics>"#);
        assert!(matches!(
            result,
            Err(ParseError::UnexpectedRoot { ref found, .. }) if found == "lyrics"
        ));
    }

    #[test]
    fn test_second_root_fails() {
        let result = TimingDocument::parse(
            r#"<data><param><i va="1">a</i></param></data><data></data>"#,
        );
        assert!(matches!(result, Err(ParseError::MultipleRoots { .. })));
    }

    #[test]
    fn test_missing_params_fails() {
        assert!(matches!(
            TimingDocument::parse("<data></data>"),
            Err(ParseError::MissingElement { element: "param" })
        ));
        assert!(matches!(
            TimingDocument::parse("<data/>"),
            Err(ParseError::MissingElement { .. })
        ));
    }

    #[test]
    fn test_empty_line_fails() {
        let result =
            TimingDocument::parse(r#"<data><param><i va="1">a</i></param><param/></data>"#);
        assert!(matches!(result, Err(ParseError::EmptyLine { line: 1 })));
    }

    #[test]
    fn test_missing_start_attribute_fails() {
        let result = TimingDocument::parse(r#"<data><param><i va="1">a</i><i>b</i></param></data>"#);
        assert!(matches!(
            result,
            Err(ParseError::MissingAttribute { line: 0, word: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_start_values_fail() {
        for value in ["", "abc", "1.5s", "-1", "NaN", "inf"] {
            let input = format!(r#"<data><param><i va="{value}">a</i></param></data>"#);
            assert!(
                matches!(
                    TimingDocument::parse(&input),
                    Err(ParseError::InvalidTime { .. })
                ),
                "value {value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_decreasing_start_times_fail() {
        let input = r#"<data><param><i va="2">a</i></param><param><i va="1">b</i></param></data>"#;
        assert!(matches!(
            TimingDocument::parse(input),
            Err(ParseError::OutOfOrder { line: 1, word: 0, .. })
        ));
    }

    #[test]
    fn test_word_location() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.word_location(0), Some(WordLocation { line: 0, word: 0 }));
        assert_eq!(doc.word_location(1), Some(WordLocation { line: 0, word: 1 }));
        assert_eq!(doc.word_location(2), Some(WordLocation { line: 1, word: 0 }));
        assert_eq!(doc.word_location(4), Some(WordLocation { line: 1, word: 2 }));
        assert_eq!(doc.word_location(5), None);
    }

    #[test]
    fn test_line_of() {
        let doc = TimingDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.line_of(Granularity::Word, 3), Some(1));
        assert_eq!(doc.line_of(Granularity::Line, 1), Some(1));
        assert_eq!(doc.line_of(Granularity::Line, 2), None);
    }

    #[test]
    fn test_from_str() {
        let doc: TimingDocument = SAMPLE.parse().unwrap();
        assert_eq!(doc.lines().len(), 2);
    }

    #[test]
    fn test_from_lines_validates() {
        assert!(TimingDocument::from_lines(vec![]).is_err());
        assert!(TimingDocument::from_lines(vec![vec![(f64::NAN, "a".into())]]).is_err());

        let doc =
            TimingDocument::from_lines(vec![vec![(0.0, "hello".into())], vec![(5.0, "world".into())]])
                .unwrap();
        assert_eq!(doc.text(), "hello\nworld");
    }
}
