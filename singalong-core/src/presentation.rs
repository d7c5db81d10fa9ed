//! View model for the lyric display.
//!
//! Turns a document plus the resolved index into per-token styling and a
//! scroll target. Rendering backends only need to draw what this produces.

use crate::config::DisplayConfig;
use crate::timing::{Granularity, TimingDocument};

/// Styling inputs for building a view.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayStyle {
    /// Color of the exact current token
    pub highlight_color: String,
    /// Color of every other token
    pub base_color: String,
    /// Opacity of tokens not reached yet
    pub dimmed_opacity: f32,
    /// Scroll distance per token index
    pub scroll_step: f64,
}

impl DisplayStyle {
    /// Style from display config for the given granularity
    #[must_use]
    pub fn from_config(config: &DisplayConfig, granularity: Granularity) -> Self {
        Self {
            highlight_color: config.highlight_color.clone(),
            base_color: config.base_color.clone(),
            dimmed_opacity: config.dimmed_opacity,
            scroll_step: config.scroll_step_for(granularity),
        }
    }
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default(), Granularity::default())
    }
}

/// One drawable token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenView {
    /// Token index within its granularity
    pub index: usize,
    pub text: String,
    pub opacity: f32,
    /// Exact current token
    pub highlighted: bool,
    pub color: String,
}

/// One drawable line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineView {
    pub index: usize,
    pub tokens: Vec<TokenView>,
    /// Line holds the current token
    pub is_current: bool,
}

impl LineView {
    /// Plain text of the line
    #[must_use]
    pub fn text(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }
}

/// Complete view of the lyrics at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsView {
    pub lines: Vec<LineView>,
    /// Auto-scroll target, `None` until a token is current
    pub scroll_offset: Option<f64>,
    pub current_line: Option<usize>,
}

impl LyricsView {
    /// View for a missing document: nothing to draw
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the view for `current_index` over the tokens of `granularity`.
    ///
    /// Reached tokens (index at or before the current one) get full opacity;
    /// tokens not reached yet are dimmed. Only the current token is
    /// highlighted.
    #[must_use]
    pub fn build(
        document: &TimingDocument,
        granularity: Granularity,
        current_index: Option<usize>,
        style: &DisplayStyle,
    ) -> Self {
        let token_view = |index: usize, text: &str| {
            let reached = current_index.is_some_and(|current| index <= current);
            let highlighted = current_index == Some(index);
            TokenView {
                index,
                text: text.to_string(),
                opacity: if reached { 1.0 } else { style.dimmed_opacity },
                highlighted,
                color: if highlighted {
                    style.highlight_color.clone()
                } else {
                    style.base_color.clone()
                },
            }
        };

        let current_line = current_index.and_then(|index| document.line_of(granularity, index));

        let lines = document
            .lines()
            .iter()
            .map(|line| {
                let tokens = match granularity {
                    Granularity::Line => vec![token_view(line.index, &line.text)],
                    Granularity::Word => line
                        .words
                        .iter()
                        .map(|word| token_view(word.index, &word.text))
                        .collect(),
                };
                LineView {
                    index: line.index,
                    tokens,
                    is_current: current_line == Some(line.index),
                }
            })
            .collect();

        Self {
            lines,
            scroll_offset: current_index.map(|index| scroll_offset(index, style.scroll_step)),
            current_line,
        }
    }

    /// Line holding the current token
    #[must_use]
    pub fn current(&self) -> Option<&LineView> {
        self.current_line.and_then(|index| self.lines.get(index))
    }

    /// Lines from `before` lines above the current one to `after` lines below it.
    ///
    /// Without a current line the first `after + 1` lines are returned.
    #[must_use]
    pub fn window(&self, before: usize, after: usize) -> &[LineView] {
        let Some(current) = self.current_line else {
            let end = (after + 1).min(self.lines.len());
            return &self.lines[..end];
        };
        let start = current.saturating_sub(before);
        let end = (current + after + 1).min(self.lines.len());
        &self.lines[start.min(end)..end]
    }
}

/// Scroll target proportional to the token index
#[must_use]
pub fn scroll_offset(index: usize, step: f64) -> f64 {
    // Token counts stay far below 2^32
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    f64::from(index) * step
}
