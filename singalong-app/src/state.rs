use singalong_core::{format_duration, DisplayStyle, Granularity, LyricsView, TimingDocument};
use std::sync::Arc;
use std::time::Duration;

/// What the lyrics area currently shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LyricsStatus {
    #[default]
    Loading,
    Ready,
    Unavailable,
}

/// Console karaoke state, updated from sync events and rendered to a status line.
#[derive(Clone, Debug)]
pub struct KaraokeState {
    granularity: Granularity,
    style: DisplayStyle,
    document: Option<Arc<TimingDocument>>,
    status: LyricsStatus,
    current_index: Option<usize>,
    position: Duration,
    duration: Duration,
    is_playing: bool,
}

impl KaraokeState {
    #[must_use]
    pub fn new(granularity: Granularity, style: DisplayStyle) -> Self {
        Self {
            granularity,
            style,
            document: None,
            status: LyricsStatus::default(),
            current_index: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            is_playing: false,
        }
    }

    pub fn set_lyrics(&mut self, document: Arc<TimingDocument>) {
        self.document = Some(document);
        self.status = LyricsStatus::Ready;
    }

    pub fn clear_lyrics(&mut self) {
        self.document = None;
        self.current_index = None;
        self.status = LyricsStatus::Unavailable;
    }

    pub fn set_current_index(&mut self, index: Option<usize>) {
        self.current_index = index;
    }

    pub fn sync_position(&mut self, position: Duration) {
        self.position = position;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Presentation model for the current moment
    #[must_use]
    pub fn view(&self) -> LyricsView {
        self.document.as_ref().map_or_else(LyricsView::empty, |document| {
            LyricsView::build(document, self.granularity, self.current_index, &self.style)
        })
    }

    /// `elapsed / total` clock
    #[must_use]
    pub fn clock(&self) -> String {
        format!(
            "{} / {}",
            format_duration(self.position),
            format_duration(self.duration)
        )
    }

    /// Current line with the highlighted token in brackets
    #[must_use]
    pub fn current_line_text(&self) -> String {
        match &self.status {
            LyricsStatus::Loading => return "(loading lyrics)".to_string(),
            LyricsStatus::Unavailable => return "(no lyrics available)".to_string(),
            LyricsStatus::Ready => {}
        }

        let view = self.view();
        let Some(line) = view.current() else {
            return String::new();
        };
        line.tokens
            .iter()
            .map(|token| {
                if token.highlighted {
                    format!("[{}]", token.text)
                } else {
                    token.text.clone()
                }
            })
            .collect()
    }

    /// Full status line: play marker, clock and current lyrics
    #[must_use]
    pub fn render(&self) -> String {
        let marker = if self.is_playing { '>' } else { '|' };
        format!("{marker} {}  {}", self.clock(), self.current_line_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Arc<TimingDocument> {
        Arc::new(
            TimingDocument::parse(
                r#"<data>
                    <param><i va="0">hello </i><i va="1">world</i></param>
                    <param><i va="2">bye</i></param>
                </data>"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_render_loading() {
        let state = KaraokeState::new(Granularity::Word, DisplayStyle::default());
        assert_eq!(state.render(), "| 0:00 / 0:00  (loading lyrics)");
    }

    #[test]
    fn test_render_word_highlight() {
        let mut state = KaraokeState::new(Granularity::Word, DisplayStyle::default());
        state.set_lyrics(document());
        state.set_current_index(Some(1));
        state.sync_position(Duration::from_millis(1200));
        state.set_duration(Duration::from_secs(75));
        state.set_playing(true);

        assert_eq!(state.render(), "> 0:01 / 1:15  hello [world]");
    }

    #[test]
    fn test_render_line_highlight() {
        let mut state = KaraokeState::new(Granularity::Line, DisplayStyle::default());
        state.set_lyrics(document());
        state.set_current_index(Some(1));
        assert_eq!(state.current_line_text(), "[bye]");
    }

    #[test]
    fn test_clear_lyrics() {
        let mut state = KaraokeState::new(Granularity::Word, DisplayStyle::default());
        state.set_lyrics(document());
        state.set_current_index(Some(0));
        state.clear_lyrics();

        assert_eq!(state.current_line_text(), "(no lyrics available)");
        assert!(state.view().lines.is_empty());
    }
}
