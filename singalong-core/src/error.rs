use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a timing document into a [`TimingDocument`](crate::TimingDocument).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not well-formed markup.
    #[error("Malformed markup at byte {position}: {source}")]
    Malformed {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// The input ended while elements were still open.
    #[error("Document ended before <{element}> was closed")]
    Truncated { element: String },

    /// No root element was found at all.
    #[error("Document has no <{expected}> root element")]
    MissingRoot { expected: &'static str },

    /// The root element has the wrong name.
    #[error("Expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A second top-level element follows the root.
    #[error("Unexpected element <{found}> after the root element")]
    MultipleRoots { found: String },

    /// The root contains no `param` elements.
    #[error("Root element contains no <{element}> elements")]
    MissingElement { element: &'static str },

    /// A `param` element has no timed items.
    #[error("Line {line} has no timed items")]
    EmptyLine { line: usize },

    /// A timed item has no start time attribute.
    #[error("Item {word} of line {line} is missing the \"{attribute}\" attribute")]
    MissingAttribute {
        line: usize,
        word: usize,
        attribute: &'static str,
    },

    /// A start time attribute is not a finite, non-negative number.
    #[error("Item {word} of line {line} has invalid start time {value:?}")]
    InvalidTime {
        line: usize,
        word: usize,
        value: String,
    },

    /// Start times go backwards in document order.
    #[error("Item {word} of line {line} starts at {start}s, before the previous item at {previous}s")]
    OutOfOrder {
        line: usize,
        word: usize,
        start: f64,
        previous: f64,
    },
}

/// Errors raised while retrieving a timing document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum CoreError {
    // Lyrics errors
    #[error("Failed to fetch lyrics: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to parse lyrics: {0}")]
    Parse(#[from] ParseError),

    #[error("Lyrics loading was cancelled")]
    Cancelled,

    // Player errors
    #[error("Player {player} failed to initialize: {reason}")]
    PlayerInit {
        player: &'static str,
        reason: String,
    },

    #[error("Player {player} has no track loaded")]
    PlayerNotReady { player: &'static str },

    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
