mod file;
mod http;

pub use file::FileDocumentSource;
pub use http::HttpDocumentSource;
