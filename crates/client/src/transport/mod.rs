//! Transport layer for the BugRelay client.

pub mod http;

pub use http::HttpTransport;
