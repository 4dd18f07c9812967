//! Static export of the documentation browser.
//!
//! A [`Crawler`] walks the documentation from a start page, fetching pages
//! through a [`Backend`], and writes them to a directory with links
//! rewritten so the result can be browsed without a server.

pub mod backend;
pub mod crawler;
pub mod errors;
pub mod links;

pub use backend::{Backend, Fetched, PublisherBackend, WebserverBackend};
pub use crawler::{Crawler, ExportOptions, ExportReport};
pub use errors::{ExportError, Result};
