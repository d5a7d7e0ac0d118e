pub mod cli;
pub mod logging;
pub mod manager;
pub mod pipeline;
pub mod sources;

pub use cli::{handle_command, IngestArgs, IngestCommands};
pub use manager::{IngestManager, IngestReport};
pub use sources::ArticleSource;

pub mod prelude {
    pub use super::sources::{ArticleSource, HttpFeedSource, JsonFeedSource};
    pub use super::IngestManager;
    pub use sn_core::{Article, Error, RawArticle, Result};
}
