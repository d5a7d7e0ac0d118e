pub mod error;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use storage::ArticleStorage;
pub use types::{Article, DigestEntry, RawArticle, SelectionCommit, UpsertStatus, UNKNOWN_AUTHOR};

pub mod prelude {
    pub use crate::{Article, ArticleStorage, Error, Result};
}
