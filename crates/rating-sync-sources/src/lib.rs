pub mod douban;
pub mod error;
pub mod http;
pub mod tmdb;
pub mod trakt;
pub mod traits;

pub use douban::{CookieFile, DoubanClient, DoubanSearchResolver, DoubanSession, StaticCookie};
pub use error::SourceError;
pub use tmdb::TmdbClient;
pub use trakt::TraktClient;
pub use traits::{CatalogMatch, CatalogResolver, CookieProvider, RatingSource, StatusWriter, TitleQuery};
