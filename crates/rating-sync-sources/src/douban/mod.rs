pub mod cookie;
pub mod interest;
pub mod search;
pub mod session;

pub use cookie::{CookieFile, StaticCookie};
pub use interest::DoubanClient;
pub use search::DoubanSearchResolver;
pub use session::DoubanSession;
