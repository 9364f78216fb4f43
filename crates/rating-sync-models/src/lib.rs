pub mod media;
pub mod media_ids;
pub mod rating;
pub mod status;
pub mod sync_state;

pub use media::MediaType;
pub use media_ids::ItemIds;
pub use rating::{to_five_star, RatingItem};
pub use status::{InterestStatus, InterestUpdate};
pub use sync_state::{PendingReason, PendingRetry, SyncRecord, SyncState};
