use serde::{Deserialize, Serialize};

/// Collection state written to the catalog site for a subject
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    /// Want to watch
    Wish,
    /// Currently watching
    Doing,
    /// Watched
    Collect,
}

impl InterestStatus {
    /// Wire value of the `interest` form field
    pub fn as_form_value(&self) -> &'static str {
        match self {
            InterestStatus::Wish => "wish",
            InterestStatus::Doing => "do",
            InterestStatus::Collect => "collect",
        }
    }
}

/// One status mutation for a resolved catalog subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestUpdate {
    pub subject_id: String,
    pub status: InterestStatus,
    pub private: bool,
    /// 1-5 stars; anything outside that range is sent as "no rating"
    pub rating: Option<u8>,
}

impl InterestUpdate {
    pub fn watched(subject_id: impl Into<String>, rating: u8, private: bool) -> Self {
        Self {
            subject_id: subject_id.into(),
            status: InterestStatus::Collect,
            private,
            rating: Some(rating),
        }
    }

    /// Rating as it should appear in the form, if it is a valid star count
    pub fn form_rating(&self) -> Option<u8> {
        self.rating.filter(|r| (1..=5).contains(r))
    }
}
