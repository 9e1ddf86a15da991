//! The set of storage handles services are built from.

#![allow(missing_docs)]

use std::sync::Arc;

use agora_db::repositories::{
    ActivityStore, AnswerStore, CommentStore, ConfigStore, FollowStore, InboxStore,
    NotificationConfigStore, QuestionStore, ReportStore, SiteInfoStore, TagStore, UserStore,
};

/// One handle per store trait.
#[derive(Clone)]
pub struct Stores {
    pub activities: Arc<dyn ActivityStore>,
    pub users: Arc<dyn UserStore>,
    pub configs: Arc<dyn ConfigStore>,
    pub questions: Arc<dyn QuestionStore>,
    pub answers: Arc<dyn AnswerStore>,
    pub comments: Arc<dyn CommentStore>,
    pub tags: Arc<dyn TagStore>,
    pub follows: Arc<dyn FollowStore>,
    pub reports: Arc<dyn ReportStore>,
    pub site_info: Arc<dyn SiteInfoStore>,
    pub notification_configs: Arc<dyn NotificationConfigStore>,
    pub inbox: Arc<dyn InboxStore>,
}

impl Stores {
    /// Every handle backed by the same in-memory store.
    #[cfg(any(test, feature = "test-utils"))]
    #[must_use]
    pub fn memory(store: &Arc<crate::testing::MemoryStore>) -> Self {
        Self {
            activities: store.clone(),
            users: store.clone(),
            configs: store.clone(),
            questions: store.clone(),
            answers: store.clone(),
            comments: store.clone(),
            tags: store.clone(),
            follows: store.clone(),
            reports: store.clone(),
            site_info: store.clone(),
            notification_configs: store.clone(),
            inbox: store.clone(),
        }
    }
}
