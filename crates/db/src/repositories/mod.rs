//! Repositories for database access.
//!
//! Every repository implements a `*Store` trait. Services depend on the
//! traits so they can run against the database or an in-memory store.

mod activity;
mod answer;
mod comment;
mod config;
mod follow;
mod notification;
mod notification_config;
mod question;
mod report;
mod site_info;
mod tag;
mod user;

pub use activity::{ActivityLookup, ActivityRepository, ActivityStore, UserAmount};
pub use answer::{AnswerRepository, AnswerStore};
pub use comment::{CommentRepository, CommentStore};
pub use config::{ConfigRepository, ConfigStore};
pub use follow::{FollowRepository, FollowStore};
pub use notification::{InboxStore, NotificationRepository};
pub use notification_config::{NotificationConfigRepository, NotificationConfigStore};
pub use question::{QuestionRepository, QuestionStore};
pub use report::{ReportFilter, ReportRepository, ReportStore};
pub use site_info::{SiteInfoRepository, SiteInfoStore};
pub use tag::{TagRepository, TagStore};
pub use user::{UserRepository, UserStore};
