//! Database entities.

pub mod activity;
pub mod answer;
pub mod comment;
pub mod config;
pub mod follow;
pub mod notification;
pub mod question;
pub mod report;
pub mod site_info;
pub mod tag;
pub mod tag_rel;
pub mod user;
pub mod user_notification_config;

pub use activity::Entity as Activity;
pub use answer::Entity as Answer;
pub use comment::Entity as Comment;
pub use config::Entity as Config;
pub use follow::Entity as Follow;
pub use notification::Entity as Notification;
pub use question::Entity as Question;
pub use report::Entity as Report;
pub use site_info::Entity as SiteInfo;
pub use tag::Entity as Tag;
pub use tag_rel::Entity as TagRel;
pub use user::Entity as User;
pub use user_notification_config::Entity as UserNotificationConfig;
