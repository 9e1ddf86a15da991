//! Business logic services.

#![allow(missing_docs)]

pub mod activity;
pub mod answer;
pub mod comment;
pub mod config;
pub mod dashboard;
pub mod email;
pub mod inbox;
pub mod jobs;
pub mod mail;
pub mod moderation;
pub mod notification;
pub mod permission;
pub mod question;
pub mod site_info;
pub mod site_sections;
pub mod subscription;
pub mod user;
pub mod vote;

pub use activity::{ActivityRecord, ActivityService, MAX_LEADERBOARD_LIMIT, RankEntry};
pub use answer::{AnswerService, NewAnswer};
pub use comment::{CommentService, NewComment};
pub use config::{ActivityKey, ConfigService, ReasonInfo};
pub use dashboard::{DashboardCounts, DashboardInfo, DashboardService, DashboardSources};
pub use email::{EmailService, MailTemplate, RenderedMail, UnsubscribeCode};
pub use inbox::{InboxService, MAX_INBOX_PAGE};
pub use jobs::{Job, JobSender, JobService, JobWorkerContext};
pub use mail::{MailDelivery, NoOpMailer, OutgoingMail, SharedMailer, SmtpMailer};
pub use moderation::{MAX_REPORT_PAGE, NewReport, ReasonOption, ReportPage, ReportService};
pub use notification::{
    DispatchSummary, ExternalNotificationService, NewQuestionLimiter, NotificationEvent,
};
pub use permission::{
    ActionInput, Capabilities, ObjectAction, PermissionAction, PrivilegeResolver, QuestionState,
};
pub use question::{NewQuestion, QuestionDetail, QuestionOperation, QuestionService};
pub use site_info::{SiteInfoResponse, SiteInfoService};
pub use site_sections::{
    PrivilegeThresholds, SiteBranding, SiteCustomCssHtml, SiteGeneral, SiteInterface, SiteLegal,
    SiteLogin, SitePrivileges, SiteSection, SiteSeo, SiteTheme, SiteUsers, SiteWrite,
};
pub use subscription::{SourceSetting, SubscriptionService};
pub use user::UserService;
pub use vote::{VoteDirection, VoteResult, VoteService};
