//! Report workflow.
//!
//! A report is created `Pending` and moves to `Completed` exactly once, when
//! a moderator handles it. The moderator's decision is dispatched to the
//! content services before the status is written, so a failed dispatch
//! leaves the report in the queue.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator, ObjectKind};
use agora_db::{
    entities::{
        notification::InboxAction,
        report::{self, FlaggedType, ReportReason, ReportStatus},
    },
    repositories::{ReportFilter, ReportStore},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::answer::AnswerService;
use super::comment::CommentService;
use super::config::ConfigService;
use super::inbox::InboxService;
use super::question::QuestionService;
use crate::context::RequestContext;

/// Largest moderation page.
pub const MAX_REPORT_PAGE: u64 = 100;

/// New report input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewReport {
    #[validate(length(min = 1))]
    pub object_id: String,
    pub report_type: ReportReason,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub content: String,
}

/// Page of the moderation queue.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub list: Vec<report::Model>,
    pub count: u64,
}

/// A selectable reason with its display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReasonOption {
    pub reason_type: String,
    pub name: String,
    pub description: String,
}

const QUESTION_REASONS: &[ReportReason] = &[
    ReportReason::Spam,
    ReportReason::RudeOrAbusive,
    ReportReason::Duplicate,
    ReportReason::NoLongerNeeded,
    ReportReason::Other,
];

const ANSWER_REASONS: &[ReportReason] = &[
    ReportReason::Spam,
    ReportReason::RudeOrAbusive,
    ReportReason::NotAnAnswer,
    ReportReason::Other,
];

const COMMENT_REASONS: &[ReportReason] = &[
    ReportReason::Spam,
    ReportReason::RudeOrAbusive,
    ReportReason::NoLongerNeeded,
    ReportReason::Other,
];

/// Reporting and report handling.
#[derive(Clone)]
pub struct ReportService {
    reports: Arc<dyn ReportStore>,
    questions: QuestionService,
    answers: AnswerService,
    comments: CommentService,
    inbox: InboxService,
    config: ConfigService,
    id_gen: IdGenerator,
}

impl ReportService {
    #[must_use]
    pub fn new(
        reports: Arc<dyn ReportStore>,
        questions: QuestionService,
        answers: AnswerService,
        comments: CommentService,
        inbox: InboxService,
        config: ConfigService,
    ) -> Self {
        Self {
            reports,
            questions,
            answers,
            comments,
            inbox,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    fn kind_of(object_id: &str) -> AppResult<ObjectKind> {
        match ObjectKind::from_object_id(object_id) {
            Some(kind @ (ObjectKind::Question | ObjectKind::Answer | ObjectKind::Comment)) => Ok(kind),
            _ => Err(AppError::BadRequest(format!(
                "object {object_id} cannot be reported"
            ))),
        }
    }

    async fn author_of(&self, kind: ObjectKind, object_id: &str) -> AppResult<String> {
        match kind {
            ObjectKind::Question => Ok(self.questions.find_live(object_id).await?.user_id),
            ObjectKind::Answer => Ok(self.answers.find_live(object_id).await?.user_id),
            ObjectKind::Comment => Ok(self.comments.find_live(object_id).await?.user_id),
            _ => Err(AppError::BadRequest(format!(
                "object {object_id} cannot be reported"
            ))),
        }
    }

    /// File a report against a question, answer or comment.
    pub async fn create_report(&self, ctx: &RequestContext, input: NewReport) -> AppResult<report::Model> {
        let reporter = ctx.require_user()?.to_string();
        let kind = Self::kind_of(&input.object_id)?;
        let reported_user_id = self.author_of(kind, &input.object_id).await?;
        if reported_user_id == reporter {
            return Err(AppError::BadRequest(
                "you cannot report your own content".to_string(),
            ));
        }

        let now = Utc::now().into();
        let report = self
            .reports
            .insert_report(report::Model {
                id: self.id_gen.generate_for(ObjectKind::Report),
                user_id: reporter,
                object_id: input.object_id,
                reported_user_id,
                object_type: kind.as_str().to_string(),
                report_type: input.report_type,
                content: input.content,
                flagged_type: None,
                flagged_content: None,
                status: ReportStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(report_id = %report.id, object_id = %report.object_id, "Report created");
        Ok(report)
    }

    /// One page of reports, newest first. `page` starts at 1.
    pub async fn list_reports(&self, filter: &ReportFilter, page: u64, page_size: u64) -> AppResult<ReportPage> {
        let page_size = page_size.clamp(1, MAX_REPORT_PAGE);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let (list, count) = self.reports.list_reports(filter, page_size, offset).await?;
        Ok(ReportPage { list, count })
    }

    /// Apply a moderator decision to a report.
    ///
    /// Handling a report that is no longer pending changes nothing.
    pub async fn handle_report(
        &self,
        report_id: &str,
        flagged_type: FlaggedType,
        flagged_content: Option<String>,
    ) -> AppResult<report::Model> {
        let Some(mut report) = self.reports.find_report(report_id).await? else {
            return Err(AppError::NotFound("report not found".to_string()));
        };
        if report.status != ReportStatus::Pending {
            info!(report_id = %report_id, "Report already handled");
            return Ok(report);
        }

        let kind = Self::kind_of(&report.object_id)?;
        self.dispatch(kind, &report.object_id, flagged_type, flagged_content.clone())
            .await?;

        report.flagged_type = Some(flagged_type);
        report.flagged_content = flagged_content;
        report.status = ReportStatus::Completed;
        report.updated_at = Utc::now().into();
        let report = self.reports.update_report(report).await?;
        info!(report_id = %report_id, ?flagged_type, "Report handled");
        Ok(report)
    }

    async fn dispatch(
        &self,
        kind: ObjectKind,
        object_id: &str,
        flagged_type: FlaggedType,
        flagged_content: Option<String>,
    ) -> AppResult<()> {
        match (kind, flagged_type) {
            (ObjectKind::Question, FlaggedType::NeedsDelete) => self.questions.remove(object_id).await,
            (ObjectKind::Question, FlaggedType::NeedsClose) => {
                match self.questions.close(object_id, flagged_content).await {
                    Err(AppError::NotFound(_)) if self.questions.is_deleted(object_id).await? => {
                        info!(question_id = %object_id, "Question already deleted, nothing to close");
                        Ok(())
                    }
                    outcome => outcome,
                }
            }
            (ObjectKind::Answer, FlaggedType::NeedsDelete) => self.answers.remove(object_id).await,
            (ObjectKind::Comment, FlaggedType::NeedsDelete | FlaggedType::NeedsClose) => {
                if let Some(comment) = self.comments.remove(object_id).await? {
                    // The removal already happened; a lost inbox row is not worth a retry.
                    if let Err(e) = self
                        .inbox
                        .notify(&comment.user_id, None, &comment.id, InboxAction::YourCommentWasDeleted)
                        .await
                    {
                        warn!(comment_id = %comment.id, error = %e, "Failed to notify comment author");
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Reasons a user may pick when reporting an object of `object_type`.
    pub async fn report_reasons(&self, object_type: ObjectKind) -> AppResult<Vec<ReasonOption>> {
        let reasons = match object_type {
            ObjectKind::Question => QUESTION_REASONS,
            ObjectKind::Answer => ANSWER_REASONS,
            ObjectKind::Comment => COMMENT_REASONS,
            _ => return Ok(Vec::new()),
        };
        let mut options = Vec::with_capacity(reasons.len());
        for reason in reasons {
            options.extend(self.option(reason.config_key()).await?);
        }
        Ok(options)
    }

    /// Decisions a moderator may take on an object of `object_type`.
    pub async fn flag_reasons(&self, object_type: ObjectKind) -> AppResult<Vec<ReasonOption>> {
        let flags: &[FlaggedType] = match object_type {
            ObjectKind::Question => &[
                FlaggedType::NeedsDelete,
                FlaggedType::NeedsClose,
                FlaggedType::NoAction,
            ],
            ObjectKind::Answer | ObjectKind::Comment => {
                &[FlaggedType::NeedsDelete, FlaggedType::NoAction]
            }
            _ => return Ok(Vec::new()),
        };
        let mut options = Vec::with_capacity(flags.len());
        for flag in flags {
            options.extend(self.option(flag.config_key()).await?);
        }
        Ok(options)
    }

    async fn option(&self, key: &str) -> AppResult<Option<ReasonOption>> {
        Ok(self.config.reason(key).await?.map(|info| ReasonOption {
            reason_type: key.trim_start_matches("reason.").to_string(),
            name: info.name,
            description: info.description,
        }))
    }
}
