//! API state and middleware.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppError, Config, SharedCache};
use agora_core::{
    ActivityService, AnswerService, CommentService, ConfigService, DashboardService,
    DashboardSources, EmailService, ExternalNotificationService, InboxService, JobSender,
    JobWorkerContext, NewQuestionLimiter, PrivilegeResolver, QuestionService, ReportService,
    SharedMailer, SiteInfoService, Stores, SubscriptionService, Translator, UserService,
    Validator, VoteService,
};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub activity_service: ActivityService,
    pub question_service: QuestionService,
    pub answer_service: AnswerService,
    pub comment_service: CommentService,
    pub vote_service: VoteService,
    pub report_service: ReportService,
    pub inbox_service: InboxService,
    pub notification_service: ExternalNotificationService,
    pub subscription_service: SubscriptionService,
    pub site_info_service: SiteInfoService,
    pub dashboard_service: DashboardService,
    pub validator: Validator,
    pub translator: Arc<Translator>,
}

impl AppState {
    /// Wire every service from the storage handles.
    ///
    /// Jobs produced by request handlers go to `jobs`; the consumer side is
    /// started separately with [`AppState::worker_context`].
    #[must_use]
    pub fn build(
        stores: &Stores,
        cache: SharedCache,
        mailer: SharedMailer,
        jobs: JobSender,
        config: &Config,
    ) -> Self {
        let translator = Arc::new(Translator::new());
        let validator = Validator::new(translator.clone());

        let config_service = ConfigService::new(stores.configs.clone());
        let site_info_service = SiteInfoService::new(
            stores.site_info.clone(),
            cache.clone(),
            config.cache.site_info_ttl(),
            validator.clone(),
        );
        let privileges = PrivilegeResolver::new(site_info_service.clone());
        let activity_service = ActivityService::new(
            stores.activities.clone(),
            stores.users.clone(),
            config_service.clone(),
        );

        let question_service = QuestionService::new(
            stores.questions.clone(),
            stores.tags.clone(),
            activity_service.clone(),
            jobs.clone(),
            privileges.clone(),
            site_info_service.clone(),
            translator.clone(),
        );
        let answer_service = AnswerService::new(
            stores.answers.clone(),
            stores.questions.clone(),
            activity_service.clone(),
            jobs.clone(),
            privileges.clone(),
        );
        let comment_service = CommentService::new(
            stores.comments.clone(),
            stores.questions.clone(),
            stores.answers.clone(),
            activity_service.clone(),
            jobs,
            privileges,
        );
        let vote_service = VoteService::new(
            activity_service.clone(),
            stores.questions.clone(),
            stores.answers.clone(),
        );
        let inbox_service = InboxService::new(stores.inbox.clone());
        let report_service = ReportService::new(
            stores.reports.clone(),
            question_service.clone(),
            answer_service.clone(),
            comment_service.clone(),
            inbox_service.clone(),
            config_service,
        );

        let email_service = EmailService::new(
            site_info_service.clone(),
            cache.clone(),
            translator.clone(),
            config.server.url.clone(),
            config.email.from_name.clone(),
            Duration::from_secs(config.notification.unsubscribe_ttl_secs),
        );
        let limiter = NewQuestionLimiter::new(
            cache.clone(),
            config.notification.new_question_limit,
            Duration::from_secs(config.notification.new_question_window_secs),
        );
        let notification_service = ExternalNotificationService::new(
            stores.notification_configs.clone(),
            stores.follows.clone(),
            stores.users.clone(),
            email_service.clone(),
            mailer,
            limiter,
        );
        let subscription_service =
            SubscriptionService::new(stores.notification_configs.clone(), email_service);

        let dashboard_service = DashboardService::new(
            DashboardSources {
                questions: stores.questions.clone(),
                answers: stores.answers.clone(),
                comments: stores.comments.clone(),
                users: stores.users.clone(),
                reports: stores.reports.clone(),
            },
            activity_service.clone(),
            site_info_service.clone(),
            cache,
            config.cache.dashboard_ttl(),
            config.email.is_configured(),
            config.dashboard.clone(),
            Utc::now(),
        );

        Self {
            user_service: UserService::new(stores.users.clone()),
            activity_service,
            question_service,
            answer_service,
            comment_service,
            vote_service,
            report_service,
            inbox_service,
            notification_service,
            subscription_service,
            site_info_service,
            dashboard_service,
            validator,
            translator,
        }
    }

    /// Services the job workers run against.
    #[must_use]
    pub fn worker_context(&self) -> JobWorkerContext {
        JobWorkerContext {
            activity: self.activity_service.clone(),
            inbox: self.inbox_service.clone(),
            notifications: self.notification_service.clone(),
        }
    }
}

/// Token from the `Authorization` header or query parameter.
fn bearer_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let strip = |raw: &str| {
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        (!token.is_empty()).then(|| token.to_string())
    };

    if let Some(value) = headers.get(AUTHORIZATION)
        && let Ok(raw) = value.to_str()
    {
        return strip(raw);
    }

    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "Authorization")
        .and_then(|(_, value)| strip(&value.replace("%20", " ").replace('+', " ")))
}

/// Authentication middleware.
///
/// Unknown tokens continue anonymously; restricted accounts are rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers(), req.uri().query()) {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                debug!(user_id = %user.id, "Authenticated request");
                req.extensions_mut().insert(user);
            }
            Err(AppError::Unauthorized) => {}
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
