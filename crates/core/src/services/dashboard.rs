//! Admin dashboard.

use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppResult, SharedCache, config::DashboardConfig};
use agora_db::{
    entities::report::ReportStatus,
    repositories::{AnswerStore, CommentStore, QuestionStore, ReportStore, UserStore},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::activity::ActivityService;
use super::site_info::SiteInfoService;
use super::site_sections::{SiteGeneral, SiteInterface};

const STATISTICAL_KEY: &str = "dashboard:statistical";

/// Stores the dashboard counts come from.
#[derive(Clone)]
pub struct DashboardSources {
    pub questions: Arc<dyn QuestionStore>,
    pub answers: Arc<dyn AnswerStore>,
    pub comments: Arc<dyn CommentStore>,
    pub users: Arc<dyn UserStore>,
    pub reports: Arc<dyn ReportStore>,
}

/// Cached count block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub question_count: u64,
    pub answer_count: u64,
    pub comment_count: u64,
    pub user_count: u64,
    /// Pending reports.
    pub report_count: u64,
    pub vote_count: u64,
}

/// Dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardInfo {
    #[serde(flatten)]
    pub counts: DashboardCounts,
    pub smtp: bool,
    pub https: bool,
    pub time_zone: String,
    pub version: String,
    pub remote_version: String,
    /// Seconds since the process started.
    pub app_start_time: i64,
}

#[derive(Deserialize)]
struct ReleaseInfo {
    release: Release,
}

#[derive(Deserialize)]
struct Release {
    version: String,
}

/// Builds the dashboard.
#[derive(Clone)]
pub struct DashboardService {
    sources: DashboardSources,
    activity: ActivityService,
    site_info: SiteInfoService,
    cache: SharedCache,
    cache_ttl: Duration,
    smtp_configured: bool,
    config: DashboardConfig,
    http_client: reqwest::Client,
    started_at: DateTime<Utc>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        sources: DashboardSources,
        activity: ActivityService,
        site_info: SiteInfoService,
        cache: SharedCache,
        cache_ttl: Duration,
        smtp_configured: bool,
        config: DashboardConfig,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sources,
            activity,
            site_info,
            cache,
            cache_ttl,
            smtp_configured,
            config,
            http_client: reqwest::Client::new(),
            started_at,
        }
    }

    /// Dashboard numbers and environment facts.
    pub async fn statistical(&self) -> AppResult<DashboardInfo> {
        let counts = self.counts().await;
        let general: SiteGeneral = self.site_info.get_section().await?;
        let interface: SiteInterface = self.site_info.get_section().await?;

        Ok(DashboardInfo {
            counts,
            smtp: self.smtp_configured,
            https: url::Url::parse(&general.site_url).is_ok_and(|u| u.scheme() == "https"),
            time_zone: interface.time_zone,
            version: env!("CARGO_PKG_VERSION").to_string(),
            remote_version: self.remote_version().await,
            app_start_time: (Utc::now() - self.started_at).num_seconds(),
        })
    }

    async fn counts(&self) -> DashboardCounts {
        match self.cache.get_string(STATISTICAL_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(counts) => return counts,
                Err(e) => warn!(error = %e, "Cached dashboard counts unreadable"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Dashboard cache read failed"),
        }

        let s = &self.sources;
        let (questions, answers, comments, users, reports, votes) = futures::join!(
            s.questions.count_questions(),
            s.answers.count_answers(),
            s.comments.count_comments(),
            s.users.count_users(),
            s.reports.count_reports(ReportStatus::Pending),
            self.activity.vote_count(),
        );
        let counts = DashboardCounts {
            question_count: or_zero("question", questions),
            answer_count: or_zero("answer", answers),
            comment_count: or_zero("comment", comments),
            user_count: or_zero("user", users),
            report_count: or_zero("report", reports),
            vote_count: or_zero("vote", votes),
        };

        match serde_json::to_string(&counts) {
            Ok(raw) => {
                if let Err(e) = self.cache.set_string(STATISTICAL_KEY, &raw, self.cache_ttl).await {
                    warn!(error = %e, "Failed to cache dashboard counts");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode dashboard counts"),
        }
        counts
    }

    /// Latest released version, empty when the check fails.
    async fn remote_version(&self) -> String {
        let response = self
            .http_client
            .get(&self.config.version_check_url)
            .header(
                reqwest::header::USER_AGENT,
                concat!("Answer/", env!("CARGO_PKG_VERSION")),
            )
            .timeout(Duration::from_secs(self.config.version_check_timeout_secs))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Version check failed");
                return String::new();
            }
        };
        match response.json::<ReleaseInfo>().await {
            Ok(info) => info.release.version,
            Err(e) => {
                debug!(error = %e, "Version check returned an unexpected body");
                String::new()
            }
        }
    }
}

fn or_zero(what: &str, count: AppResult<u64>) -> u64 {
    count.unwrap_or_else(|e| {
        warn!(count = what, error = %e, "Dashboard count failed");
        0
    })
}
