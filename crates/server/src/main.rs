//! Agora server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use agora_api::{API_PREFIX, AppState, auth_middleware, router as api_router};
use agora_common::{
    Config, MemoryCache, RedisCache, SharedCache,
    config::{CacheBackend, MailDeliveryMode},
};
use agora_core::{JobService, NoOpMailer, SharedMailer, SmtpMailer, Stores};
use agora_db::repositories::{
    ActivityRepository, AnswerRepository, CommentRepository, ConfigRepository, FollowRepository,
    NotificationConfigRepository, NotificationRepository, QuestionRepository, ReportRepository,
    SiteInfoRepository, TagRepository, UserRepository,
};
use agora_queue::{MailJob, MailWorkerContext, RedisMailQueue, mail_worker};
use apalis::layers::retry::RetryPolicy;
use apalis::prelude::*;
use axum::{Router, middleware};
use fred::prelude::*;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Attempts per queued mail before apalis gives up.
const MAIL_RETRIES: usize = 5;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agora=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn stores(db: &Arc<DatabaseConnection>) -> Stores {
    Stores {
        activities: Arc::new(ActivityRepository::new(Arc::clone(db))),
        users: Arc::new(UserRepository::new(Arc::clone(db))),
        configs: Arc::new(ConfigRepository::new(Arc::clone(db))),
        questions: Arc::new(QuestionRepository::new(Arc::clone(db))),
        answers: Arc::new(AnswerRepository::new(Arc::clone(db))),
        comments: Arc::new(CommentRepository::new(Arc::clone(db))),
        tags: Arc::new(TagRepository::new(Arc::clone(db))),
        follows: Arc::new(FollowRepository::new(Arc::clone(db))),
        reports: Arc::new(ReportRepository::new(Arc::clone(db))),
        site_info: Arc::new(SiteInfoRepository::new(Arc::clone(db))),
        notification_configs: Arc::new(NotificationConfigRepository::new(Arc::clone(db))),
        inbox: Arc::new(NotificationRepository::new(Arc::clone(db))),
    }
}

async fn cache(config: &Config) -> Result<SharedCache, Box<dyn std::error::Error>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            warn!("Using in-process cache; counters are not shared between nodes");
            Ok(Arc::new(MemoryCache::new()))
        }
        CacheBackend::Redis => {
            let fred_config = fred::types::config::Config::from_url(&config.redis.url)?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client.wait_for_connect().await?;
            info!("Connected to Redis cache");
            Ok(Arc::new(RedisCache::new(
                Arc::new(client),
                config.redis.prefix.clone(),
            )))
        }
    }
}

/// Pick the mail transport; with Redis delivery, also start the mail worker.
async fn mailer(config: &Config) -> Result<SharedMailer, Box<dyn std::error::Error>> {
    let smtp: SharedMailer = match SmtpMailer::from_config(&config.email)? {
        Some(smtp) => Arc::new(smtp),
        None => {
            warn!("SMTP is not configured; notification mails are dropped");
            Arc::new(NoOpMailer)
        }
    };

    if config.email.delivery == MailDeliveryMode::Inline {
        return Ok(smtp);
    }

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let storage = apalis_redis::RedisStorage::<MailJob>::new(redis_conn);
    info!("Connected to Redis mail queue");

    let worker_ctx = MailWorkerContext::new(smtp);
    let worker_storage = storage.clone();
    tokio::spawn(async move {
        let monitor = Monitor::new().register({
            WorkerBuilder::new("mail")
                .retry(RetryPolicy::retries(MAIL_RETRIES))
                .data(worker_ctx)
                .backend(worker_storage)
                .build_fn(mail_worker)
        });

        if let Err(e) = monitor.run().await {
            error!(error = %e, "Mail worker failed");
        }
    });
    info!("Mail worker started");

    Ok(Arc::new(RedisMailQueue::new(storage)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config);

    info!("Starting agora server...");

    let db = Arc::new(agora_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    agora_db::migrate(&db).await?;
    info!("Migrations completed");

    let cache = cache(&config).await?;
    let mailer = mailer(&config).await?;

    let jobs = JobService::new(config.queue.capacity);
    let state = AppState::build(&stores(&db), cache, mailer, jobs.sender(), &config);
    jobs.start(state.worker_context(), config.queue.workers)?;

    let app = Router::new()
        .nest(API_PREFIX, api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
