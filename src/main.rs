use std::{future::IntoFuture, process, sync::Arc};

use florista::{
    application::{
        admin::AdminCatalogService,
        auth::AuthService,
        catalog::CatalogService,
        error::AppError,
        quote::QuoteService,
        repos::{CatalogRepo, CatalogWriteRepo, ProfilesRepo, SessionsRepo},
    },
    cache::{CacheClient, CacheConfig, CacheTrigger, DisabledKvStore, KvStore, MemoryKvStore},
    config::{self, CacheBackendKind},
    infra::{
        cache::RestKvStore,
        db::{LoggedCatalogRepo, PostgresRepositories},
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use florista_api_types::InvalidateCacheResponse;
use tokio::{signal, sync::Notify};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Invalidate(args) => run_invalidate(settings, args).await,
        config::Command::IssueSession(args) => run_issue_session(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let cache = build_cache_client(&settings)?;
    cache.initialize().await;

    let catalog_repo: Arc<dyn CatalogRepo> = Arc::new(LoggedCatalogRepo::new(repositories.clone()));
    let catalog_write_repo: Arc<dyn CatalogWriteRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let profiles_repo: Arc<dyn ProfilesRepo> = repositories.clone();

    let catalog = CatalogService::new(catalog_repo, cache.clone());
    let trigger = CacheTrigger::new(cache);
    let state = ApiState {
        quote: QuoteService::new(catalog.clone()),
        catalog,
        admin: AdminCatalogService::new(catalog_write_repo, trigger.clone()),
        auth: AuthService::new(sessions_repo, profiles_repo, settings.auth.session_ttl),
        cache: trigger,
        db: Some(repositories),
    };

    serve_http(&settings, state).await
}

async fn run_invalidate(
    settings: config::Settings,
    args: config::InvalidateArgs,
) -> Result<(), AppError> {
    if args.keys.is_empty() && args.patterns.is_empty() {
        return Err(AppError::validation(
            "invalidate requires at least one --key or --pattern",
        ));
    }
    if settings.cache.backend == CacheBackendKind::Memory {
        warn!("The memory cache backend is local to each process; nothing to invalidate here");
    }

    let cache = build_cache_client(&settings)?;
    if !cache.initialize().await {
        return Err(AppError::unexpected("cache backend is unreachable"));
    }

    let results = CacheTrigger::new(cache)
        .invalidate_requested(
            (!args.keys.is_empty()).then_some(args.keys.as_slice()),
            &args.patterns,
        )
        .await;
    let response = InvalidateCacheResponse {
        success: true,
        results,
    };
    let rendered = serde_json::to_string_pretty(&response)
        .map_err(|err| AppError::unexpected(format!("failed to render results: {err}")))?;
    println!("{rendered}");

    Ok(())
}

async fn run_issue_session(
    settings: config::Settings,
    args: config::IssueSessionArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();
    let profiles_repo: Arc<dyn ProfilesRepo> = repositories;

    let auth = AuthService::new(sessions_repo, profiles_repo, settings.auth.session_ttl);
    let issued = auth.issue_session(args.user_id).await?;

    info!(
        user_id = %args.user_id,
        session_id = %issued.record.id,
        fingerprint = %AuthService::fingerprint(&issued.record),
        expires_at = %issued.record.expires_at,
        "Issued session"
    );
    println!("{}", issued.token);

    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_cache_client(settings: &config::Settings) -> Result<Arc<CacheClient>, AppError> {
    let cache_settings = &settings.cache;
    let store: Arc<dyn KvStore> = match (cache_settings.backend, cache_settings.rest.as_ref()) {
        (CacheBackendKind::Rest, Some(rest)) => Arc::new(
            RestKvStore::new(
                rest.url.clone(),
                rest.token.clone(),
                cache_settings.request_timeout,
            )
            .map_err(InfraError::from)?,
        ),
        (CacheBackendKind::Rest, None) => {
            return Err(InfraError::configuration("cache.rest_url is not configured").into());
        }
        (CacheBackendKind::Memory, _) => Arc::new(MemoryKvStore::new()),
        (CacheBackendKind::Disabled, _) => Arc::new(DisabledKvStore),
    };

    info!(
        backend = cache_settings.backend.as_str(),
        "Cache backend configured"
    );
    Ok(Arc::new(CacheClient::new(
        store,
        CacheConfig::from(cache_settings),
    )))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Listening");

    let shutdown = Arc::new(Notify::new());
    let notify = shutdown.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        () = shutdown.notified() => {}
    }

    let graceful = settings.server.graceful_shutdown;
    info!(
        timeout_secs = graceful.as_secs(),
        "Shutdown requested; draining connections"
    );
    match tokio::time::timeout(graceful, &mut server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!("Graceful shutdown timed out; dropping remaining connections");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
