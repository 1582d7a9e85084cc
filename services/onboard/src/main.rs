use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use onboard::config::OnboardConfig;
use onboard::infra::db::DbOtpChallengeRepository;
use onboard::infra::whatsapp::WhatsAppChannel;
use onboard::infra::zoho::ZohoCrmApi;
use onboard::router::build_router;
use onboard::state::{AppState, RateLimits};
use onboard::usecase::crm_sync::{CrmClient, CrmTokenCache};
use onboard::usecase::sweep::SweepExpiredChallengesUseCase;
use onboard_core::config::Config;
use onboard_core::tracing::init_tracing;
use onboard_migration::Migrator;

#[tokio::main]
async fn main() {
    init_tracing("onboard=info,tower_http=info");

    let config = OnboardConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let whatsapp = WhatsAppChannel::new(config.whatsapp()).expect("failed to build WhatsApp client");
    if whatsapp.verify_config().await {
        info!("whatsapp configuration verified");
    } else {
        warn!("whatsapp configuration could not be verified; OTP delivery may fail");
    }

    let zoho = ZohoCrmApi::new(config.zoho()).expect("failed to build Zoho client");
    let crm = CrmClient::new(zoho, Arc::new(CrmTokenCache::new()));

    let sweeper = SweepExpiredChallengesUseCase {
        challenges: DbOtpChallengeRepository { db: db.clone() },
    };
    tokio::spawn(sweeper.run(Duration::from_secs(config.otp_sweep_interval_secs.max(1))));

    let state = AppState {
        db,
        redis,
        jwt_secret: config.jwt_secret.clone(),
        jwt_expiry_secs: config.jwt_expiry_secs,
        otp: config.otp_settings(),
        default_country_code: config.default_country_code.clone(),
        rate_limits: RateLimits {
            window_secs: config.rate_limit_window_secs,
            max_requests: config.rate_limit_max_requests,
            max_verify_attempts: config.rate_limit_max_verify_attempts,
            max_general: config.rate_limit_max_general,
        },
        whatsapp,
        crm,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.onboard_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("onboard service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
