use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use image_board::{
    graceful_shutdown::stop_on_signal,
    repositories::provider::connect_provider,
    routes::configure_routes,
    settings::AppConfig,
    telemetry::init_tracing,
    AppState,
};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match AppConfig::new() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);
    tracing::info!("Loaded configuration: {:?}", config);

    let provider = match connect_provider(&config).await {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Storage initialisation failed: {:#}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::new(&config, provider));

    let server_addr = format!("{}:{}", config.host, config.port);
    let cors_origins = config.cors_origins();

    tracing::info!(
        "🚀 Starting {} v{} on {} ({} backend)",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.repository_backend
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes(cors_origins.clone()))
    })
    .workers(config.worker_count)
    .shutdown_timeout(30)
    .disable_signals()
    .bind(server_addr)?
    .run();

    tokio::spawn(stop_on_signal(server.handle()));

    server.await
}
