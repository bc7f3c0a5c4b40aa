use clap::Parser;
use site_monitor::{
    api::ApiConfig,
    config::{Config, read_config_file},
    engine::MonitorEngine,
};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults apply when omitted
    #[arg(short, long)]
    file: Option<String>,

    /// Log level for the monitor (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn init(level: LevelFilter) {
    let filter = filter::Targets::new().with_targets(vec![
        ("site_monitor", level),
        ("tower_http", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.log_level);
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)?,
        None => {
            debug!("no config file given, using defaults");
            Config::default()
        }
    };

    let engine = MonitorEngine::with_http_prober(config.monitor_settings())?;

    for url in &config.targets {
        if !engine.registry().add(url.clone()).await {
            warn!("duplicate target in config: {url}");
        }
    }

    let scheduler = engine.spawn_scheduler();

    serve(&config, engine).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    scheduler.shutdown().await;

    Ok(())
}

#[cfg(feature = "api")]
async fn serve(config: &Config, engine: MonitorEngine) -> anyhow::Result<()> {
    use site_monitor::api::{ApiState, spawn_api_server};

    let api_config = ApiConfig::from_section(config.api.as_ref());
    let addr = spawn_api_server(api_config, ApiState::new(engine)).await?;
    info!("dashboard available at http://{addr}/");

    Ok(())
}

#[cfg(not(feature = "api"))]
async fn serve(config: &Config, _engine: MonitorEngine) -> anyhow::Result<()> {
    let api_config = ApiConfig::from_section(config.api.as_ref());
    warn!(
        "built without the api feature, not serving on {}",
        api_config.bind_addr
    );
    Ok(())
}
