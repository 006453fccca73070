use std::{fs::OpenOptions, sync::Mutex};

use anyhow::Context;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use user_management::{
    app,
    config::{AppConfig, LogConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log)?;

    let app_state = AppState::init(&config).await?;
    let router = app::build_app(app_state);

    app::serve(router, &config).await
}

fn init_tracing(log: &LogConfig) -> anyhow::Result<()> {
    // Explicit sink: stdout, or an append-only file when LOG_FILE is set.
    let writer = match &log.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(log.filter.clone())
        .with_writer(writer);

    if log.json {
        builder.with_target(false).json().init();
    } else {
        builder.with_ansi(log.file.is_none()).init();
    }
    Ok(())
}
