use anyhow::Context;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use unidashd::{config, db, ipc};

fn init_tracing(cfg: &config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("unidashd={}", cfg.level).into());

    // stdout carries the protocol; logs go to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    if cfg.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn bootstrap_schema(state: &ipc::AppState) {
    let res = state
        .executor
        .connect()
        .map_err(anyhow::Error::from)
        .and_then(|conn| db::ensure_schema(&conn));
    match res {
        Ok(()) => tracing::info!("schema ready"),
        Err(e) => tracing::error!(error = %e, "schema bootstrap failed"),
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = config::AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.database,
        "starting unidashd"
    );

    let state = ipc::AppState::new(config.database.clone());
    if config.schema.bootstrap {
        bootstrap_schema(&state);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request");
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        tracing::debug!(id = %req.id, method = %req.method, "request");
        let resp = ipc::handle_request(&state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}
