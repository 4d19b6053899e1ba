mod catalog;
mod config;
mod context;
mod decision;
mod delivery;
mod evaluators;
mod generator;
mod pipeline;
mod providers;
mod server;
mod state;
mod sweep;
mod traits;
mod types;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::decision::DecisionEngine;
use crate::delivery::{ApnsChannel, TwilioChannel};
use crate::generator::MessageGenerator;
use crate::pipeline::DeliveryPipeline;
use crate::providers::OpenAiCompatibleBackend;
use crate::server::AppState;
use crate::state::SqliteHistoryStore;
use crate::sweep::TriggerEngine;
use crate::traits::{CompletionBackend, HistoryStore, PushChannel, SmsChannel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("nudged {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("nudged {}", env!("CARGO_PKG_VERSION"));
                println!("Proactive notification daemon.\n");
                println!("Usage: nudged [OPTIONS]\n");
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: config.toml)");
                println!("  -h, --help           Print help");
                println!("  -V, --version        Print version");
                return Ok(());
            }
            _ => {}
        }
    }

    let config_path = args
        .iter()
        .position(|a| a == "--config" || a == "-c")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = if config_path.exists() {
        AppConfig::load(&config_path)?
    } else {
        info!(path = %config_path.display(), "no config file, using defaults");
        AppConfig::default()
    };

    let store: Arc<dyn HistoryStore> =
        Arc::new(SqliteHistoryStore::new(&config.state.db_path).await?);
    info!(db = %config.state.db_path, "history store ready");

    let backend: Option<Arc<dyn CompletionBackend>> = match &config.provider {
        Some(provider) => {
            info!(model = %provider.model, "message backend configured");
            Some(Arc::new(OpenAiCompatibleBackend::new(provider)?))
        }
        None => {
            info!("no message backend configured, using canned text");
            None
        }
    };

    let push: Option<Arc<dyn PushChannel>> = config
        .apns
        .as_ref()
        .map(|apns| Arc::new(ApnsChannel::new(apns)) as Arc<dyn PushChannel>);
    let sms: Option<Arc<dyn SmsChannel>> = config.twilio.as_ref().map(|twilio| {
        Arc::new(TwilioChannel::new(twilio, &config.persona.assistant_name))
            as Arc<dyn SmsChannel>
    });
    if push.is_none() && sms.is_none() {
        info!("no delivery channel configured, fires will be logged only");
    }

    let decision = DecisionEngine::new(store.clone(), config.quiet_hours);
    let generator = MessageGenerator::new(backend, config.persona.clone());
    let pipeline =
        DeliveryPipeline::new(store.clone(), push, sms, &config.persona.assistant_name);

    let engine = Arc::new(TriggerEngine::new(
        store, decision, generator, pipeline, None,
    ));

    let app_state = AppState {
        engine,
        cron_secret: config.server.cron_secret.clone(),
        test_secret: config.server.test_secret.clone(),
    };

    server::serve(app_state, &config.server.bind, config.server.port).await
}
