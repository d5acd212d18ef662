use std::io;

use actix_web::{web, App, HttpServer};

use ballot_ledger::api::{self, AppState};
use ballot_ledger::config::NodeConfig;
use ballot_ledger::keys::Wallet;

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = NodeConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let validator = Wallet::load_or_generate(&config.key_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let state = web::Data::new(AppState::new(&config, validator));

    log::info!(
        "validator node listening on {}:{} (quorum {}, max vote age {}s)",
        config.host,
        config.port,
        config.ledger.quorum,
        config.ledger.max_vote_age.as_secs()
    );

    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
