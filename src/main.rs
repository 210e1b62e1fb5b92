use clap::Parser;

use eco_transit::config::Config;
use eco_transit::server::start_server;
use eco_transit::store::{seed, Store};

fn to_io(e: rusqlite::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    log::info!("Opening database {}", config.database_url);
    let store = Store::open(&config.database_url).map_err(to_io)?;
    if config.seed {
        match seed::seed_demo(&mut store.lock()) {
            Ok(()) => log::info!("Loaded demo data"),
            Err(e) => log::warn!("Demo data not loaded: {}", e),
        }
    }

    start_server(store, &config).await
}
