use clap::Parser;

/// Server settings. Every flag falls back to the environment variable of the same name.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "DATABASE_URL", default_value = "eco_transit.db")]
    pub database_url: String,

    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Origin of the web frontend allowed by CORS
    #[arg(long, env = "CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Load the demo stations, vehicles and routes into an empty database
    #[arg(long)]
    pub seed: bool,
}
