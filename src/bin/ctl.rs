use clap::{Parser, Subcommand};

use eco_transit::store::{seed, Store};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "eco_transit.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema if it does not exist yet
    Init,
    /// Insert the demo stations, vehicles, routes and users
    Seed,
    /// Print row counts and trips in progress
    Stats,
}

fn main() -> rusqlite::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!("Opening database at path: {}", args.database_url);
    let store = Store::open(&args.database_url)?;

    match args.command {
        Command::Init => println!("Schema ready"),
        Command::Seed => {
            println!("Seeding demo data");
            seed::seed_demo(&mut store.lock())?;
            store.stats()?.print_stats();
        }
        Command::Stats => store.stats()?.print_stats(),
    }
    Ok(())
}
