mod cli;
mod client;
mod config;
mod correction;
mod dto;
mod engine;
mod error;
mod params;
mod pipeline;
mod server;
#[cfg(test)]
mod test_support;

use clap::Parser;
use cli::{Cli, Commands};
use log::error;

#[actix_web::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve(args) => server::run_server(args.into_config()).await,
        Commands::TranscribeFile(args) => client::run_client(args.into_config()).await,
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
