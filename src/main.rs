use clap::Parser;
use colored::Colorize;

use shorturl::cli::{Cli, Commands};
use shorturl::config::{DEFAULT_CONFIG_PATH, StaticConfig, get_config, init_config_from};
use shorturl::runtime::modes::run_server;
use shorturl::system::logging::init_logging;

#[actix_web::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    if let Some(Commands::GenConfig { output }) = &cli.command {
        let sample = StaticConfig::generate_sample_config();
        match output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, sample) {
                    eprintln!("{} Failed to write {}: {}", "[ERROR]".red().bold(), path, e);
                    std::process::exit(1);
                }
                println!("{} Sample config written to {}", "[OK]".green().bold(), path);
            }
            None => print!("{}", sample),
        }
        return;
    }

    init_config_from(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    let config = get_config();

    let _guard = match init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} Failed to initialize logging: {:#}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server().await {
        eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
        std::process::exit(1);
    }
}
