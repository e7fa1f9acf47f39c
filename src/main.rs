mod app;
mod cli;
mod config;
mod directory;
mod dnutil;
mod errors;
mod mail;
mod output;
mod remediate;
mod retry;
mod scan;
mod structured_output;
mod styled_output;

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();

    match App::run(&cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if cli.error_enabled() {
                eprintln!("Error: {e}");
            }
            std::process::exit(1);
        }
    }
}
