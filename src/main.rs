mod server;

use log::error;
use weekly_planner::SolveOptions;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let addr = std::env::var("PLANNER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    if let Err(e) = server::run_server(&addr, SolveOptions::default()).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
