use log::error;
use timetable_solver::config::ServerConfig;
use timetable_solver::server;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = server::run_server(config).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
