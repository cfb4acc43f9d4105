use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();
    info!(
        "Starting game hall on {} (max {} clients, negotiation timeout {}s)",
        config.bind_addr(),
        config.max_clients,
        config.negotiation_timeout_secs
    );

    let mut server = Server::new(config).await?;
    server.run().await
}
