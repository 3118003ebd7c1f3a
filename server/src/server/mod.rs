mod server;
pub use server::ReplicaServer;

mod server_config;
pub use server_config::ServerConfig;
