//! Basic usage example

use envtag::{Duration, Unmarshal};

#[derive(Debug, Default, Unmarshal)]
struct Config {
    #[env("DATABASE_URL")]
    pub database_url: String,

    #[env("MAX_CONNECTIONS")]
    pub max_connections: u32,

    #[env("DEBUG")]
    pub debug: bool,

    #[env("REQUEST_TIMEOUT")]
    pub request_timeout: Duration,

    #[env("ALLOWED_ORIGINS")]
    pub allowed_origins: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Set environment variables (normally done outside the application)
    std::env::set_var("DATABASE_URL", "postgres://localhost/mydb");
    std::env::set_var("MAX_CONNECTIONS", "20");
    std::env::set_var("DEBUG", "t");
    std::env::set_var("REQUEST_TIMEOUT", "1m30s");
    std::env::set_var("ALLOWED_ORIGINS", "https://a.example, https://b.example");

    let config: Config = envtag::from_env()?;

    println!("Configuration loaded successfully:");
    println!("  Database URL: {}", config.database_url);
    println!("  Max Connections: {}", config.max_connections);
    println!("  Debug: {}", config.debug);
    println!("  Request Timeout: {}", config.request_timeout);
    println!("  Allowed Origins: {:?}", config.allowed_origins);

    Ok(())
}
