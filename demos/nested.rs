//! Nested structs and key prefixes

use envtag::{EnvMarshaler, MapEnv, Unmarshal};

#[derive(Debug, Default, Unmarshal)]
struct Database {
    #[env("HOST")]
    pub host: String,

    #[env("PORT")]
    pub port: u16,
}

#[derive(Debug, Default, Unmarshal)]
struct Config {
    // Keys become PRIMARY_DB_HOST and PRIMARY_DB_PORT
    #[env("PRIMARY_DB_")]
    pub primary: Database,

    #[env("REPLICA_DB_")]
    pub replica: Box<Database>,

    #[env("WORKERS")]
    pub workers: u8,
}

fn main() -> anyhow::Result<()> {
    let env = MapEnv::from([
        ("APP_PRIMARY_DB_HOST", "db-1.internal"),
        ("APP_PRIMARY_DB_PORT", "5432"),
        ("APP_REPLICA_DB_HOST", "db-2.internal"),
        ("APP_WORKERS", "300"),
    ]);
    let marshaler = EnvMarshaler::new(env).with_prefix("APP_");

    println!("Missing keys: {:?}", marshaler.missing_keys::<Config>());

    match marshaler.load::<Config>() {
        Ok(config) => println!("Loaded: {config:?}"),
        Err(e) => println!("Failed at '{}': {e}", e.field_path()),
    }

    Ok(())
}
