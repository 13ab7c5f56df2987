//! Types that populate themselves

use envtag::{EnvMarshaler, EnvReader, EnvUnmarshaler, MapEnv, Unmarshal};

/// Reads `URL` as `host:port` instead of one key per field.
#[derive(Debug, Default, Unmarshal)]
#[env(custom)]
struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl EnvUnmarshaler for Endpoint {
    fn unmarshal_env(&mut self, reader: &dyn EnvReader) -> anyhow::Result<()> {
        let url = reader
            .lookup_env("URL")
            .ok_or_else(|| anyhow::anyhow!("URL is not set"))?;
        let (host, port) = url
            .rsplit_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected host:port, got '{url}'"))?;

        self.host = host.to_string();
        self.port = envtag::parse(port)?;
        Ok(())
    }
}

#[derive(Debug, Default, Unmarshal)]
struct Config {
    // The custom unmarshaler sees keys relative to this prefix
    #[env("UPSTREAM_")]
    pub upstream: Endpoint,

    #[env("METRICS_")]
    pub metrics: Endpoint,
}

fn main() -> anyhow::Result<()> {
    let env = MapEnv::from([
        ("UPSTREAM_URL", "api.internal:8443"),
        ("METRICS_URL", "localhost:9090"),
    ]);

    let config: Config = EnvMarshaler::new(env).load()?;

    println!("Upstream: {}:{}", config.upstream.host, config.upstream.port);
    println!("Metrics: {}:{}", config.metrics.host, config.metrics.port);

    Ok(())
}
