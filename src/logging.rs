use anyhow::Context as _;

/// Installs the stderr subscriber. `RUST_LOG` overrides the default `info`
/// level, e.g. `RUST_LOG=bookharvest=debug` to see each enrichment attempt.
pub fn init() -> anyhow::Result<()> {
    let filter = match std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            tracing_subscriber::EnvFilter::try_new(directives).context("parse RUST_LOG")?
        }
        _ => tracing_subscriber::EnvFilter::try_new("info").context("build log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
