use crate::Result;

/// Initialize logging for the bot process.
///
/// Tracing is feature-gated; without it this is a no-op, so callers can wire
/// it up unconditionally.
pub fn init(service_name: &str) -> Result<()> {
    let _ = service_name;

    #[cfg(feature = "tracing")]
    {
        use tracing_subscriber::{fmt, EnvFilter};

        // `RUST_LOG` wins; otherwise info for our crates.
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "info,bookbot=info,bookbot_core=info,{service_name}=info"
            ))
        });

        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(true)
            .init();
    }

    Ok(())
}
