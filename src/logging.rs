//! Log output setup.

use crate::error::{DataRepoError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a formatted stderr subscriber filtered by `directive`
/// (`info`, `udr=debug,warn`, ...). `RUST_LOG` takes precedence when set.
///
/// Installing twice is not an error; the first subscriber stays.
pub fn init(directive: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive)
            .map_err(|e| DataRepoError::Config(format!("invalid log level {:?}: {}", directive, e)))?,
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
    Ok(())
}
