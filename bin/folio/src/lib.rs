//! Folio CLI Library
//!
//! Functionality behind the `folio` binary, exposed as a library so the
//! command implementations can be tested and reused.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build)
//!
//! # Example
//!
//! ```no_run
//! use folio::cmd::build::{self, BuildOverrides};
//!
//! build::run(None, &BuildOverrides::default()).unwrap();
//! ```

pub mod cmd;

pub use folio_core::{BuildConfig, Config};
pub use folio_generator::{BuildStats, Builder};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
