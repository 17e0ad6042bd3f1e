use std::sync::atomic::AtomicBool;

use tracing::Level;

static IS_INIT: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber once, and only when `KNIT_LOG` is set.
///
/// `KNIT_LOG` takes an `EnvFilter` directive, e.g. `KNIT_LOG=knit_core=trace`.
pub fn enable_tracing_on_demand() {
  use tracing_subscriber::{fmt, prelude::*, EnvFilter};
  let Ok(directives) = std::env::var("KNIT_LOG") else {
    return;
  };
  if !IS_INIT.swap(true, std::sync::atomic::Ordering::SeqCst) {
    // Another subscriber may already be installed by the embedder.
    let _ = tracing_subscriber::registry()
      .with(fmt::layer().with_target(true))
      .with(EnvFilter::new(directives))
      .with(
        tracing_subscriber::filter::Targets::new()
          .with_targets(vec![("knit_core", Level::TRACE), ("knit_common", Level::TRACE)]),
      )
      .try_init();
  }
}
