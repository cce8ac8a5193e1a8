//! Per-target descriptor data, selected at build time

#[cfg(feature = "esp32s2")]
mod esp32s2;
#[cfg(feature = "esp32s2")]
pub use esp32s2::*;

#[cfg(not(feature = "esp32s2"))]
compile_error!("memprot-core: enable exactly one target feature (esp32s2)");
