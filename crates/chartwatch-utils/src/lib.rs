//! Shared utilities for chartwatch

pub mod encode;
pub mod logging;

pub use encode::{EncodeError, encode_image_to_base64};
pub use logging::init_tracing;
