//! Watch-face asset codec.
//!
//! Turns a caller-supplied image into bytes the watch can display: resize to
//! the screen, convert to native RGB565, and compress into a `WFC1` container
//! under a byte budget by stepping the encoder quality down until the output
//! fits.
//!
//! Image decoding and resizing sit behind [`ImageOps`] and compression behind
//! [`LossyEncoder`]; the defaults use the `image` crate and the built-in
//! run-length encoder.

mod codec;
mod config;
mod container;
mod error;
mod pixels;
mod raster;

pub use codec::*;
pub use config::*;
pub use container::*;
pub use error::*;
pub use pixels::*;
pub use raster::*;
