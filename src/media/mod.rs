//! Metadata extraction and derived-image generation.
//!
//! Split in three:
//! - [`backend`] — the [`MediaBackend`](backend::MediaBackend) trait the
//!   pipeline core is written against, plus the test mock.
//! - [`magick`] — the production ImageMagick implementation.
//! - [`fields`] — the pure mapping from raw probe fields to a catalog
//!   record (keyword splitting, rational parsing, rating synthesis,
//!   capture-time handling).

pub mod backend;
pub mod fields;
pub mod magick;

pub use backend::{BackendError, MediaBackend, RawProbe};
pub use magick::MagickBackend;
