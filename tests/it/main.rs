//! Single test binary entry point.
//!
//! All integration tests compile into one binary to keep link times down.
//!
//! Structure:
//! - helpers: builders, fake gesture link, sample constructors
//! - unit: single-component tests through the public API
//! - integration: multi-component workflows end-to-end
