//! Internal modules ported from external libraries.
//!
//! These modules contain code adapted from:
//! - scipy: Linear sum assignment
//! - pycocotools: Run-length encoded mask codec

pub mod scipy;
pub mod pycocotools;
