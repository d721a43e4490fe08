//! pycocotools mask API port.
//!
//! Ported from pycocotools/cocoapi common/maskApi.c
//! License: BSD 2-Clause (Piotr Dollar and Tsung-Yi Lin)

mod mask;

pub use mask::*;
