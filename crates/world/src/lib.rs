mod chunk;
mod face;
mod grid;
mod import;
mod noise;
pub mod palette;
mod raycast;
mod storage;
mod terrain;

pub use crate::noise::{NoiseConfig, NoiseGenerator};
pub use chunk::*;
pub use face::*;
pub use grid::*;
pub use import::*;
pub use raycast::*;
pub use storage::*;
pub use terrain::*;
