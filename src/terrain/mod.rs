//! Terrain chunks: grid coordinates, mesh construction, trees, and the
//! procedural fallback generator

pub mod coord;
pub mod mesh;
pub mod generator;
pub mod tree;
pub mod chunk;

pub use coord::ChunkCoord;
pub use mesh::{MeshData, build_grid_mesh, simplify_mesh};
pub use generator::{TerrainGenerator, TerrainParams, TerrainStyle};
pub use tree::{Tree, TreeParams, spawn_trees, tree_seed};
pub use chunk::Chunk;
