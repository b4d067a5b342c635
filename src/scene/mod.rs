//! Scene model: surfaces, cameras, meshes and ray picking

pub mod camera;
pub mod graph;
pub mod mesh;
pub mod picking;
pub mod surface;

pub use camera::{OrbitControls, PerspectiveCamera};
pub use graph::{Lighting, Scene};
pub use mesh::{MeshData, SceneVertex};
pub use picking::{ndc_from_pixels, pick, pick_nearest, Hit, Ray};
pub use surface::{Material, Shape, Side, Surface, SurfaceId, Transform};
