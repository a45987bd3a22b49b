//! Shared scaffolding for the example binaries: tracing setup and a small
//! synthetic terrain to sample candidate points from.
use glam::Vec3;
use tracing_subscriber::EnvFilter;

/// Initializes a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// A procedural height field over a square domain. Stands in for real
/// height-terrain data so the examples stay self-contained.
pub struct DemoTerrain {
    pub extent: f32,
}

impl DemoTerrain {
    pub fn new(extent: f32) -> Self {
        Self { extent }
    }

    /// Height of the rolling-hills field at (x, z).
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let fx = x / self.extent * std::f32::consts::TAU;
        let fz = z / self.extent * std::f32::consts::TAU;
        8.0 * (fx * 1.3).sin() * (fz * 0.9).cos() + 2.0 * (fx * 4.1).cos()
    }

    /// Surface normal estimated by central differences.
    pub fn normal(&self, x: f32, z: f32) -> Vec3 {
        let eps = 0.1;
        let dx = (self.height(x + eps, z) - self.height(x - eps, z)) / (2.0 * eps);
        let dz = (self.height(x, z + eps) - self.height(x, z - eps)) / (2.0 * eps);
        Vec3::new(-dx, 1.0, -dz).normalize()
    }

    /// Candidate position on the surface at (x, z).
    pub fn candidate(&self, x: f32, z: f32) -> Vec3 {
        Vec3::new(x, self.height(x, z), z)
    }
}
