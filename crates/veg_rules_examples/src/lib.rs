#![forbid(unsafe_code)]

mod terrain;

pub use terrain::{init_tracing, DemoTerrain};
