#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Cached geometric and topological queries over polygon meshes.
//!
//! A [`MeshProvider`] supplies raw mesh data; [`MeshQueryEngine`] derives and
//! memoizes triangle geometry, sparse connectivity, UV-space point location,
//! closest-point projection and breadth-first vertex rings on top of it.
//! [`MeshSnapshot`] is the in-memory provider, and [`io::read_obj`] builds one
//! from a Wavefront OBJ file.
//!
//! ```ignore
//! let mesh = mesh_query_engine::io::read_obj("body.obj")?;
//! let mut engine = MeshQueryEngine::new(mesh);
//! let hit = engine.get_closest_at_uv(0.5, 0.5, None)?;
//! let rings = engine.march_vert_array(&[0])?;
//! ```

pub mod engine;
pub mod error;
pub mod geom;
pub mod io;
pub mod provider;
pub mod selection;
pub mod snapshot;

pub use engine::{MeshQueryEngine, QueryOptions};
pub use error::{MeshQueryError, MeshResult};
pub use provider::{ClosestPointAccelerator, FaceTriangles, MeshProvider, Space};
pub use selection::{ComponentKind, SelectMode, SelectionError, SelectionSink};
pub use snapshot::MeshSnapshot;

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Installs an `env_logger` writing to stderr at debug level unless
        /// `RUST_LOG` says otherwise. Calling it twice is harmless.
        pub fn init_logger() {
            let _ = env_logger::Builder::from_env(
                env_logger::Env::default().default_filter_or("debug"),
            )
            .target(env_logger::Target::Stderr)
            .try_init();
        }
    } else {
        pub fn init_logger() {
            // no-op fallback when debug logs are disabled
        }
    }
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            ::log::debug!("{}", format!($($t)*));
        }
    }};
}
