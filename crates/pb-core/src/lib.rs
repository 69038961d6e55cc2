pub mod id;
pub mod invariants;
pub mod model;
pub mod mutate;
pub mod query;
pub mod remap;

pub use id::{ComponentId, generate_page_id};
pub use invariants::{InvariantViolation, check_invariants};
pub use model::*;
pub use mutate::{COPY_SUFFIX, DEFAULT_DUPLICATE_OFFSET};
pub use query::TraversalOptions;
pub use remap::IdMap;

// Re-export kurbo geometry so downstream crates share one version.
pub use kurbo::{Point, Rect};
