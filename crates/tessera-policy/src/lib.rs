//! tessera-policy: brings the state store in line with a blueprint.
//!
//! Each pass compiles the blueprint and reconciles three tables through a
//! [`View`](tessera_state::View):
//!
//! - **`connections`**: exact-key set sync of allowed flows
//! - **`placements`**: scheduling rules derived from the blueprint and
//!   from the connections just written (public ports)
//! - **`containers`**: content-based matching, keeping existing rows
//!   alive across label changes
//!
//! # Ordering
//!
//! ```text
//! update_policy(view, role, source)
//!   ├── compile            (abort on error, nothing written)
//!   ├── update_connections (every role)
//!   └── role == Master
//!       ├── update_placements  (reads the connections written above)
//!       └── update_containers
//! ```
//!
//! Workers only sync connections: their container table records what runs
//! locally and must not be overwritten with desired state.

pub mod connections;
pub mod containers;
pub mod engine;
pub mod error;
pub mod placements;

pub use connections::update_connections;
pub use containers::update_containers;
pub use engine::{TableStats, UpdateStats, apply_policy, update_policy};
pub use error::{PolicyError, PolicyResult};
pub use placements::update_placements;
