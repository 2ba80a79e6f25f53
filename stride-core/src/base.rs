//! Core functionalities.
mod agent;
mod env;
mod policy;
mod space;
mod step;
pub use agent::{ActOutput, Agent};
pub use env::{Env, SeedPolicy};
pub use policy::Policy;
pub use space::BoxSpace;
pub use step::{EpisodeInfo, Step};
