//! URL handling module for Reach-Probe
//!
//! This module turns raw input cells into things the prober can dial:
//! domain normalization, candidate URL generation, redirect resolution and
//! proxy descriptor parsing.

mod candidates;
mod normalize;
mod proxy;

// Re-export main functions
pub use candidates::build_candidate_urls;
pub use normalize::{normalize_domain, resolve_location};
pub use proxy::parse_proxy;
