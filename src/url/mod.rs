//! URL canonicalization for item identity

mod normalize;

pub use normalize::normalize_url;
