pub mod models;
pub mod verifier;

pub use verifier::DeepfakeVerifier;
