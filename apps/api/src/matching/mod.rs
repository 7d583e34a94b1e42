// Peer matching: pure scoring engine plus the endpoints that feed it the
// stored profile collection.

pub mod engine;
pub mod handlers;
