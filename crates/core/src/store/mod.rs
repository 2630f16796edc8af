pub mod query;
pub mod traits;

// Store implementations
pub mod firestore;
pub mod memory;
