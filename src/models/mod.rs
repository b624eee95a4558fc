pub mod part_number;
pub mod search;
pub mod vendor;

// Re-exports for convenience
pub use part_number::*;
pub use search::*;
pub use vendor::*;
