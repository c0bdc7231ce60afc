pub mod park;
pub mod ride;

// Re-export commonly used types at the model level.
pub use park::Park;
pub use ride::{Area, RawLand, RawPayload, RawRide, Ride, ShapeError};
