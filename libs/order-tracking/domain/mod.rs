//! Domain Layer
//!
//! Pure order data and derived values. No I/O.

pub mod projection;
pub mod snapshot;

pub use projection::Projection;
pub use snapshot::{
    OrderSnapshot, OrderStatus, PackageDetail, ProjectionInputs, DEFAULT_CLIENT_NAME,
    DEFAULT_TOTAL_PRICE,
};
