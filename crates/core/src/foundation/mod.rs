pub mod lifecycle;
pub mod traits;

pub use lifecycle::{LifecycleManager, LifecycleState};
pub use traits::{sort_by_order, ObjectRef, Ordered};
