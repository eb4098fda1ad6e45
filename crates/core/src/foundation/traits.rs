use std::any::Any;
use std::sync::Arc;

/// Shared handle to a managed object instance
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// Components that take part in an ordered chain, lowest order first
pub trait Ordered {
    fn order(&self) -> i32;
}

/// Sort a slice of ordered items ascending, keeping the relative position of ties
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
}

impl<T: Ordered + ?Sized> Ordered for Arc<T> {
    fn order(&self) -> i32 {
        (**self).order()
    }
}

impl<T: Ordered + ?Sized> Ordered for Box<T> {
    fn order(&self) -> i32 {
        (**self).order()
    }
}
