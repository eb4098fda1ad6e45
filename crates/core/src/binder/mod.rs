pub mod bindable;
#[allow(clippy::module_inception)]
pub mod binder;
pub mod conversion;

pub use bindable::{BindResult, Bindable, ObjectType};
pub use binder::{BindContext, BindHandler, ObjectConfigPropertyBinder};
pub use conversion::{
    GenericConversionService, ObjectConversionService, ObjectConverter, ObjectConverters,
};
