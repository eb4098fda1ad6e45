pub mod catalog;
pub mod export;
pub mod kinds;
pub mod object_loader;

pub use catalog::{ObjectCatalog, ObjectUnit};
pub use export::{
    unit_path, ObjectClassExport, ObjectConstructor, ObjectInitializer, ObjectLoadingConfig,
    ObjectSupplier,
};
pub use object_loader::{CatalogObjectLoader, ModuleObjectLoader, ObjectLoader};
