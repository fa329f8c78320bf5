pub mod arrow;
pub mod registry;
pub mod types;

pub use arrow::{build_arrow_schema, map_to_arrow_type};
pub use registry::SchemaRegistry;
pub use types::{ColumnSpec, TableSchema, ValueKind};
