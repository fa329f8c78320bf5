// src/schema/arrow.rs

use arrow::datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema};
use std::sync::Arc;

use super::types::ValueKind;

/// Map a declared value kind into an Arrow DataType.
///
/// - text    → Utf8
/// - integer → Int64
pub fn map_to_arrow_type(kind: ValueKind) -> DataType {
    match kind {
        ValueKind::Text => DataType::Utf8,
        ValueKind::Integer => DataType::Int64,
    }
}

/// Build an ArrowSchema (inside an Arc) pairing staged column names with
/// the kinds declared at the same positions.
///
/// Callers check that both sides have the same width; extra entries on
/// either side are ignored by the zip.
pub fn build_arrow_schema<'a>(
    names: impl IntoIterator<Item = &'a str>,
    kinds: impl IntoIterator<Item = ValueKind>,
) -> Arc<ArrowSchema> {
    let fields: Vec<ArrowField> = names
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| ArrowField::new(name, map_to_arrow_type(kind), /* nullable = */ false))
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fields_positionally() {
        let schema = build_arrow_schema(
            ["Crime Type", "Loss Amount"],
            [ValueKind::Text, ValueKind::Integer],
        );
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(0).name(), "Crime Type");
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Int64);
        assert!(!schema.field(1).is_nullable());
    }
}
