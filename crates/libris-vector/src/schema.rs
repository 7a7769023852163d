use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// `id: Int64, vector: FixedSizeList<Float32>[dim]`. A table keeps the
/// dimension it was created with.
pub fn build_vector_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Int64, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
