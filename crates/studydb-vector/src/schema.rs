//! Arrow layout of the chunk-embedding table produced by the indexing job.
//! Only `id` and `vector` are read at query time.
use arrow_schema::{Schema, Field, DataType};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COLUMN, DataType::Utf8, false),
		Field::new("program", DataType::Utf8, true),
		Field::new("section", DataType::Utf8, true),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Vector width of a table schema, if it has a usable `vector` column.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(item, dim) if item.data_type() == &DataType::Float32 => usize::try_from(*dim).ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vector_dim_reads_fixed_size_list() {
		assert_eq!(vector_dim(&build_arrow_schema(8)), Some(8));
		let no_vec = Schema::new(vec![Field::new(ID_COLUMN, DataType::Utf8, false)]);
		assert_eq!(vector_dim(&no_vec), None);
	}
}
