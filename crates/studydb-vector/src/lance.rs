use anyhow::{anyhow, ensure, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info};

use studydb_core::traits::{DenseIndex, Embedder};
use studydb_core::types::ChunkId;

use crate::schema::{vector_dim, DISTANCE_COLUMN, ID_COLUMN};
use crate::table::open_table;

/// Pre-built LanceDB table searched by cosine distance.
///
/// The table is opened on a tokio runtime whose handle is kept; `search`
/// blocks on that handle, so it must be called from a blocking thread
/// (`spawn_blocking`) or outside any runtime, never from an async task.
pub struct LanceDenseIndex { table: Table, embedder: Arc<dyn Embedder>, handle: Handle }

impl LanceDenseIndex {
	pub async fn open(db_dir: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
		let table = open_table(db_dir, table_name).await?;
		let schema = table.schema().await?;
		let dim = vector_dim(&schema).ok_or_else(|| anyhow!("table '{table_name}' has no Float32 vector column"))?;
		ensure!(dim == embedder.dim(), "table vectors have {dim} dims but the embedder produces {}", embedder.dim());
		let rows = table.count_rows(None).await?;
		info!(table = table_name, rows, dim, "opened vector table");
		Ok(Self { table, embedder, handle: Handle::current() })
	}

	async fn nearest(&self, vector: Vec<f32>, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		let mut stream = self.table
			.vector_search(vector)?
			.distance_type(DistanceType::Cosine)
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::with_capacity(k);
		while let Some(batch) = stream.try_next().await? { read_hits(&batch, &mut hits)?; }
		Ok(hits)
	}
}

fn read_hits(batch: &RecordBatch, out: &mut Vec<(ChunkId, f32)>) -> Result<()> {
	let ids = batch
		.column_by_name(ID_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("'{ID_COLUMN}' column missing from search results"))?;
	let distances = batch
		.column_by_name(DISTANCE_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("'{DISTANCE_COLUMN}' column missing from search results"))?;
	for i in 0..batch.num_rows() {
		if ids.is_null(i) { continue; }
		out.push((ids.value(i).to_string(), distances.value(i)));
	}
	Ok(())
}

impl DenseIndex for LanceDenseIndex {
	fn search(&self, query: &str, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		if k == 0 { return Ok(Vec::new()); }
		let vector = self.embedder
			.embed_batch(&[query.to_string()])?
			.pop()
			.ok_or_else(|| anyhow!("embedder returned no vector"))?;
		let hits = self.handle.block_on(self.nearest(vector, k))?;
		debug!(hits = hits.len(), "lance vector search");
		Ok(hits)
	}
}
