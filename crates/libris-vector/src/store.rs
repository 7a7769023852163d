use anyhow::{bail, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator};
use futures::future::{BoxFuture, FutureExt};
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use libris_core::config::resolve_with_base;
use libris_core::settings::DataSettings;
use libris_core::traits::VectorStore;
use libris_core::types::DocId;

use crate::schema::build_vector_schema;
use crate::table::{has_table, open_db};

/// Document vectors kept in one LanceDB table.
pub struct LanceVectorStore {
    conn: Connection,
    table: String,
}

impl LanceVectorStore {
    pub async fn open(uri: &str, table: &str) -> Result<Self> {
        Ok(Self { conn: open_db(uri).await?, table: table.to_string() })
    }

    /// Opens the configured table; a relative `lancedb_dir` is taken from `base`.
    pub async fn from_settings(data: &DataSettings, base: &Path) -> Result<Self> {
        let dir = resolve_with_base(base, &data.lancedb_dir);
        debug!(dir = %dir.display(), table = %data.vector_table, "opening vector store");
        Self::open(&dir.to_string_lossy(), &data.vector_table).await
    }

    /// Appends rows; creates the table with the rows' dimension on first write.
    pub async fn write(&self, rows: &[(DocId, Vec<f32>)]) -> Result<usize> {
        let Some((_, first)) = rows.first() else { return Ok(0) };
        let dim = first.len();
        if rows.iter().any(|(_, v)| v.len() != dim) {
            bail!("all vectors in one write must share a dimension ({dim})");
        }
        let schema = build_vector_schema(i32::try_from(dim)?);
        let ids = Int64Array::from(rows.iter().map(|(id, _)| *id).collect::<Vec<_>>());
        let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            rows.iter().map(|(_, v)| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
            i32::try_from(dim)?,
        );
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(ids), Arc::new(vectors)])?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        if has_table(&self.conn, &self.table).await? {
            self.conn.open_table(&self.table).execute().await?.add(reader).execute().await?;
        } else {
            self.conn.create_table(&self.table, reader).execute().await?;
        }
        info!(table = %self.table, rows = rows.len(), dim, "wrote vectors");
        Ok(rows.len())
    }

    async fn read_all(&self) -> Result<Vec<(DocId, Vec<f32>)>> {
        if !has_table(&self.conn, &self.table).await? { return Ok(Vec::new()); }
        let t = self.conn.open_table(&self.table).execute().await?;
        let mut stream = t.query().execute().await?;
        let mut out = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let (Some(id_col), Some(vec_col)) = (
                batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<Int64Array>()),
                batch.column_by_name("vector").and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>()),
            ) else {
                bail!("table '{}' lacks id/vector columns", self.table);
            };
            for i in 0..batch.num_rows() {
                if vec_col.is_null(i) { continue; }
                let list = vec_col.value(i);
                let vals = list.as_primitive::<Float32Type>().values().iter().copied().collect::<Vec<f32>>();
                out.push((id_col.value(i), vals));
            }
        }
        debug!(table = %self.table, rows = out.len(), "loaded vectors");
        Ok(out)
    }
}

impl VectorStore for LanceVectorStore {
    fn load_vectors(&self) -> BoxFuture<'_, Result<Vec<(DocId, Vec<f32>)>>> { self.read_all().boxed() }
}
