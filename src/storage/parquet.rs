use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use arrow::array::{Int64Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, Utc};
use parquet::arrow::ArrowWriter;
use tracing::info;
use crate::error::Result;
use crate::models::{Order, OrderChannel, OrderStatus};
use crate::storage::minio::ObjectStore;

/// Columnar export of delivered sales for the accountant.
pub struct SalesLedger;

impl SalesLedger {
    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("customer_name", DataType::Utf8, false),
            Field::new("phone", DataType::Utf8, false),
            Field::new("order_details", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("channel", DataType::Utf8, false),
            Field::new("quantity", DataType::UInt32, false),
            Field::new("unit_price", DataType::Int64, false),
            Field::new("total_amount", DataType::Int64, false),
            Field::new("created_at", DataType::Int64, false),
            Field::new("delivered_at", DataType::Int64, true),
        ]))
    }

    /// Delivered orders only; pending reservations are not sales yet.
    pub fn to_record_batch(orders: &[Order]) -> Result<RecordBatch> {
        let sales: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .collect();

        let ids: StringArray = sales.iter().map(|o| Some(o.id.as_str())).collect();
        let names: StringArray = sales.iter().map(|o| Some(o.customer_name.as_str())).collect();
        let phones: StringArray = sales.iter().map(|o| Some(o.phone.as_str())).collect();
        let details: StringArray = sales.iter().map(|o| Some(o.order_details.as_str())).collect();
        let categories: StringArray = sales.iter().map(|o| Some(o.category.as_str())).collect();
        let channels: StringArray = sales
            .iter()
            .map(|o| {
                Some(match o.channel {
                    OrderChannel::Online => "online",
                    OrderChannel::WalkIn => "walk-in",
                })
            })
            .collect();
        let quantities: UInt32Array = sales.iter().map(|o| Some(o.quantity)).collect();
        let unit_prices: Int64Array = sales.iter().map(|o| Some(o.unit_price)).collect();
        let totals: Int64Array = sales.iter().map(|o| Some(o.total_amount)).collect();
        let created: Int64Array = sales.iter().map(|o| Some(o.created_at.timestamp())).collect();
        let delivered: Int64Array = sales
            .iter()
            .map(|o| o.delivered_at.map(|t| t.timestamp()))
            .collect();

        let batch = RecordBatch::try_new(
            Self::schema(),
            vec![
                Arc::new(ids),
                Arc::new(names),
                Arc::new(phones),
                Arc::new(details),
                Arc::new(categories),
                Arc::new(channels),
                Arc::new(quantities),
                Arc::new(unit_prices),
                Arc::new(totals),
                Arc::new(created),
                Arc::new(delivered),
            ],
        )?;

        Ok(batch)
    }

    pub fn write(orders: &[Order], output_path: &Path) -> Result<usize> {
        let batch = Self::to_record_batch(orders)?;
        let file = File::create(output_path)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(batch.num_rows())
    }

    /// `sales/year=YYYY/month=MM/day=DD/orders_{unix}.parquet`
    pub fn object_key(now: DateTime<Utc>) -> String {
        format!(
            "sales/year={}/month={:02}/day={:02}/orders_{}.parquet",
            now.year(),
            now.month(),
            now.day(),
            now.timestamp()
        )
    }

    /// Writes the ledger to a temp file and uploads it; returns the object key.
    pub async fn export(orders: &[Order], store: &dyn ObjectStore, now: DateTime<Utc>) -> Result<String> {
        let temp_parquet = tempfile::NamedTempFile::new()?;
        let rows = Self::write(orders, temp_parquet.path())?;
        let body = tokio::fs::read(temp_parquet.path()).await?;

        let key = Self::object_key(now);
        store.put(&key, body, "application/x-parquet").await?;

        info!(rows, key = %key, "Exported sales ledger");
        Ok(key)
    }
}
