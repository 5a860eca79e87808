//! Parquet writers for the result table and for mock input tables.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, Float64Array, Int64Builder, ListBuilder, StringArray, StringBuilder, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::error::Result;
use crate::types::{Course, Recommendation, User};

/// Write the ranked result as `(user_id, course_id, score, rank)` columns.
pub fn write_recommendations(path: &Path, rows: &[Recommendation]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, false),
        Field::new("course_id", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
        Field::new("rank", DataType::UInt32, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.user_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.course_id.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.score))),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.rank))),
        ],
    )?;
    write_batch(path, schema, batch)
}

/// Write a users table with list-typed tag and course-id columns.
pub fn write_users(path: &Path, users: &[User]) -> Result<()> {
    let mut tags = ListBuilder::new(Int64Builder::new());
    let mut purchased = ListBuilder::new(StringBuilder::new());
    let mut created = ListBuilder::new(StringBuilder::new());
    for user in users {
        for &tag in &user.interest_tags {
            tags.values().append_value(i64::from(tag));
        }
        tags.append(true);
        for id in &user.purchased_course_ids {
            purchased.values().append_value(id);
        }
        purchased.append(true);
        for id in &user.created_course_ids {
            created.values().append_value(id);
        }
        created.append(true);
    }
    let tags = tags.finish();
    let purchased = purchased.finish();
    let created = created.finish();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("interest_tags", tags.data_type().clone(), true),
        Field::new("level", DataType::Int64, false),
        Field::new("purchased_course_ids", purchased.data_type().clone(), true),
        Field::new("created_course_ids", created.data_type().clone(), true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(
                users.iter().map(|u| u.id.as_str()),
            )),
            Arc::new(tags),
            Arc::new(arrow::array::Int64Array::from_iter_values(
                users.iter().map(|u| i64::from(u.level)),
            )),
            Arc::new(purchased),
            Arc::new(created),
        ],
    )?;
    write_batch(path, schema, batch)
}

/// Write a courses table with a list-typed tag column.
pub fn write_courses(path: &Path, courses: &[Course]) -> Result<()> {
    let mut tags = ListBuilder::new(Int64Builder::new());
    for course in courses {
        for &tag in &course.tags {
            tags.values().append_value(i64::from(tag));
        }
        tags.append(true);
    }
    let tags = tags.finish();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("tags", tags.data_type().clone(), true),
        Field::new("level", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(
                courses.iter().map(|c| c.id.as_str()),
            )),
            Arc::new(tags),
            Arc::new(arrow::array::Int64Array::from_iter_values(
                courses.iter().map(|c| i64::from(c.level)),
            )),
        ],
    )?;
    write_batch(path, schema, batch)
}

fn write_batch(path: &Path, schema: Arc<Schema>, batch: RecordBatch) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    info!("Wrote parquet: {} ({} rows)", path.display(), batch.num_rows());
    Ok(())
}
