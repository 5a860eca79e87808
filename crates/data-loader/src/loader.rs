//! Dataset loading.
//!
//! Input tables arrive as Parquet files; some upstream exports still produce
//! CSV, so loading tries Parquet first and falls back to CSV when the file
//! isn't a Parquet container. List-typed cells in CSV are bracketed literals
//! (`[1, 2]`, `['c1', 'c2']`).

use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, Int32Array, Int64Array, ListArray, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{info, warn};

use crate::error::{DataLoadError, Result};
use crate::types::{Course, Level, MAX_LEVEL, TagId, User};

/// Columns the users file must carry.
pub const USERS_REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "interest_tags",
    "level",
    "purchased_course_ids",
    "created_course_ids",
];

/// Columns the courses file must carry.
pub const COURSES_REQUIRED_COLUMNS: &[&str] = &["id", "tags", "level"];

/// Load and validate the users table.
pub fn load_users(path: &Path) -> Result<Vec<User>> {
    let file = open_checked(path)?;
    let label = file_label(path);

    match ParquetRecordBatchReaderBuilder::try_new(file) {
        Ok(builder) => {
            let mut users = Vec::new();
            for batch in builder.build()? {
                users_from_batch(&batch?, &label, &mut users)?;
            }
            info!("Loaded parquet: {} ({} users)", path.display(), users.len());
            Ok(users)
        }
        Err(err) => {
            warn!(
                "Parquet load failed for {} ({err}), trying CSV fallback",
                path.display()
            );
            let users = users_from_csv(path, &label)?;
            info!("Loaded CSV: {} ({} users)", path.display(), users.len());
            Ok(users)
        }
    }
}

/// Load and validate the courses table.
pub fn load_courses(path: &Path) -> Result<Vec<Course>> {
    let file = open_checked(path)?;
    let label = file_label(path);

    match ParquetRecordBatchReaderBuilder::try_new(file) {
        Ok(builder) => {
            let mut courses = Vec::new();
            for batch in builder.build()? {
                courses_from_batch(&batch?, &label, &mut courses)?;
            }
            info!(
                "Loaded parquet: {} ({} courses)",
                path.display(),
                courses.len()
            );
            Ok(courses)
        }
        Err(err) => {
            warn!(
                "Parquet load failed for {} ({err}), trying CSV fallback",
                path.display()
            );
            let courses = courses_from_csv(path, &label)?;
            info!("Loaded CSV: {} ({} courses)", path.display(), courses.len());
            Ok(courses)
        }
    }
}

fn open_checked(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(File::open(path)?)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Parquet
// =============================================================================

fn users_from_batch(batch: &RecordBatch, file: &str, out: &mut Vec<User>) -> Result<()> {
    let ids = string_column(batch, "id", file)?;
    let tags = list_column(batch, "interest_tags", file)?;
    let levels = int_column(batch, "level", file)?;
    let purchased = list_column(batch, "purchased_course_ids", file)?;
    let created = list_column(batch, "created_course_ids", file)?;

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        out.push(User {
            id: ids.value(row).to_string(),
            interest_tags: tag_list(tags, row, file, "interest_tags")?,
            level: parse_level(levels.value(row))?,
            purchased_course_ids: string_list(purchased, row, file, "purchased_course_ids")?,
            created_course_ids: string_list(created, row, file, "created_course_ids")?,
        });
    }
    Ok(())
}

fn courses_from_batch(batch: &RecordBatch, file: &str, out: &mut Vec<Course>) -> Result<()> {
    let ids = string_column(batch, "id", file)?;
    let tags = list_column(batch, "tags", file)?;
    let levels = int_column(batch, "level", file)?;

    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        out.push(Course {
            id: ids.value(row).to_string(),
            tags: tag_list(tags, row, file, "tags")?,
            level: parse_level(levels.value(row))?,
        });
    }
    Ok(())
}

fn column<'a>(batch: &'a RecordBatch, name: &str, file: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DataLoadError::MissingColumn {
            file: file.to_string(),
            column: name.to_string(),
        })
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str, file: &str) -> Result<&'a StringArray> {
    let col = column(batch, name, file)?;
    col.as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DataLoadError::ColumnType {
            file: file.to_string(),
            column: name.to_string(),
            found: col.data_type().to_string(),
        })
}

fn list_column<'a>(batch: &'a RecordBatch, name: &str, file: &str) -> Result<&'a ListArray> {
    let col = column(batch, name, file)?;
    col.as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| DataLoadError::ColumnType {
            file: file.to_string(),
            column: name.to_string(),
            found: col.data_type().to_string(),
        })
}

/// Integer column holder. Pandas exports write `int64`; hand-built files may
/// use `int32`.
enum IntColumn<'a> {
    I64(&'a Int64Array),
    I32(&'a Int32Array),
}

impl IntColumn<'_> {
    fn value(&self, row: usize) -> i64 {
        match self {
            IntColumn::I64(a) => a.value(row),
            IntColumn::I32(a) => i64::from(a.value(row)),
        }
    }
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str, file: &str) -> Result<IntColumn<'a>> {
    let col = column(batch, name, file)?;
    if let Some(a) = col.as_any().downcast_ref::<Int64Array>() {
        return Ok(IntColumn::I64(a));
    }
    if let Some(a) = col.as_any().downcast_ref::<Int32Array>() {
        return Ok(IntColumn::I32(a));
    }
    Err(DataLoadError::ColumnType {
        file: file.to_string(),
        column: name.to_string(),
        found: col.data_type().to_string(),
    })
}

/// Null list cells are empty lists.
fn tag_list(list: &ListArray, row: usize, file: &str, column: &str) -> Result<Vec<TagId>> {
    if list.is_null(row) {
        return Ok(Vec::new());
    }
    let values = list.value(row);
    if let Some(a) = values.as_any().downcast_ref::<Int64Array>() {
        return (0..a.len()).map(|i| parse_tag(a.value(i), column)).collect();
    }
    if let Some(a) = values.as_any().downcast_ref::<Int32Array>() {
        return (0..a.len())
            .map(|i| parse_tag(i64::from(a.value(i)), column))
            .collect();
    }
    Err(DataLoadError::ColumnType {
        file: file.to_string(),
        column: column.to_string(),
        found: values.data_type().to_string(),
    })
}

fn string_list(list: &ListArray, row: usize, file: &str, column: &str) -> Result<Vec<String>> {
    if list.is_null(row) {
        return Ok(Vec::new());
    }
    let values = list.value(row);
    let strings = values
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DataLoadError::ColumnType {
            file: file.to_string(),
            column: column.to_string(),
            found: values.data_type().to_string(),
        })?;
    Ok((0..strings.len())
        .map(|i| strings.value(i).to_string())
        .collect())
}

fn parse_tag(raw: i64, column: &str) -> Result<TagId> {
    TagId::try_from(raw).map_err(|_| DataLoadError::InvalidValue {
        field: column.to_string(),
        value: raw.to_string(),
    })
}

fn parse_level(raw: i64) -> Result<Level> {
    if !(0..=i64::from(MAX_LEVEL)).contains(&raw) {
        return Err(DataLoadError::InvalidValue {
            field: "level".to_string(),
            value: raw.to_string(),
        });
    }
    Ok(raw as Level)
}

// =============================================================================
// CSV fallback
// =============================================================================

fn users_from_csv(path: &Path, file: &str) -> Result<Vec<User>> {
    let mut reader = csv::Reader::from_path(path)?;
    let header = HeaderIndex::new(&mut reader, file, USERS_REQUIRED_COLUMNS)?;

    let mut users = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 2; // header is row 1
        users.push(User {
            id: header.get(&record, "id").to_string(),
            interest_tags: parse_tag_cell(header.get(&record, "interest_tags"), file, row)?,
            level: parse_level_cell(header.get(&record, "level"), file, row)?,
            purchased_course_ids: parse_list_cell(header.get(&record, "purchased_course_ids")),
            created_course_ids: parse_list_cell(header.get(&record, "created_course_ids")),
        });
    }
    Ok(users)
}

fn courses_from_csv(path: &Path, file: &str) -> Result<Vec<Course>> {
    let mut reader = csv::Reader::from_path(path)?;
    let header = HeaderIndex::new(&mut reader, file, COURSES_REQUIRED_COLUMNS)?;

    let mut courses = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 2;
        courses.push(Course {
            id: header.get(&record, "id").to_string(),
            tags: parse_tag_cell(header.get(&record, "tags"), file, row)?,
            level: parse_level_cell(header.get(&record, "level"), file, row)?,
        });
    }
    Ok(courses)
}

/// Maps required column names to their position in the CSV header.
struct HeaderIndex {
    positions: Vec<(&'static str, usize)>,
}

impl HeaderIndex {
    fn new(
        reader: &mut csv::Reader<File>,
        file: &str,
        required: &[&'static str],
    ) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let mut positions = Vec::with_capacity(required.len());
        for &name in required {
            let pos = headers.iter().position(|h| h == name).ok_or_else(|| {
                DataLoadError::MissingColumn {
                    file: file.to_string(),
                    column: name.to_string(),
                }
            })?;
            positions.push((name, pos));
        }
        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, name: &str) -> &'r str {
        let pos = self
            .positions
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
            .expect("column validated in HeaderIndex::new");
        record.get(pos).unwrap_or("")
    }
}

/// Parse a bracketed list literal as written by dataframe CSV exports,
/// e.g. `[1, 2, 3]` or `['c1', 'c2']`. Empty cells are empty lists.
fn parse_list_cell(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Vec::new();
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_tag_cell(raw: &str, file: &str, row: usize) -> Result<Vec<TagId>> {
    parse_list_cell(raw)
        .into_iter()
        .map(|item| {
            item.parse::<TagId>().map_err(|_| DataLoadError::ParseError {
                file: file.to_string(),
                row,
                reason: format!("invalid tag id '{item}'"),
            })
        })
        .collect()
}

fn parse_level_cell(raw: &str, file: &str, row: usize) -> Result<Level> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| DataLoadError::ParseError {
            file: file.to_string(),
            row,
            reason: format!("invalid level '{raw}'"),
        })?;
    parse_level(value)
}
