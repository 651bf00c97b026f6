//! Feature frames
//!
//! Converts Arrow record batches into row-oriented feature records for the
//! churn model, and back into output batches for the prediction log.
//!
//! - Integer, float and boolean columns become [`FeatureValue::Number`]
//! - String columns become [`FeatureValue::Text`]
//! - Nulls are left out of the record

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One feature cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Numeric feature.
    Number(f64),
    /// Categorical feature.
    Text(String),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Column name to value, for one row.
pub type FeatureRecord = BTreeMap<String, FeatureValue>;

/// Feature records with their binary labels (1 = churned).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledData {
    /// Feature rows.
    pub features: Vec<FeatureRecord>,
    /// Labels aligned with `features`.
    pub labels: Vec<bool>,
}

impl LabeledData {
    /// Build from a batch: drop `drop_columns` (if present), pop `label_column`
    /// and encode it, convert the rest to feature records.
    ///
    /// # Errors
    ///
    /// Returns error if the label column is missing or holds values other
    /// than yes/no, or a feature column has an unsupported type.
    pub fn from_batch(batch: &RecordBatch, label_column: &str, drop_columns: &[&str]) -> Result<Self> {
        let label = batch
            .column_by_name(label_column)
            .ok_or_else(|| Error::InvalidInput(format!("Missing label column: {label_column}")))?;
        let labels = encode_labels(label)?;

        let mut dropped: Vec<&str> = drop_columns.to_vec();
        dropped.push(label_column);
        let features = records_from_batch(&drop_columns_from(batch, &dropped)?)?;

        Ok(Self { features, labels })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Check if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Rows at `indices`, in that order.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

/// Remove named columns; names that are absent are ignored.
///
/// # Errors
///
/// Returns error if the projected batch cannot be built.
pub fn drop_columns_from(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch> {
    let keep: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !names.contains(&f.name().as_str()))
        .map(|(i, _)| i)
        .collect();
    Ok(batch.project(&keep)?)
}

/// Encode a yes/no label column to booleans.
///
/// Strings are matched case-insensitively after trimming. Boolean columns
/// and integer 0/1 columns are accepted as-is.
///
/// # Errors
///
/// Returns error on nulls or values outside the two classes.
pub fn encode_labels(column: &ArrayRef) -> Result<Vec<bool>> {
    if column.null_count() > 0 {
        return Err(Error::InvalidInput("Label column contains nulls".to_string()));
    }

    match column.data_type() {
        DataType::Boolean => Ok(column.as_boolean().iter().map(|v| v == Some(true)).collect()),
        DataType::Utf8 | DataType::LargeUtf8 => {
            let strings = cast(column, &DataType::Utf8)?;
            strings
                .as_string::<i32>()
                .iter()
                .map(|v| match v.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
                    Some("yes") => Ok(true),
                    Some("no") => Ok(false),
                    other => Err(Error::InvalidInput(format!(
                        "Unexpected label value: {other:?}"
                    ))),
                })
                .collect()
        }
        t if t.is_integer() => {
            let numbers = cast(column, &DataType::Float64)?;
            numbers
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| match v {
                    Some(x) if x == 1.0 => Ok(true),
                    Some(x) if x == 0.0 => Ok(false),
                    other => Err(Error::InvalidInput(format!(
                        "Unexpected label value: {other:?}"
                    ))),
                })
                .collect()
        }
        other => Err(Error::InvalidInput(format!(
            "Unsupported label column type: {other}"
        ))),
    }
}

/// Convert every column of `batch` into row-oriented feature records.
///
/// # Errors
///
/// Returns error if a column has a type other than numeric, boolean or string.
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<FeatureRecord>> {
    let mut records = vec![FeatureRecord::new(); batch.num_rows()];
    let schema = batch.schema();

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name();
        match column.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => {
                let strings = cast(column, &DataType::Utf8)?;
                for (record, value) in records.iter_mut().zip(strings.as_string::<i32>().iter()) {
                    if let Some(v) = value {
                        record.insert(name.clone(), FeatureValue::Text(v.to_string()));
                    }
                }
            }
            DataType::Boolean => {
                for (record, value) in records.iter_mut().zip(column.as_boolean().iter()) {
                    if let Some(v) = value {
                        record.insert(name.clone(), FeatureValue::Number(f64::from(u8::from(v))));
                    }
                }
            }
            t if t.is_numeric() => {
                let numbers = cast(column, &DataType::Float64)?;
                for (record, value) in records
                    .iter_mut()
                    .zip(numbers.as_primitive::<Float64Type>().iter())
                {
                    if let Some(v) = value {
                        record.insert(name.clone(), FeatureValue::Number(v));
                    }
                }
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "Unsupported feature column {name}: {other}"
                )));
            }
        }
    }

    Ok(records)
}

/// Append string and float columns to a batch.
///
/// # Errors
///
/// Returns error if a column length differs from the batch row count.
pub fn with_columns(
    batch: &RecordBatch,
    float_columns: Vec<(&str, Vec<f64>)>,
    text_columns: Vec<(&str, Vec<String>)>,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    for (name, values) in float_columns {
        fields.push(Field::new(name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values)));
    }
    for (name, values) in text_columns {
        fields.push(Field::new(name, DataType::Utf8, false));
        columns.push(Arc::new(StringArray::from(values)));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
