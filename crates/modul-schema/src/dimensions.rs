//! Profile-dimension shape detection.
//!
//! Older payloads list dimensions as plain strings, newer ones as records
//! with a description. The shape is decided by the type of the first
//! element and nothing else, so the rule is the same for every caller.

use crate::fields::{Cursor, Diagnostics};
use modul_core::document::{DescribedDimension, ProfileDimensions};
use serde_json::Value;

/// Shape of a dimension list, decided from its first element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionShape {
    Strings,
    Records,
    Empty,
    Unknown,
}

pub fn detect_shape(value: &Value) -> DimensionShape {
    match value {
        Value::Array(items) => match items.first() {
            None => DimensionShape::Empty,
            Some(Value::String(_)) => DimensionShape::Strings,
            Some(Value::Object(_)) => DimensionShape::Records,
            Some(_) => DimensionShape::Unknown,
        },
        Value::Null => DimensionShape::Empty,
        // "Kreativitas, Kolaborasi" as one string
        Value::String(_) => DimensionShape::Strings,
        _ => DimensionShape::Unknown,
    }
}

pub fn adapt_dimensions(cursor: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> ProfileDimensions {
    match detect_shape(cursor.value()) {
        DimensionShape::Empty => ProfileDimensions::Listed(Vec::new()),
        DimensionShape::Strings => ProfileDimensions::Listed(split_listed(cursor, path, diag)),
        DimensionShape::Records => {
            let records = cursor
                .items(path, diag)
                .into_iter()
                .enumerate()
                .map(|(i, item)| described(item, &format!("{}[{}]", path, i), diag))
                .collect();
            ProfileDimensions::Described(records)
        }
        DimensionShape::Unknown => {
            diag.unexpected(path, cursor.value());
            ProfileDimensions::Listed(Vec::new())
        }
    }
}

fn split_listed(cursor: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> Vec<String> {
    match cursor.value() {
        Value::String(joined) => joined
            .split([',', ';', '\n'])
            .map(crate::fields::strip_list_marker)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => cursor.list(path, diag),
    }
}

fn described(item: Cursor<'_>, path: &str, diag: &mut Diagnostics) -> DescribedDimension {
    if let Value::String(_) = item.value() {
        // mixed list after a record head: keep the name, no description
        return DescribedDimension {
            dimension: item.text(path, diag),
            description: modul_core::PLACEHOLDER.to_string(),
        };
    }
    DescribedDimension {
        dimension: item
            .first(&["dimensi", "dimension", "nama", "judul", "kode"])
            .text(&format!("{}.dimensi", path), diag),
        description: item
            .first(&["deskripsi", "description", "penjelasan", "uraian"])
            .text(&format!("{}.deskripsi", path), diag),
    }
}
