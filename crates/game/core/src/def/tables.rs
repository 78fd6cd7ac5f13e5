//! Reference tables (asset rows).
//!
//! Each table declares unique-key tuples. An index per key is built when the
//! table is constructed or deserialized, so equality lookups that pin a whole
//! key resolve in one map probe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

pub type Row = BTreeMap<String, Value>;

/// Wire form of [`AssetTable`]; carries no index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAssetTable {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, ValueType>,
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawAssetTable", into = "RawAssetTable")]
pub struct AssetTable {
    pub id: String,
    pub fields: BTreeMap<String, ValueType>,
    pub unique_keys: Vec<Vec<String>>,
    pub rows: Vec<Row>,
    /// One map per unique key: key tuple -> row index. First row wins on
    /// duplicate tuples.
    index: Vec<BTreeMap<Vec<Value>, usize>>,
}

impl AssetTable {
    pub fn key_tuple(row: &Row, key: &[String]) -> Option<Vec<Value>> {
        key.iter().map(|field| row.get(field).cloned()).collect()
    }

    /// Row index for `tuple` under unique key number `key`.
    pub fn lookup(&self, key: usize, tuple: &[Value]) -> Option<usize> {
        self.index.get(key)?.get(tuple).copied()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }
}

impl From<RawAssetTable> for AssetTable {
    fn from(raw: RawAssetTable) -> Self {
        let index = raw
            .unique_keys
            .iter()
            .map(|key| {
                let mut map = BTreeMap::new();
                for (i, row) in raw.rows.iter().enumerate() {
                    if let Some(tuple) = Self::key_tuple(row, key) {
                        map.entry(tuple).or_insert(i);
                    }
                }
                map
            })
            .collect();
        Self {
            id: raw.id,
            fields: raw.fields,
            unique_keys: raw.unique_keys,
            rows: raw.rows,
            index,
        }
    }
}

impl From<AssetTable> for RawAssetTable {
    fn from(table: AssetTable) -> Self {
        Self {
            id: table.id,
            fields: table.fields,
            unique_keys: table.unique_keys,
            rows: table.rows,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::units_table;
    use super::*;

    #[test]
    fn index_resolves_full_key() {
        let table = units_table();
        assert_eq!(
            table.lookup(0, &[Value::from("blue"), Value::from("infantry")]),
            Some(2)
        );
        assert_eq!(table.lookup(0, &[Value::from("blue"), Value::from("cavalry")]), None);
        assert_eq!(table.lookup(1, &[]), None);
    }

    #[test]
    fn index_is_rebuilt_after_deserialization() {
        let table = units_table();
        let json = serde_json::to_string(&table).unwrap();
        assert!(!json.contains("index"));
        let back: AssetTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
