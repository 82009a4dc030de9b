//! Scenario tables and their projections
//!
//! A table is written as a list of rows; the first row is the heading row.
//! Whether the heading row is real headings or data depends on the
//! projection, see [`table_to_dict`] and [`table_to_list`].

use indexmap::IndexMap;
use serde::{de, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::literal::parse_cell;
use crate::substitute::{substitute, VariableStore};

/// A rectangular table of text cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headings: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table, checking that every row is as wide as the headings
    pub fn new(headings: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headings.is_empty() {
            return Err(Error::MalformedTable("table has no headings".to_string()));
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != headings.len())
        {
            return Err(Error::MalformedTable(format!(
                "row {} has {} cells, expected {}",
                index + 1,
                row.len(),
                headings.len()
            )));
        }
        Ok(Self { headings, rows })
    }

    /// Create a table whose first row is the heading row
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::MalformedTable("table has no rows".to_string()));
        }
        let headings = rows.remove(0);
        Self::new(headings, rows)
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn require_columns(&self, columns: usize) -> Result<()> {
        if columns > self.headings.len() {
            return Err(Error::MalformedTable(format!(
                "expected at least {} columns, found {}",
                columns,
                self.headings.len()
            )));
        }
        Ok(())
    }
}

/// Cells may be written as bare YAML scalars
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl From<RawCell> for String {
    fn from(cell: RawCell) -> Self {
        match cell {
            RawCell::Text(s) => s,
            RawCell::Number(n) => n.to_string(),
            RawCell::Bool(b) => b.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: Vec<Vec<RawCell>> = Vec::deserialize(deserializer)?;
        let rows = raw
            .into_iter()
            .map(|row| row.into_iter().map(String::from).collect())
            .collect();
        Table::from_rows(rows).map_err(de::Error::custom)
    }
}

fn is_key_value_headings(first: &str, second: &str) -> bool {
    matches!((first, second), ("key", "value") | ("value", "key"))
}

/// Project a table onto a single mapping.
///
/// - Two columns headed `key` and `value`: one entry per data row.
/// - Any other two columns: the heading row is the first entry and every
///   data row adds an entry keyed by its first cell.
/// - Any other width: the first record of [`table_to_array`]; further rows
///   are dropped.
///
/// Variable tokens in the values are resolved against `store`.
pub fn table_to_dict(table: &Table, store: &VariableStore) -> Result<Map<String, Value>> {
    let mut dict = Map::new();

    match table.headings() {
        [first, second] if is_key_value_headings(first, second) => {
            let (key_idx, value_idx) = if first == "key" { (0, 1) } else { (1, 0) };
            for row in table.rows() {
                dict.insert(row[key_idx].clone(), Value::String(row[value_idx].clone()));
            }
        }
        [first, second] => {
            dict.insert(first.clone(), Value::String(second.clone()));
            for row in table.rows() {
                dict.insert(row[0].clone(), Value::String(row[1].clone()));
            }
        }
        _ => {
            let records = table_to_array(table)?;
            if records.len() > 1 {
                tracing::warn!(
                    dropped = records.len() - 1,
                    "table has more than one record; only the first is used"
                );
            }
            dict = records.into_iter().next().ok_or_else(|| {
                Error::MalformedTable("table has headings but no data rows".to_string())
            })?;
        }
    }

    Ok(substitute(dict, store))
}

/// Project a table onto one record per data row, keyed by heading.
///
/// Every cell is reinterpreted through the literal grammar, so `foo:bar`,
/// `[a, b]` and JSON literals become structured values.
pub fn table_to_array(table: &Table) -> Result<Vec<Map<String, Value>>> {
    let mut records = Vec::with_capacity(table.rows().len());
    for row in table.rows() {
        let mut record = Map::new();
        for (heading, cell) in table.headings().iter().zip(row) {
            record.insert(heading.clone(), parse_cell(cell)?);
        }
        records.push(record);
    }
    Ok(records)
}

/// Collect the cells of the leading `columns` columns, row by row.
///
/// With `include_heading` the first heading is emitted first; use it for
/// heading-less tables such as a plain list of tags.
pub fn table_to_list(table: &Table, columns: usize, include_heading: bool) -> Result<Vec<String>> {
    table.require_columns(columns)?;

    let mut list = Vec::with_capacity(table.rows().len() * columns + 1);
    if include_heading {
        list.push(table.headings()[0].clone());
    }
    for row in table.rows() {
        list.extend(row.iter().take(columns).cloned());
    }
    Ok(list)
}

/// Group the second column by the first, keeping every response in order.
///
/// The heading row is treated as the first prompt/response pair.
pub fn table_to_prompt(table: &Table) -> Result<IndexMap<String, Vec<String>>> {
    table.require_columns(2)?;

    let mut prompts: IndexMap<String, Vec<String>> = IndexMap::new();
    let pairs = std::iter::once(table.headings()).chain(table.rows().iter().map(Vec::as_slice));
    for pair in pairs {
        prompts
            .entry(pair[0].clone())
            .or_default()
            .push(pair[1].clone());
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: &[&[&str]]) -> Table {
        Table::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_key_value_table_is_row_oriented() {
        let t = table(&[&["key", "value"], &["name", "Hank"], &["height", "72"]]);
        let dict = table_to_dict(&t, &VariableStore::new()).unwrap();
        assert_eq!(Value::Object(dict), json!({"name": "Hank", "height": "72"}));
    }

    #[test]
    fn test_two_column_table_uses_headings_as_entry() {
        let t = table(&[&["name", "Hank"], &["height", "72"], &["age", "30"]]);
        let dict = table_to_dict(&t, &VariableStore::new()).unwrap();
        assert_eq!(
            Value::Object(dict),
            json!({"name": "Hank", "height": "72", "age": "30"})
        );
    }

    #[test]
    fn test_table_to_dict_substitutes() {
        let t = table(&[&["key", "value"], &["host", "${ip}"]]);
        let store: VariableStore = [("ip", "10.1.1.1")].into_iter().collect();
        let dict = table_to_dict(&t, &store).unwrap();
        assert_eq!(dict["host"], json!("10.1.1.1"));
    }

    #[test]
    fn test_wide_table_keeps_first_record_only() {
        let t = table(&[
            &["name", "label", "run_automation"],
            &["Test", "alert", "False"],
            &["Other", "event", "True"],
        ]);
        let dict = table_to_dict(&t, &VariableStore::new()).unwrap();
        assert_eq!(
            Value::Object(dict),
            json!({"name": "Test", "label": "alert", "run_automation": "False"})
        );
    }

    #[test]
    fn test_wide_table_without_rows_is_malformed() {
        let t = table(&[&["name", "label", "status"]]);
        let err = table_to_dict(&t, &VariableStore::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedTable(_)));
    }

    #[test]
    fn test_table_to_array_parses_cells() {
        let t = table(&[
            &["name", "label", "cef", "tags"],
            &["test1", "event", "foo:bar", "[foo, bar ]"],
            &["test2", "event", r#"{"sourceAddress": "1.1.1.1"}"#, "solo"],
        ]);
        let records = table_to_array(&t).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["cef"], json!({"foo": "bar"}));
        assert_eq!(records[0]["tags"], json!(["foo", "bar"]));
        assert_eq!(records[1]["cef"]["sourceAddress"], json!("1.1.1.1"));
        assert_eq!(records[1]["tags"], json!("solo"));
    }

    #[test]
    fn test_table_to_list_with_heading() {
        let t = table(&[&["tag1"], &["tag2"], &["tag3"]]);
        assert_eq!(table_to_list(&t, 1, true).unwrap(), vec!["tag1", "tag2", "tag3"]);
        assert_eq!(table_to_list(&t, 1, false).unwrap(), vec!["tag2", "tag3"]);
    }

    #[test]
    fn test_table_to_list_multiple_columns() {
        let t = table(&[&["a", "b"], &["c", "d"], &["e", "f"]]);
        assert_eq!(table_to_list(&t, 2, false).unwrap(), vec!["c", "d", "e", "f"]);
        assert!(table_to_list(&t, 3, false).is_err());
    }

    #[test]
    fn test_table_to_prompt_groups_responses() {
        let t = table(&[&["approve", "yes"], &["reason", "test"], &["approve", "yes"]]);
        let prompts = table_to_prompt(&t).unwrap();
        assert_eq!(prompts["approve"], vec!["yes", "yes"]);
        assert_eq!(prompts["reason"], vec!["test"]);
        assert_eq!(prompts.keys().collect::<Vec<_>>(), vec!["approve", "reason"]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Table::from_rows(vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string()],
        ])
        .unwrap_err();
        assert!(matches!(err, Error::MalformedTable(_)));
    }

    #[test]
    fn test_deserialize_from_yaml_scalars() {
        let t: Table = serde_yaml::from_str("- [name, height]\n- [age, 30]\n- [ok, true]").unwrap();
        assert_eq!(t.headings(), ["name", "height"]);
        assert_eq!(t.rows()[0], vec!["age", "30"]);
        assert_eq!(t.rows()[1], vec!["ok", "true"]);
    }
}
