//! CSV export of stored submissions.
//!
//! The header comes from the first row's own keys, so column names and order
//! depend on the store's [`FieldLayout`]. Text containing a comma is wrapped in
//! double quotes. Nothing else is escaped: embedded quotes and newlines pass
//! through unchanged.

use chrono::SecondsFormat;

use crate::error::ExportError;
use crate::submission::Submission;
use crate::validation::{
    FieldSpec, AGE_RANGE, ATTITUDE_SCORE, CONTACT_EMAIL, FAMILY_SIZE, FIRSTBORN_EDUCATION,
    FIRSTBORN_GENDER, LATERBORN_EDUCATION, NOTES, REGION,
};

/// One exported value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl Cell {
    fn render(&self) -> String {
        match self {
            Cell::Text(s) if s.contains(',') => format!("\"{}\"", s),
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Null => String::new(),
        }
    }
}

/// Ordered key/value pairs for one record.
pub type ExportRow = Vec<(&'static str, Cell)>;

/// Column naming and order used by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    /// Form keys, identifier and timestamp first (in-memory store)
    Wire,
    /// snake_case columns in table order (relational store)
    Relational,
    /// camelCase document fields without internal `_id`/`__v` (document store)
    Document,
}

impl FieldLayout {
    /// Flatten a submission into this layout's key order.
    pub fn row(&self, record: &Submission) -> ExportRow {
        let fields = user_fields(record);
        match self {
            FieldLayout::Wire => {
                let mut row = vec![
                    ("id", Cell::Text(record.id.clone())),
                    ("timestamp", timestamp_cell(record)),
                ];
                row.extend(fields.into_iter().map(|(spec, cell)| (spec.wire, cell)));
                row.push(("ipAddress", optional(&record.ip_address)));
                row.push(("userAgent", optional(&record.user_agent)));
                row
            }
            FieldLayout::Relational => {
                let id = record
                    .id
                    .parse::<i64>()
                    .map(Cell::Integer)
                    .unwrap_or_else(|_| Cell::Text(record.id.clone()));
                let mut row = vec![("id", id)];
                row.extend(fields.into_iter().map(|(spec, cell)| (spec.snake, cell)));
                row.push(("ip_address", optional(&record.ip_address)));
                row.push(("user_agent", optional(&record.user_agent)));
                row.push(("timestamp", timestamp_cell(record)));
                row
            }
            FieldLayout::Document => {
                let mut row: ExportRow = fields
                    .into_iter()
                    .map(|(spec, cell)| (spec.camel, cell))
                    .collect();
                row.push(("ipAddress", optional(&record.ip_address)));
                row.push(("userAgent", optional(&record.user_agent)));
                row.push(("timestamp", timestamp_cell(record)));
                row
            }
        }
    }
}

fn user_fields(record: &Submission) -> Vec<(FieldSpec, Cell)> {
    vec![
        (REGION, Cell::Text(record.region.as_str().to_string())),
        (FAMILY_SIZE, Cell::Integer(i64::from(record.family_size))),
        (
            FIRSTBORN_GENDER,
            Cell::Text(record.firstborn_gender.as_str().to_string()),
        ),
        (ATTITUDE_SCORE, Cell::Float(record.attitude_score)),
        (FIRSTBORN_EDUCATION, Cell::Float(record.firstborn_education)),
        (LATERBORN_EDUCATION, Cell::Float(record.laterborn_education)),
        (AGE_RANGE, Cell::Text(record.age_range.as_str().to_string())),
        (NOTES, Cell::Text(record.notes.clone())),
        (CONTACT_EMAIL, Cell::Text(record.contact_email.clone())),
    ]
}

fn optional(value: &Option<String>) -> Cell {
    value.clone().map(Cell::Text).unwrap_or(Cell::Null)
}

fn timestamp_cell(record: &Submission) -> Cell {
    Cell::Text(record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Serialize rows to CSV text.
///
/// Values are emitted in the header's key order; a key missing from a later
/// row renders as an empty cell.
pub fn export_rows(rows: &[ExportRow]) -> Result<String, ExportError> {
    let first = rows.first().ok_or(ExportError::NoData)?;
    let header: Vec<&'static str> = first.iter().map(|(key, _)| *key).collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.join(","));
    for row in rows {
        let line: Vec<String> = header
            .iter()
            .map(|key| {
                row.iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, cell)| cell.render())
                    .unwrap_or_default()
            })
            .collect();
        lines.push(line.join(","));
    }

    tracing::debug!(rows = rows.len(), "exported submissions to CSV");
    Ok(lines.join("\n"))
}

/// Serialize submissions to CSV using a store's layout.
pub fn export_csv(records: &[Submission], layout: FieldLayout) -> Result<String, ExportError> {
    let rows: Vec<ExportRow> = records.iter().map(|r| layout.row(r)).collect();
    export_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{AgeRange, Gender, Region};
    use chrono::{TimeZone, Utc};

    fn sample(id: &str, notes: &str) -> Submission {
        Submission {
            id: id.into(),
            region: Region::British,
            family_size: 3,
            firstborn_gender: Gender::Male,
            attitude_score: 0.45,
            firstborn_education: 16.0,
            laterborn_education: 14.0,
            age_range: AgeRange::From26To30,
            notes: notes.into(),
            contact_email: String::new(),
            ip_address: Some("127.0.0.1".into()),
            user_agent: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_export_is_no_data() {
        assert_eq!(export_csv(&[], FieldLayout::Wire), Err(ExportError::NoData));
    }

    #[test]
    fn relational_layout() {
        let csv = export_csv(&[sample("7", "")], FieldLayout::Relational).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,region,family_size,firstborn_gender,attitude_score,firstborn_education,\
             laterborn_education,age_range,notes,contact_email,ip_address,user_agent,timestamp"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,British,3,male,0.45,16,14,26-30,,,127.0.0.1,,2024-03-01T12:00:00.000Z"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn document_layout_excludes_internal_ids() {
        let csv = export_csv(&[sample("65f0c0ffee", "")], FieldLayout::Document).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("region,familySize,"));
        assert!(!header.contains("id,"));
        assert!(!header.contains("__v"));
    }

    #[test]
    fn wire_layout_uses_form_keys() {
        let csv = export_csv(&[sample("abc", "")], FieldLayout::Wire).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(header.starts_with("id,timestamp,region,family-size,firstborn-gender"));
    }

    #[test]
    fn quotes_values_with_commas_only() {
        let records = [sample("1", "big family, lots of noise"), sample("2", "say \"hi\"")];
        let csv = export_csv(&records, FieldLayout::Wire).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert!(lines[1].contains(",\"big family, lots of noise\","));
        assert!(lines[2].contains(",say \"hi\","));
    }

    #[test]
    fn missing_keys_render_empty() {
        let rows = vec![
            vec![("a", Cell::Integer(1)), ("b", Cell::Text("x".into()))],
            vec![("a", Cell::Integer(2))],
        ];
        assert_eq!(export_rows(&rows).unwrap(), "a,b\n1,x\n2,");
    }
}
