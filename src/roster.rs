use serde::Deserialize;

use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub id: u32,
    pub name: String,
    pub school: String,
    pub attending: bool,
}

// Wire order is [id, name, attending, school].
#[derive(Debug, Deserialize)]
struct WireRow(u32, String, bool, String);

impl From<WireRow> for RosterRow {
    fn from(WireRow(id, name, attending, school): WireRow) -> Self {
        Self {
            id,
            name,
            school,
            attending,
        }
    }
}

pub fn parse_roster_json(raw: &str) -> FetchResult<Vec<RosterRow>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::Parse("empty roster body".to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    // Some deployments encode the row list twice and send it as a JSON string.
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    let rows: Vec<WireRow> = serde_json::from_value(value)?;
    Ok(rows.into_iter().map(RosterRow::from).collect())
}

/// Splits rows into (present, absent), keeping server order inside each table.
pub fn partition_rows<'a>(
    rows: impl IntoIterator<Item = &'a RosterRow>,
) -> (Vec<&'a RosterRow>, Vec<&'a RosterRow>) {
    rows.into_iter().partition(|row| row.attending)
}

pub fn action_label(row: &RosterRow, pending: bool) -> &'static str {
    if pending {
        "Saving..."
    } else if row.attending {
        "Mark absent"
    } else {
        "Mark present"
    }
}
