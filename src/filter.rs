use crate::roster::RosterRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    Prefix,
}

impl MatchMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "contains" | "substring" => Some(MatchMode::Contains),
            "prefix" | "startswith" | "starts_with" => Some(MatchMode::Prefix),
            _ => None,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            MatchMode::Contains => MatchMode::Prefix,
            MatchMode::Prefix => MatchMode::Contains,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Name,
    School,
}

impl FilterColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "name" => Some(FilterColumn::Name),
            "school" => Some(FilterColumn::School),
            _ => None,
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            FilterColumn::Name => FilterColumn::School,
            FilterColumn::School => FilterColumn::Name,
        }
    }
}

/// Which column the search box looks at and how it compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFilter {
    pub column: FilterColumn,
    pub matcher: MatchMode,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self {
            column: FilterColumn::Name,
            matcher: MatchMode::Contains,
        }
    }
}

impl RowFilter {
    pub fn column_text<'a>(&self, row: &'a RosterRow) -> &'a str {
        match self.column {
            FilterColumn::Name => &row.name,
            FilterColumn::School => &row.school,
        }
    }

    pub fn matches(&self, row: &RosterRow, query: &str) -> bool {
        let query = query.to_lowercase();
        self.matches_normalized(row, &query)
    }

    fn matches_normalized(&self, row: &RosterRow, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let text = self.column_text(row).to_lowercase();
        match self.matcher {
            MatchMode::Contains => text.contains(query),
            MatchMode::Prefix => text.starts_with(query),
        }
    }
}

/// Visibility of each row, index aligned with `rows`.
pub fn apply_filter(rows: &[RosterRow], filter: &RowFilter, query: &str) -> Vec<bool> {
    let query = query.to_lowercase();
    rows.iter()
        .map(|row| filter.matches_normalized(row, &query))
        .collect()
}

pub fn visible_rows<'a>(
    rows: &'a [RosterRow],
    filter: &RowFilter,
    query: &str,
) -> Vec<&'a RosterRow> {
    let query = query.to_lowercase();
    rows.iter()
        .filter(|row| filter.matches_normalized(row, &query))
        .collect()
}

pub fn match_mode_label(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Contains => "CONTAINS",
        MatchMode::Prefix => "PREFIX",
    }
}

pub fn column_label(column: FilterColumn) -> &'static str {
    match column {
        FilterColumn::Name => "NAME",
        FilterColumn::School => "SCHOOL",
    }
}
