use super::directory::{AdminDirectory, AdminRow};
use super::normalize::normalize;
use crate::error::{LocateError, LocateResult};

#[derive(Debug, Clone, PartialEq)]
pub enum DivisionSearch {
    /// Hits from the district → region → country walk.
    Divisions(Vec<AdminRow>),
    /// Nothing matched the walk; these came from the country table alone.
    NationalFallback(Vec<AdminRow>),
}

impl DivisionSearch {
    pub fn rows(&self) -> &[AdminRow] {
        match self {
            DivisionSearch::Divisions(rows) | DivisionSearch::NationalFallback(rows) => rows,
        }
    }

    pub fn is_national_fallback(&self) -> bool {
        matches!(self, DivisionSearch::NationalFallback(_))
    }
}

/// Returns rows of the first level that matches the query, trying exact
/// normalized equality over every level before substring containment.
pub fn find_division(directory: &AdminDirectory, query: &str) -> Vec<AdminRow> {
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return Vec::new();
    }

    for exact in [true, false] {
        for table in directory.levels() {
            let hits = table.matching(&query_norm, exact);
            if !hits.is_empty() {
                tracing::debug!(
                    "'{}' matched {} {} row(s) ({})",
                    query,
                    hits.len(),
                    table.level(),
                    if exact { "exact" } else { "substring" }
                );
                return sort_by_level(hits);
            }
        }
    }

    Vec::new()
}

pub fn find_country(directory: &AdminDirectory, query: &str) -> Vec<AdminRow> {
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return Vec::new();
    }

    match directory.countries.matching(&query_norm, true) {
        hits if !hits.is_empty() => hits,
        _ => directory.countries.matching(&query_norm, false),
    }
}

/// Full location search: the level walk, then the country-table fallback.
pub fn search(directory: &AdminDirectory, query: &str) -> LocateResult<DivisionSearch> {
    let hits = find_division(directory, query);
    if !hits.is_empty() {
        return Ok(DivisionSearch::Divisions(hits));
    }

    tracing::warn!("No city or region found for '{}'. Trying national level.", query);
    let national = find_country(directory, query);
    if national.is_empty() {
        tracing::warn!("No matching location found at any level for '{}'", query);
        return Err(LocateError::NoDivisionMatch(query.to_string()));
    }

    tracing::info!("Defaulted to national level: {}", national[0].name);
    Ok(DivisionSearch::NationalFallback(national))
}

/// Most specific row for the query, as the comparison workflow takes it.
pub fn first_match(directory: &AdminDirectory, query: &str) -> LocateResult<AdminRow> {
    match search(directory, query)?.rows().first() {
        Some(row) => Ok(row.clone()),
        None => Err(LocateError::NoDivisionMatch(query.to_string())),
    }
}

fn sort_by_level(mut rows: Vec<AdminRow>) -> Vec<AdminRow> {
    rows.sort_by_key(|row| row.level);
    rows
}
