use super::directory::{admin_directory, AdminDirectory, AdminRow};
use super::fuzzy::{match_region, MatchKind, DEFAULT_THRESHOLD};
use super::iso_index::{iso_index, IsoIndex};
use super::normalize::abbreviate;
use crate::error::{LocateError, LocateResult};
use reqwest::Client;

/// Looser than the matcher's default: a subdivision name close to the
/// division name is preferable to a synthesized code.
pub const RESOLVER_THRESHOLD: i32 = DEFAULT_THRESHOLD - 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub country_iso3: String,
    pub country_iso2: Option<String>,
    pub region_code: String,
    /// None when the code was synthesized without a subdivision match.
    pub match_kind: Option<MatchKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub code: String,
    pub country_iso2: String,
    pub country_iso3: String,
    pub display_name: String,
}

impl RegionInfo {
    /// Country parameter for provider queries: ISO3, else ISO2.
    pub fn country(&self) -> &str {
        match self.country_iso3.is_empty() {
            true => &self.country_iso2,
            false => &self.country_iso3,
        }
    }
}

pub fn resolve(row: &AdminRow, directory: &AdminDirectory, index: &IsoIndex) -> LocateResult<Resolution> {
    let iso3 = match row.country_iso3.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(iso3) => iso3.to_uppercase(),
        None => match directory.iso3_by_country_name(&row.country_name) {
            Some(iso3) => iso3.to_uppercase(),
            None => {
                tracing::error!("Could not determine ISO3 code for {}", row.label());
                return Err(LocateError::IsoUndetermined(row.display_name().to_string()));
            }
        },
    };

    let iso2 = directory.iso2_by_iso3(&iso3).map(|c| c.to_uppercase());
    let target = row.display_name();

    let matched = match (target.is_empty(), iso2.as_deref()) {
        (false, Some(iso2)) => {
            let matches = match_region(index, target, iso2, RESOLVER_THRESHOLD);
            matches.best().map(|best| (best.iso_code.to_uppercase(), matches.kind))
        }
        _ => None,
    };

    let (region_code, match_kind) = match (matched, iso2.as_deref()) {
        (Some((code, kind)), Some(iso2)) => (normalize_matched_code(&code, iso2, target), Some(kind)),
        (_, iso2) => (synthesize_code(iso2, &iso3, target), None),
    };

    tracing::debug!(
        "Resolved {} to country {} region {}",
        row.label(),
        iso3,
        region_code
    );

    Ok(Resolution {
        country_iso3: iso3,
        country_iso2: iso2,
        region_code,
        match_kind,
    })
}

pub fn build_region_info(row: &AdminRow, directory: &AdminDirectory, index: &IsoIndex) -> LocateResult<RegionInfo> {
    let resolution = resolve(row, directory, index)?;
    if resolution.match_kind == Some(MatchKind::BestEffort) {
        tracing::info!(
            "No confident subdivision match for '{}', best guess is {}",
            row.display_name(),
            resolution.region_code
        );
    }

    Ok(RegionInfo {
        code: resolution.region_code,
        country_iso2: resolution.country_iso2.unwrap_or_default(),
        country_iso3: resolution.country_iso3,
        display_name: row.display_name().to_string(),
    })
}

/// Resolves against the process-wide directory and subdivision tables.
pub async fn region_info_for(client: &Client, row: &AdminRow) -> LocateResult<RegionInfo> {
    let directory = admin_directory(client).await?;
    let index = iso_index(client).await?;
    build_region_info(row, directory, index)
}

// Numeric subdivision suffixes mean nothing to the time-series provider, so
// they are swapped for letters of the division name. Those letters come from
// the name that was searched, not the subdivision that matched.
fn normalize_matched_code(code: &str, iso2: &str, target: &str) -> String {
    let code = code.replace('-', ".");
    let suffix = code.strip_prefix(&format!("{}.", iso2)).unwrap_or(&code);
    if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
        let abbr = abbreviate(target);
        if !abbr.is_empty() {
            return format!("{}.{}", iso2, abbr);
        }
    }

    code
}

fn synthesize_code(iso2: Option<&str>, iso3: &str, target: &str) -> String {
    let abbr = abbreviate(target);
    match (iso2, abbr.is_empty()) {
        (Some(iso2), false) => format!("{}.{}", iso2, abbr),
        _ => iso3.to_string(),
    }
}
