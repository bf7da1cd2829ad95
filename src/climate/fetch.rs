use super::cascade::build_candidates;
use super::cie::{region_param, SeriesQuery, ShapeProvider, TimeSeriesProvider};
use super::series::ProjectionSeries;
use crate::error::{LocateError, LocateResult};
use crate::locate::resolver::RegionInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub series: ProjectionSeries,
    /// Candidate that produced `series`; None once the cascade is exhausted.
    pub chosen: Option<String>,
    pub tried: Vec<String>,
}

impl FetchOutcome {
    pub fn found(&self) -> bool {
        self.chosen.is_some()
    }

    pub fn into_found(self) -> LocateResult<FetchOutcome> {
        match self.found() {
            true => Ok(self),
            false => Err(LocateError::CandidateExhausted { tried: self.tried }),
        }
    }
}

/// Walks the candidate cascade one query at a time and keeps the first
/// series that is neither empty nor all zero. Failed queries just advance.
pub async fn fetch_projection<P>(provider: &P, info: &RegionInfo, variable: &str, scenario: &str) -> FetchOutcome
where
    P: TimeSeriesProvider + ShapeProvider,
{
    let shape_country = info.country();
    let shape_codes = match provider.shape_codes(shape_country).await {
        Ok(codes) => codes,
        Err(e) => {
            tracing::warn!("Shape listing for {} failed: {}", shape_country, e);
            Vec::new()
        }
    };

    let candidates = build_candidates(info, &shape_codes);
    let country = info.country();
    let mut tried = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        tried.push(candidate.clone());
        let query = SeriesQuery::new(country, &candidate, variable, scenario);
        let series = match provider.timeseries(&query).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Region '{}' failed for {}: {}", region_param(&candidate), country, e);
                continue;
            }
        };

        if series.is_empty() {
            tracing::debug!("Region '{}' returned no rows", candidate);
            continue;
        }
        if series.is_all_zero() {
            tracing::debug!("Region '{}' returned an all-zero median, skipping", candidate);
            continue;
        }

        tracing::info!(
            "Using region '{}' for {} {} ({} rows, {} tried)",
            candidate,
            variable,
            scenario,
            series.len(),
            tried.len()
        );
        return FetchOutcome {
            series,
            chosen: Some(candidate),
            tried,
        };
    }

    tracing::warn!(
        "No projection data for {} / {} / {} after {} candidates",
        info.display_name,
        variable,
        scenario,
        tried.len()
    );
    FetchOutcome {
        series: ProjectionSeries::default(),
        chosen: None,
        tried,
    }
}
