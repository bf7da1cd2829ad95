use super::cie::{ShapeProvider, TimeSeriesProvider};
use super::fetch::{fetch_projection, FetchOutcome};
use super::series::{MedianPair, MILESTONE_YEARS};
use crate::error::LocateResult;
use crate::locate::resolver::RegionInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct ComparedLocation {
    pub info: RegionInfo,
    pub outcome: FetchOutcome,
}

/// Two locations charted for the same variable and scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: ComparedLocation,
    pub right: ComparedLocation,
    /// Medians of both sides joined on year.
    pub rows: Vec<MedianPair>,
}

impl Comparison {
    pub fn snapshot(&self) -> Vec<MedianPair> {
        MILESTONE_YEARS
            .iter()
            .map(|year| MedianPair {
                year: *year,
                left: self.left.outcome.series.median_for_year(*year),
                right: self.right.outcome.series.median_for_year(*year),
            })
            .collect()
    }

    pub fn rows_between(&self, from: i32, to: i32) -> Vec<MedianPair> {
        self.rows
            .iter()
            .filter(|row| row.year >= from && row.year <= to)
            .copied()
            .collect()
    }
}

/// Fetches `left` then `right` through the candidate cascade. Either side
/// running out of candidates fails the whole comparison.
pub async fn compare_projections<P>(
    provider: &P,
    left: RegionInfo,
    right: RegionInfo,
    variable: &str,
    scenario: &str,
) -> LocateResult<Comparison>
where
    P: TimeSeriesProvider + ShapeProvider,
{
    let left = fetch_side(provider, left, variable, scenario).await?;
    let right = fetch_side(provider, right, variable, scenario).await?;
    let rows = left.outcome.series.merge_medians(&right.outcome.series);
    tracing::info!(
        "Comparing {} and {}: {} joined years",
        left.info.display_name,
        right.info.display_name,
        rows.len()
    );

    Ok(Comparison { left, right, rows })
}

async fn fetch_side<P>(provider: &P, info: RegionInfo, variable: &str, scenario: &str) -> LocateResult<ComparedLocation>
where
    P: TimeSeriesProvider + ShapeProvider,
{
    match fetch_projection(provider, &info, variable, scenario).await.into_found() {
        Ok(outcome) => Ok(ComparedLocation { info, outcome }),
        Err(e) => {
            tracing::error!("No data found for {}: {}", info.display_name, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::fetch::tests::{berlin, FakeCie, Reply};
    use crate::error::LocateError;

    fn lisboa() -> RegionInfo {
        RegionInfo {
            code: "PT.LI".to_string(),
            country_iso2: "PT".to_string(),
            country_iso3: "PRT".to_string(),
            display_name: "Lisboa".to_string(),
        }
    }

    #[tokio::test]
    async fn medians_are_joined_and_snapshotted() {
        let cie = FakeCie {
            shapes: Some(Vec::new()),
            ..Default::default()
        }
        .reply("PT.LI", Reply::Points(vec![(2025.0, 1.0), (2050.0, 2.0), (2100.0, 3.0)]))
        .reply("DE-BE", Reply::Points(vec![(2075.0, 5.0), (2050.0, 4.0)]));

        let comparison = compare_projections(&cie, lisboa(), berlin(), "leh", "h_cpol").await.unwrap();
        assert_eq!(comparison.left.outcome.chosen.as_deref(), Some("PT.LI"));
        assert_eq!(comparison.right.outcome.chosen.as_deref(), Some("DE-BE"));

        let years = comparison.rows.iter().map(|row| row.year).collect::<Vec<_>>();
        assert_eq!(years, vec![2025, 2050, 2075, 2100]);
        assert_eq!(comparison.rows[2], MedianPair { year: 2075, left: None, right: Some(5.0) });

        assert_eq!(
            comparison.snapshot(),
            vec![
                MedianPair { year: 2025, left: Some(1.0), right: None },
                MedianPair { year: 2050, left: Some(2.0), right: Some(4.0) },
                MedianPair { year: 2100, left: Some(3.0), right: None },
            ]
        );
        assert_eq!(comparison.rows_between(2040, 2080).len(), 2);

        let queries = cie.queries.lock().unwrap();
        assert!(queries.iter().all(|(country, region)| match region.starts_with("PT") {
            true => country == "PRT",
            false => country == "DEU",
        }));
    }

    #[tokio::test]
    async fn side_without_data_fails_the_comparison() {
        let cie = FakeCie {
            shapes: Some(Vec::new()),
            ..Default::default()
        }
        .reply("PT.LI", Reply::Rows(vec![1.0, 2.0]));

        let err = compare_projections(&cie, lisboa(), berlin(), "leh", "h_cpol").await.unwrap_err();
        assert!(matches!(err, LocateError::CandidateExhausted { tried } if tried[0] == "DE.BE"));
    }
}
