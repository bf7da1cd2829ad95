use itertools::{EitherOrBoth, Itertools};

pub const MILESTONE_YEARS: [i32; 3] = [2025, 2050, 2100];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRow {
    pub year: Option<f64>,
    pub lower: Option<f64>,
    pub median: Option<f64>,
    pub upper: Option<f64>,
}

/// Projection band over years. All columns share one length and `year` is
/// ascending; rows missing every band value never make it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSeries {
    year: Vec<i32>,
    lower: Vec<Option<f64>>,
    median: Vec<Option<f64>>,
    upper: Vec<Option<f64>>,
}

/// One year of two medians side by side; a side is None when its series
/// has no median for that year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianPair {
    pub year: i32,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ProjectionSeries {
    pub fn from_rows(rows: impl IntoIterator<Item = SeriesRow>) -> Self {
        let mut rows = rows
            .into_iter()
            .filter(|row| row.lower.is_some() || row.median.is_some() || row.upper.is_some())
            .filter_map(|row| {
                let year = row.year.filter(|y| y.is_finite())?;
                Some((year.round() as i32, row))
            })
            .collect::<Vec<(i32, SeriesRow)>>();
        rows.sort_by_key(|(year, _)| *year);

        let mut series = ProjectionSeries::default();
        for (year, row) in rows {
            series.year.push(year);
            series.lower.push(row.lower);
            series.median.push(row.median);
            series.upper.push(row.upper);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_empty()
    }

    pub fn years(&self) -> &[i32] {
        &self.year
    }

    pub fn lower(&self) -> &[Option<f64>] {
        &self.lower
    }

    pub fn median(&self) -> &[Option<f64>] {
        &self.median
    }

    pub fn upper(&self) -> &[Option<f64>] {
        &self.upper
    }

    /// Some median is present and every present median is zero. Providers
    /// answer this way for codes they have no data for.
    pub fn is_all_zero(&self) -> bool {
        let mut present = self.median.iter().flatten().peekable();
        present.peek().is_some() && present.all(|v| *v == 0.0)
    }

    pub fn median_for_year(&self, year: i32) -> Option<f64> {
        self.year
            .iter()
            .position(|y| *y == year)
            .and_then(|i| self.median[i])
    }

    pub fn milestones(&self) -> Vec<(i32, Option<f64>)> {
        MILESTONE_YEARS
            .iter()
            .map(|year| (*year, self.median_for_year(*year)))
            .collect()
    }

    pub fn restrict(&self, from: i32, to: i32) -> ProjectionSeries {
        let mut series = ProjectionSeries::default();
        for (i, year) in self.year.iter().enumerate() {
            if *year < from || *year > to {
                continue;
            }
            series.year.push(*year);
            series.lower.push(self.lower[i]);
            series.median.push(self.median[i]);
            series.upper.push(self.upper[i]);
        }
        series
    }

    /// Outer join of both medians on year, ascending. Years where neither
    /// side has a median are left out.
    pub fn merge_medians(&self, other: &ProjectionSeries) -> Vec<MedianPair> {
        self.median_points()
            .merge_join_by(other.median_points(), |(a, _), (b, _)| a.cmp(b))
            .map(|pair| match pair {
                EitherOrBoth::Both((year, left), (_, right)) => MedianPair {
                    year,
                    left: Some(left),
                    right: Some(right),
                },
                EitherOrBoth::Left((year, left)) => MedianPair {
                    year,
                    left: Some(left),
                    right: None,
                },
                EitherOrBoth::Right((year, right)) => MedianPair {
                    year,
                    left: None,
                    right: Some(right),
                },
            })
            .collect()
    }

    fn median_points(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.year
            .iter()
            .zip(self.median.iter())
            .filter_map(|(year, median)| Some((*year, (*median)?)))
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((*self.year.first()?, *self.year.last()?))
    }

    pub fn summary(&self) -> [(&'static str, Option<BandSummary>); 3] {
        [
            ("median", summarize(&self.median)),
            ("lower", summarize(&self.lower)),
            ("upper", summarize(&self.upper)),
        ]
    }
}

fn summarize(values: &[Option<f64>]) -> Option<BandSummary> {
    let present = values.iter().flatten().copied().collect::<Vec<f64>>();
    if present.is_empty() {
        return None;
    }

    Some(BandSummary {
        count: present.len(),
        mean: present.iter().sum::<f64>() / present.len() as f64,
        min: present.iter().copied().fold(f64::INFINITY, f64::min),
        max: present.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: f64, lower: Option<f64>, median: Option<f64>, upper: Option<f64>) -> SeriesRow {
        SeriesRow {
            year: Some(year),
            lower,
            median,
            upper,
        }
    }

    #[test]
    fn rows_sorted_and_empty_rows_dropped() {
        let series = ProjectionSeries::from_rows(vec![
            row(2050.0, Some(1.0), Some(2.0), Some(3.0)),
            row(2025.0, None, Some(1.5), None),
            row(2030.0, None, None, None),
            SeriesRow {
                year: None,
                lower: Some(1.0),
                median: Some(1.0),
                upper: Some(1.0),
            },
        ]);
        assert_eq!(series.years(), &[2025, 2050]);
        assert_eq!(series.len(), series.lower().len());
        assert_eq!(series.len(), series.median().len());
        assert_eq!(series.len(), series.upper().len());
        assert_eq!(series.lower()[0], None);
    }

    #[test]
    fn all_zero_detection() {
        let zero = ProjectionSeries::from_rows(vec![
            row(2020.0, Some(0.0), Some(0.0), Some(0.0)),
            row(2030.0, Some(1.0), None, Some(1.0)),
        ]);
        assert!(zero.is_all_zero());

        let real = ProjectionSeries::from_rows(vec![
            row(2020.0, None, Some(0.0), None),
            row(2030.0, None, Some(0.2), None),
        ]);
        assert!(!real.is_all_zero());

        let no_median = ProjectionSeries::from_rows(vec![row(2020.0, Some(0.0), None, None)]);
        assert!(!no_median.is_all_zero());
        assert!(!ProjectionSeries::default().is_all_zero());
    }

    #[test]
    fn milestones_and_range() {
        let series = ProjectionSeries::from_rows(vec![
            row(2100.0, None, Some(3.0), None),
            row(2025.0, None, Some(1.0), None),
            row(2060.0, None, Some(2.0), None),
        ]);
        assert_eq!(series.milestones(), vec![(2025, Some(1.0)), (2050, None), (2100, Some(3.0))]);
        assert_eq!(series.year_range(), Some((2025, 2100)));
        assert_eq!(series.restrict(2030, 2099).years(), &[2060]);
        assert_eq!(ProjectionSeries::default().year_range(), None);
    }

    #[test]
    fn medians_outer_join_on_year() {
        let a = ProjectionSeries::from_rows(vec![
            row(2020.0, None, Some(1.0), None),
            row(2030.0, Some(0.5), None, None),
            row(2050.0, None, Some(2.0), None),
        ]);
        let b = ProjectionSeries::from_rows(vec![
            row(2050.0, None, Some(5.0), None),
            row(2040.0, None, Some(4.0), None),
        ]);

        let merged = a.merge_medians(&b);
        assert_eq!(
            merged,
            vec![
                MedianPair { year: 2020, left: Some(1.0), right: None },
                MedianPair { year: 2040, left: None, right: Some(4.0) },
                MedianPair { year: 2050, left: Some(2.0), right: Some(5.0) },
            ]
        );
        assert!(ProjectionSeries::default().merge_medians(&ProjectionSeries::default()).is_empty());
    }

    #[test]
    fn band_summary() {
        let series = ProjectionSeries::from_rows(vec![
            row(2020.0, None, Some(1.0), None),
            row(2030.0, None, Some(3.0), None),
            row(2040.0, None, None, Some(5.0)),
        ]);
        let [(name, median), (_, lower), (_, upper)] = series.summary();
        assert_eq!(name, "median");
        let median = median.unwrap();
        assert_eq!(median.count, 2);
        assert_eq!(median.mean, 2.0);
        assert_eq!(median.min, 1.0);
        assert_eq!(median.max, 3.0);
        assert!(lower.is_none());
        assert_eq!(upper.unwrap().count, 1);
    }
}
