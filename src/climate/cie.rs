use super::series::{ProjectionSeries, SeriesRow};
use super::shapes::parse_shape_codes;
use crate::error::LocateResult;
use crate::prelude::*;
use crate::service::var_service::get_cie_base_url;
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

pub const DEFAULT_SEASON: &str = "annual";
pub const DEFAULT_AGGREGATION: &str = "area";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery<'a> {
    pub country: &'a str,
    pub region: &'a str,
    pub variable: &'a str,
    pub scenario: &'a str,
    pub season: &'a str,
    pub aggregation: &'a str,
}

impl<'a> SeriesQuery<'a> {
    pub fn new(country: &'a str, region: &'a str, variable: &'a str, scenario: &'a str) -> Self {
        SeriesQuery {
            country,
            region,
            variable,
            scenario,
            season: DEFAULT_SEASON,
            aggregation: DEFAULT_AGGREGATION,
        }
    }
}

pub trait TimeSeriesProvider {
    async fn timeseries(&self, query: &SeriesQuery<'_>) -> LocateResult<ProjectionSeries>;
}

pub trait ShapeProvider {
    async fn shape_codes(&self, country: &str) -> LocateResult<Vec<String>>;
}

/// Client for the Climate Impact Explorer time-series and shape endpoints.
pub struct CieClient {
    client: Client,
    timeseries_url: Url,
    shapes_url: Url,
}

impl CieClient {
    pub async fn new(client: Client) -> Result<Self> {
        let base = get_cie_base_url().await?;
        Self::with_base(client, &base)
    }

    pub fn with_base(client: Client, base: &Url) -> Result<Self> {
        Ok(CieClient {
            client,
            timeseries_url: base.join("timeseries/")?,
            shapes_url: base.join("shapes/")?,
        })
    }
}

impl TimeSeriesProvider for CieClient {
    async fn timeseries(&self, query: &SeriesQuery<'_>) -> LocateResult<ProjectionSeries> {
        let region = region_param(query.region);
        let json: Value = self
            .client
            .get(self.timeseries_url.clone())
            .query(&[
                ("iso", query.country),
                ("region", region.as_str()),
                ("scenario", query.scenario),
                ("var", query.variable),
                ("season", query.season),
                ("aggregation_spatial", query.aggregation),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let series = parse_timeseries(json);
        tracing::debug!("CIE: parsed {} rows for '{}'", series.len(), region);
        Ok(series)
    }
}

impl ShapeProvider for CieClient {
    async fn shape_codes(&self, country: &str) -> LocateResult<Vec<String>> {
        if country.is_empty() {
            return Ok(Vec::new());
        }

        let json: Value = self
            .client
            .get(self.shapes_url.clone())
            .query(&[("iso", country)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_shape_codes(json))
    }
}

/// The provider spells regions with dots and upper case; empty means no filter.
pub fn region_param(region: &str) -> String {
    region.trim().replace('-', ".").to_uppercase()
}

enum TimeseriesResponse {
    Columnar(Map<String, Value>),
    Records(Vec<Value>),
    Unrecognized,
}

impl TimeseriesResponse {
    fn classify(json: Value) -> Self {
        let Value::Object(mut object) = json else {
            return TimeseriesResponse::Unrecognized;
        };

        let has_columns = ["year", "lower", "median", "upper"]
            .iter()
            .any(|key| matches!(object.get(*key), Some(Value::Array(values)) if !values.is_empty()));
        if has_columns {
            return TimeseriesResponse::Columnar(object);
        }

        match object.remove("data") {
            Some(Value::Array(records)) => TimeseriesResponse::Records(records),
            _ => TimeseriesResponse::Unrecognized,
        }
    }
}

pub fn parse_timeseries(json: Value) -> ProjectionSeries {
    match TimeseriesResponse::classify(json) {
        TimeseriesResponse::Columnar(object) => parse_columnar(&object),
        TimeseriesResponse::Records(records) => parse_records(&records),
        TimeseriesResponse::Unrecognized => {
            tracing::warn!("CIE: unexpected JSON shape, treating as empty");
            ProjectionSeries::default()
        }
    }
}

// Columns may be ragged; short ones are padded with missing values.
fn parse_columnar(object: &Map<String, Value>) -> ProjectionSeries {
    let column = |key: &str| -> Vec<Option<f64>> {
        match object.get(key) {
            Some(Value::Array(values)) => values.iter().map(to_float).collect(),
            _ => Vec::new(),
        }
    };
    let (year, lower, median, upper) = (column("year"), column("lower"), column("median"), column("upper"));
    let rows = year.len().max(lower.len()).max(median.len()).max(upper.len());
    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    ProjectionSeries::from_rows((0..rows).map(|i| SeriesRow {
        year: at(&year, i),
        lower: at(&lower, i),
        median: at(&median, i),
        upper: at(&upper, i),
    }))
}

fn parse_records(records: &[Value]) -> ProjectionSeries {
    ProjectionSeries::from_rows(records.iter().filter_map(Value::as_object).map(|record| {
        let year = record.get("year").or_else(|| record.get("time"));
        SeriesRow {
            year: year.and_then(to_float),
            lower: record.get("lower").and_then(to_float),
            median: record.get("median").and_then(to_float),
            upper: record.get("upper").and_then(to_float),
        }
    }))
}

fn to_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
