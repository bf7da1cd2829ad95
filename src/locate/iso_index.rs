use crate::error::{LocateError, LocateResult};
use crate::service::var_service::get_iso3166_url;
use crate::util::cache_service::load_once;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::OnceCell;

const SOURCE_NAME: &str = "ISO-3166-2 table";

static ISO_INDEX: OnceCell<IsoIndex> = OnceCell::const_new();

#[derive(Debug, Clone, PartialEq)]
pub struct SubdivisionEntry {
    pub iso_code: String,
    pub primary_name: String,
    pub alternate_names: Vec<String>,
}

#[derive(Deserialize)]
struct IsoPayload {
    #[serde(rename = "3166-2", default)]
    entries: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    translations: Option<Value>,
}

#[derive(Debug, Default)]
pub struct IsoIndex {
    by_country: HashMap<String, Vec<SubdivisionEntry>>,
}

impl IsoIndex {
    pub fn from_json(text: &str) -> LocateResult<Self> {
        let payload: IsoPayload =
            serde_json::from_str(text).map_err(|e| LocateError::unavailable(SOURCE_NAME, e))?;

        let mut by_country: HashMap<String, Vec<SubdivisionEntry>> = HashMap::new();
        for raw in payload.entries {
            let Some(code) = raw.code.map(|c| c.trim().to_uppercase()) else {
                continue;
            };
            let Some((country, local)) = code.split_once('-') else {
                continue;
            };
            if country.len() != 2 || local.is_empty() {
                continue;
            }

            let alternate_names = match raw.translations {
                Some(Value::Object(map)) => map
                    .values()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };

            by_country
                .entry(country.to_string())
                .or_default()
                .push(SubdivisionEntry {
                    iso_code: code.clone(),
                    primary_name: raw.name.unwrap_or_default(),
                    alternate_names,
                });
        }

        Ok(IsoIndex { by_country })
    }

    pub fn entries_for_country(&self, iso2: &str) -> &[SubdivisionEntry] {
        self.by_country
            .get(&iso2.trim().to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn country_count(&self) -> usize {
        self.by_country.len()
    }
}

/// Fetches the global subdivision table once per process.
pub async fn iso_index(client: &Client) -> LocateResult<&'static IsoIndex> {
    load_once(&ISO_INDEX, SOURCE_NAME, || fetch_iso_index(client)).await
}

async fn fetch_iso_index(client: &Client) -> LocateResult<IsoIndex> {
    let url = get_iso3166_url()
        .await
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, e))?;

    tracing::info!("Loading ISO-3166-2 subdivisions from {}", url);
    let text = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, e))?
        .text()
        .await
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, e))?;

    let index = IsoIndex::from_json(&text)?;
    tracing::info!("ISO-3166-2 subdivisions loaded for {} countries", index.country_count());

    Ok(index)
}
