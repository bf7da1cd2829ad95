use super::normalize::normalize;
use crate::error::{LocateError, LocateResult};
use crate::service::var_service::get_directory_urls;
use crate::util::cache_service::load_once;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use reqwest::Client;
use std::{collections::HashMap, fmt};
use tokio::sync::OnceCell;
use url::Url;

const SOURCE_NAME: &str = "administrative directory";

static DIRECTORY: OnceCell<AdminDirectory> = OnceCell::const_new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdminLevel {
    District,
    Region,
    Country,
}

impl AdminLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminLevel::District => "ADM2",
            AdminLevel::Region => "ADM1",
            AdminLevel::Country => "ADM0",
        }
    }

    fn code_column(&self) -> &'static str {
        match self {
            AdminLevel::District => "ADM2_CODE",
            AdminLevel::Region => "ADM1_CODE",
            AdminLevel::Country => "ADM0_CODE",
        }
    }

    fn name_column(&self) -> &'static str {
        match self {
            AdminLevel::District => "ADM2_NAME",
            AdminLevel::Region => "ADM1_NAME",
            AdminLevel::Country => "ADM0_NAME",
        }
    }
}

impl fmt::Display for AdminLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminRow {
    pub level: AdminLevel,
    pub code: i64,
    pub name: String,
    /// Parent first-level division, only carried by district rows.
    pub region_name: Option<String>,
    pub country_name: String,
    pub country_iso3: Option<String>,
    pub country_iso2: Option<String>,
}

impl AdminRow {
    /// Most specific non-empty name: district, then region, then country.
    pub fn display_name(&self) -> &str {
        [Some(self.name.as_str()), self.region_name.as_deref(), Some(self.country_name.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or("")
    }

    /// Hazard reports are keyed by the row's own level code.
    pub fn report_id(&self) -> i64 {
        self.code
    }

    pub fn label(&self) -> String {
        let parts = match self.level {
            AdminLevel::Country => vec![self.name.as_str()],
            AdminLevel::Region => vec![self.name.as_str(), self.country_name.as_str()],
            AdminLevel::District => vec![
                self.name.as_str(),
                self.region_name.as_deref().unwrap_or(""),
                self.country_name.as_str(),
            ],
        };
        let parts = parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<&str>>();
        let name = match parts.is_empty() {
            true => "(Unnamed)".to_string(),
            false => parts.join(" • "),
        };

        format!("{} ({}) • ID={}", name, self.level, self.code)
    }
}

/// One administrative level with its rows' normalized names kept alongside.
pub struct LevelTable {
    level: AdminLevel,
    rows: Vec<AdminRow>,
    keys: Vec<String>,
}

impl LevelTable {
    fn new(level: AdminLevel, rows: Vec<AdminRow>) -> Self {
        let keys = rows.par_iter().map(|row| normalize(&row.name)).collect();
        LevelTable { level, rows, keys }
    }

    pub fn level(&self) -> AdminLevel {
        self.level
    }

    pub fn rows(&self) -> &[AdminRow] {
        &self.rows
    }

    pub fn matching(&self, query_norm: &str, exact: bool) -> Vec<AdminRow> {
        self.rows
            .iter()
            .zip(self.keys.iter())
            .filter(|(_, key)| match exact {
                true => key.as_str() == query_norm,
                false => key.contains(query_norm),
            })
            .map(|(row, _)| row.clone())
            .collect()
    }
}

pub struct AdminDirectory {
    pub districts: LevelTable,
    pub regions: LevelTable,
    pub countries: LevelTable,
}

impl AdminDirectory {
    pub fn from_csv(countries: &str, regions: &str, districts: &str) -> LocateResult<Self> {
        Ok(AdminDirectory {
            districts: LevelTable::new(AdminLevel::District, parse_level(districts, AdminLevel::District)?),
            regions: LevelTable::new(AdminLevel::Region, parse_level(regions, AdminLevel::Region)?),
            countries: LevelTable::new(AdminLevel::Country, parse_level(countries, AdminLevel::Country)?),
        })
    }

    pub fn tables(&self) -> (&[AdminRow], &[AdminRow], &[AdminRow]) {
        (self.districts.rows(), self.regions.rows(), self.countries.rows())
    }

    /// Levels in the order matching walks them.
    pub fn levels(&self) -> [&LevelTable; 3] {
        [&self.districts, &self.regions, &self.countries]
    }

    pub fn iso3_by_country_name(&self, name: &str) -> Option<String> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        self.countries
            .rows()
            .iter()
            .find(|row| row.name.trim().to_lowercase() == name)
            .and_then(|row| row.country_iso3.clone())
    }

    pub fn iso2_by_iso3(&self, iso3: &str) -> Option<String> {
        let iso3 = iso3.trim().to_uppercase();
        self.countries
            .rows()
            .iter()
            .find(|row| row.country_iso3.as_deref().map(str::to_uppercase).as_deref() == Some(iso3.as_str()))
            .and_then(|row| row.country_iso2.clone())
    }
}

/// Loads the three level tables on first use; later calls reuse them.
pub async fn admin_directory(client: &Client) -> LocateResult<&'static AdminDirectory> {
    load_once(&DIRECTORY, SOURCE_NAME, || fetch_directory(client)).await
}

async fn fetch_directory(client: &Client) -> LocateResult<AdminDirectory> {
    let urls = get_directory_urls()
        .await
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, e))?;

    tracing::info!("Loading administrative directory tables.");
    let countries = fetch_text(client, &urls.countries).await?;
    let regions = fetch_text(client, &urls.regions).await?;
    let districts = fetch_text(client, &urls.districts).await?;

    let directory = AdminDirectory::from_csv(&countries, &regions, &districts)?;
    let (districts, regions, countries) = directory.tables();
    tracing::info!(
        "Administrative directory loaded: {} districts, {} regions, {} countries",
        districts.len(),
        regions.len(),
        countries.len()
    );

    Ok(directory)
}

async fn fetch_text(client: &Client, url: &Url) -> LocateResult<String> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, format!("{}: {}", url, e)))?;

    response
        .text()
        .await
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, format!("{}: {}", url, e)))
}

fn parse_level(text: &str, level: AdminLevel) -> LocateResult<Vec<AdminRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| LocateError::unavailable(SOURCE_NAME, format!("{} header: {}", level, e)))?;
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    if !columns.contains_key(level.name_column()) || !columns.contains_key(level.code_column()) {
        return Err(LocateError::unavailable(
            SOURCE_NAME,
            format!("{} table lacks {} or {}", level, level.code_column(), level.name_column()),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| LocateError::unavailable(SOURCE_NAME, format!("{} row: {}", level, e)))?;
        let field = |column: &str| -> Option<String> {
            columns
                .get(column)
                .and_then(|&i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(name) = field(level.name_column()) else {
            continue;
        };
        let Some(code) = field(level.code_column()).and_then(|c| parse_code(&c)) else {
            tracing::debug!("Skipping {} row '{}' without a numeric code", level, name);
            continue;
        };

        let country_name = match level {
            AdminLevel::Country => name.clone(),
            _ => field("ADM0_NAME").unwrap_or_default(),
        };
        let region_name = match level {
            AdminLevel::District => field("ADM1_NAME"),
            _ => None,
        };

        rows.push(AdminRow {
            level,
            code,
            name,
            region_name,
            country_name,
            country_iso3: field("ISO3166_a3").map(|c| c.to_uppercase()),
            country_iso2: field("ISO3166_a2").map(|c| c.to_uppercase()),
        });
    }

    Ok(rows)
}

// Codes sometimes arrive float-formatted ("1234.0").
fn parse_code(raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(code) => Some(code),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const ADM0: &str = "ADM0_CODE;ADM0_NAME;ISO3166_a2;ISO3166_a3
198;Portugal;PT;PRT
20;Austria;AT;AUT
93;Germany;DE;DEU
300;Georgia;GE;GEO
";

    pub(crate) const ADM1: &str = "ADM1_CODE;ADM1_NAME;ADM0_CODE;ADM0_NAME
2371;Lisboa;198;Portugal
2368;Évora;198;Portugal
620;Wien;20;Austria
1001;Berlin;93;Germany
1002;Georgia Coast;300;Georgia
";

    pub(crate) const ADM2: &str = "ADM2_CODE;ADM2_NAME;ADM1_CODE;ADM1_NAME;ADM0_CODE;ADM0_NAME
24500;Lisboa;2371;Lisboa;198;Portugal
24501;Amadora;2371;Lisboa;198;Portugal
7001;Wien Stadt;620;Wien;20;Austria
8001;Berlin Mitte;1001;Berlin;93;Germany
";

    pub(crate) fn sample_directory() -> AdminDirectory {
        AdminDirectory::from_csv(ADM0, ADM1, ADM2).unwrap()
    }

    #[test]
    fn parses_all_levels() {
        let directory = sample_directory();
        let (districts, regions, countries) = directory.tables();
        assert_eq!(districts.len(), 4);
        assert_eq!(regions.len(), 5);
        assert_eq!(countries.len(), 4);

        assert_eq!(districts[0].region_name.as_deref(), Some("Lisboa"));
        assert_eq!(districts[0].country_name, "Portugal");
        assert_eq!(countries[0].country_iso3.as_deref(), Some("PRT"));
        assert_eq!(regions[0].country_iso3, None);
    }

    #[test]
    fn country_code_lookups() {
        let directory = sample_directory();
        assert_eq!(directory.iso3_by_country_name("portugal"), Some("PRT".to_string()));
        assert_eq!(directory.iso3_by_country_name("  AUSTRIA "), Some("AUT".to_string()));
        assert_eq!(directory.iso3_by_country_name("Atlantis"), None);
        assert_eq!(directory.iso3_by_country_name(""), None);
        assert_eq!(directory.iso2_by_iso3("prt"), Some("PT".to_string()));
        assert_eq!(directory.iso2_by_iso3("XXX"), None);
    }

    #[test]
    fn missing_name_column_is_unavailable() {
        let err = AdminDirectory::from_csv("ADM0_CODE;NAME\n1;X\n", ADM1, ADM2).err().unwrap();
        assert!(matches!(err, LocateError::DirectoryUnavailable { .. }));
    }

    #[test]
    fn float_codes_and_blank_names() {
        let rows = parse_level(
            "ADM1_CODE;ADM1_NAME;ADM0_NAME\n12.0;Norte;Portugal\n13;;Portugal\nabc;Centro;Portugal\n",
            AdminLevel::Region,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, 12);
    }

    #[test]
    fn labels_and_display_names() {
        let directory = sample_directory();
        let district = &directory.districts.rows()[1];
        assert_eq!(district.label(), "Amadora • Lisboa • Portugal (ADM2) • ID=24501");
        assert_eq!(district.display_name(), "Amadora");
        assert_eq!(district.report_id(), 24501);

        let country = &directory.countries.rows()[1];
        assert_eq!(country.label(), "Austria (ADM0) • ID=20");
    }

    #[tokio::test]
    async fn directory_is_loaded_once() {
        let cell = OnceCell::new();
        let loads = std::sync::atomic::AtomicUsize::new(0);
        let loads = &loads;
        let load = move || async move {
            loads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            AdminDirectory::from_csv(ADM0, ADM1, ADM2)
        };

        let first = load_once(&cell, SOURCE_NAME, load).await.unwrap();
        let second = load_once(&cell, SOURCE_NAME, load).await.unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(second.tables().2.len(), 4);
    }

    #[test]
    fn level_order_is_specific_first() {
        let mut levels = vec![AdminLevel::Country, AdminLevel::District, AdminLevel::Region];
        levels.sort();
        assert_eq!(levels, vec![AdminLevel::District, AdminLevel::Region, AdminLevel::Country]);
    }
}
