use crate::prelude::*;
use anyhow::anyhow;
use std::{env::var, time::Duration};
use url::Url;

const ADM0_URL: &str =
    "https://raw.githubusercontent.com/GFDRR/thinkhazardmethods/master/source/download/ADM0_TH.csv";
const ADM1_URL: &str =
    "https://raw.githubusercontent.com/GFDRR/thinkhazardmethods/master/source/download/ADM1_TH.csv";
const ADM2_URL: &str =
    "https://raw.githubusercontent.com/GFDRR/thinkhazardmethods/master/source/download/ADM2_TH.csv";
const REPORT_URL: &str = "http://thinkhazard.org/en/report/";
const ISO3166_2_URL: &str =
    "https://raw.githubusercontent.com/biter777/countries/master/data/iso-codes/data_iso_3166-2.json";
const CIE_BASE_URL: &str = "https://cie-api.climateanalytics.org/api/";
const REQUEST_TIMEOUT_SECS: u64 = 20;

pub struct DirectoryUrls {
    pub countries: Url,
    pub regions: Url,
    pub districts: Url,
}

pub async fn get_directory_urls() -> Result<DirectoryUrls> {
    Ok(DirectoryUrls {
        countries: get_url("THINKHAZARD_ADM0_URL", ADM0_URL)?,
        regions: get_url("THINKHAZARD_ADM1_URL", ADM1_URL)?,
        districts: get_url("THINKHAZARD_ADM2_URL", ADM2_URL)?,
    })
}

pub async fn get_report_url() -> Result<Url> {
    get_base_url("THINKHAZARD_REPORT_URL", REPORT_URL)
}

pub async fn get_iso3166_url() -> Result<Url> {
    get_url("ISO3166_2_URL", ISO3166_2_URL)
}

pub async fn get_cie_base_url() -> Result<Url> {
    get_base_url("CIE_BASE_URL", CIE_BASE_URL)
}

pub async fn get_request_timeout() -> Result<Duration> {
    match var("REQUEST_TIMEOUT_SECS") {
        Ok(secs) => match secs.trim().parse::<u64>() {
            Ok(0) => {
                let err = "REQUEST_TIMEOUT_SECS must be greater than zero";
                tracing::error!(err);
                Err(anyhow!(err))
            }
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => {
                let err = format!("Failed to parse REQUEST_TIMEOUT_SECS to u64: {}", e);
                tracing::error!(err);
                Err(anyhow!(err))
            }
        },
        Err(_) => Ok(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
    }
}

pub async fn get_log_level() -> Result<tracing::Level> {
    match var("LOG_LEVEL") {
        Ok(level) => match level.trim().parse::<tracing::Level>() {
            Ok(level) => Ok(level),
            Err(e) => {
                let err = format!("Failed to parse LOG_LEVEL '{}': {}", level, e);
                Err(anyhow!(err))
            }
        },
        Err(_) => Ok(tracing::Level::INFO),
    }
}

fn get_url(name: &str, default: &str) -> Result<Url> {
    let raw = match var(name) {
        Ok(raw) => match raw.trim().is_empty() {
            true => {
                tracing::info!("{} is empty, using default", name);
                default.to_string()
            }
            false => raw.trim().to_string(),
        },
        Err(_) => default.to_string(),
    };

    match Url::parse(&raw) {
        Ok(url) => Ok(url),
        Err(e) => {
            let err = format!("{} is not a valid URL ({}): {}", name, raw, e);
            tracing::error!(err);
            Err(anyhow!(err))
        }
    }
}

// Base URLs are joined with relative endpoints, which needs a trailing slash.
fn get_base_url(name: &str, default: &str) -> Result<Url> {
    let mut url = get_url(name, default)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
