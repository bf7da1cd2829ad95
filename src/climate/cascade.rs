use crate::locate::normalize::abbreviate;
use crate::locate::resolver::RegionInfo;
use itertools::Itertools;

/// Region codes to try against the time-series provider, most specific
/// first. The last entry is always the empty string (no region filter).
pub fn build_candidates(info: &RegionInfo, shape_codes: &[String]) -> Vec<String> {
    let code = info.code.trim();
    let iso2 = info.country_iso2.trim();
    let abbr = abbreviate(&info.display_name);

    let mut candidates = Vec::new();
    if !code.is_empty() {
        candidates.push(code.to_string());
        if let Some((_, suffix)) = code.split_once('-') {
            candidates.push(suffix.to_string());
            candidates.push(code.replace('-', "."));
        }
    }
    if !iso2.is_empty() && !abbr.is_empty() {
        candidates.push(format!("{}-{}", iso2, abbr));
        candidates.push(format!("{}.{}", iso2, abbr));
    }
    candidates.extend(shape_codes.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()));

    let country = info.country().trim();
    if !country.is_empty() {
        candidates.push(country.to_string());
    }
    if !iso2.is_empty() && iso2 != info.country_iso3.trim() {
        candidates.push(iso2.to_string());
    }
    candidates.push(String::new());

    candidates.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(code: &str, iso2: &str, iso3: &str, name: &str) -> RegionInfo {
        RegionInfo {
            code: code.to_string(),
            country_iso2: iso2.to_string(),
            country_iso3: iso3.to_string(),
            display_name: name.to_string(),
        }
    }

    #[test]
    fn lisboa_cascade_order() {
        let candidates = build_candidates(&info("PT.LI", "PT", "PRT", "Lisboa"), &[]);
        assert_eq!(candidates, vec!["PT.LI", "PT-LI", "PRT", "PT", ""]);

        let regional = candidates.iter().position(|c| c == "PT.LI").unwrap();
        let national = candidates.iter().position(|c| c == "PRT").unwrap();
        assert!(regional < national);
    }

    #[test]
    fn hyphenated_code_gets_dot_variant() {
        let candidates = build_candidates(&info("AT-9", "AT", "AUT", "Wien"), &[]);
        assert_eq!(candidates, vec!["AT-9", "9", "AT.9", "AT-WI", "AT.WI", "AUT", "AT", ""]);
    }

    #[test]
    fn shape_codes_sit_between_abbreviations_and_country() {
        let shapes = vec!["DE.BE".to_string(), "DE.BB".to_string(), "DEU".to_string()];
        let candidates = build_candidates(&info("DE.BE", "DE", "DEU", "Berlin"), &shapes);
        assert_eq!(candidates, vec!["DE.BE", "DE-BE", "DE.BB", "DEU", "DE", ""]);
    }

    #[test]
    fn dotted_code_has_no_bare_suffix() {
        let candidates = build_candidates(&info("PT.LI", "PT", "PRT", "Lisboa"), &[]);
        assert!(!candidates.iter().any(|c| c == "LI"));

        let sent = candidates.iter().map(|c| crate::climate::cie::region_param(c)).collect::<Vec<_>>();
        assert!(sent.iter().all(|region| region.is_empty() || region.starts_with("PT") || region == "PRT"));
    }

    #[test]
    fn bare_country_code_region() {
        let candidates = build_candidates(&info("GEO", "", "GEO", "42"), &[]);
        assert_eq!(candidates, vec!["GEO", ""]);
    }

    #[test]
    fn missing_iso3_falls_back_to_iso2() {
        let candidates = build_candidates(&info("", "PT", "", "Lisboa"), &[]);
        assert_eq!(candidates, vec!["PT-LI", "PT.LI", "PT", ""]);
    }

    #[test]
    fn never_duplicates_and_ends_unfiltered() {
        let shapes = vec!["PT.LI".to_string(), "".to_string(), "PRT".to_string()];
        let candidates = build_candidates(&info("PT.LI", "PT", "PRT", "Lisboa"), &shapes);
        let unique = candidates.iter().unique().count();
        assert_eq!(unique, candidates.len());
        assert_eq!(candidates.last().map(String::as_str), Some(""));
    }
}
