use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_SCENARIO: &str = "h_cpol";
pub const DEFAULT_VARIABLE: &str = "leh";
const DEFAULT_VARIABLES: [&str; 3] = [DEFAULT_VARIABLE, "prAdjust", "tasAdjust"];

pub static VARIABLE_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("leh", "Heatwaves (land fraction exposed)"),
        ("peh", "Heatwaves (population exposed)"),
        ("fldfrc", "River floods (land fraction exposed)"),
        ("flddph", "River floods (max depth)"),
        ("lec", "Crop failure (land fraction exposed)"),
        ("pec", "Crop failure (population exposed)"),
        ("lew", "Wildfires (land fraction exposed)"),
        ("pew", "Wildfires (population exposed)"),
        ("ec1", "Labour productivity loss (heat stress)"),
        ("ec2", "Annual flood damage"),
        ("ec3", "Cyclone damage (annual expected)"),
        ("ec4", "Cyclone damage (1-in-100 year)"),
        ("prAdjust", "Precipitation (mm per day)"),
        ("tasAdjust", "Air temperature (mean)"),
        ("tasmaxAdjust", "Air temperature (daily max)"),
        ("tasminAdjust", "Air temperature (daily min)"),
    ])
});

// Ordered: the first scenario is the default.
pub const SCENARIOS: [(&str, &str); 8] = [
    ("h_cpol", "NGFS current policies"),
    ("o_1p5c", "NGFS net-zero"),
    ("d_delfrag", "NGFS delayed 2°C"),
    ("cat_current", "CAT current policies"),
    ("rcp26", "RCP2.6"),
    ("rcp45", "RCP4.5"),
    ("rcp60", "RCP6.0"),
    ("rcp85", "RCP8.5"),
];

const FLOOD_VARIABLES: &[&str] = &["fldfrc", "flddph", "ec2"];
const HEAT_VARIABLES: &[&str] = &["leh", "peh", "tasmaxAdjust"];
const WILDFIRE_VARIABLES: &[&str] = &["lew", "pew"];
const CYCLONE_VARIABLES: &[&str] = &["ec3", "ec4"];
const WATER_VARIABLES: &[&str] = &["prAdjust"];

static HAZARD_VARIABLES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("river flood", FLOOD_VARIABLES),
        ("urban flood", FLOOD_VARIABLES),
        ("coastal flood", FLOOD_VARIABLES),
        ("extreme heat", HEAT_VARIABLES),
        ("wildfire", WILDFIRE_VARIABLES),
        ("cyclone", CYCLONE_VARIABLES),
        ("water scarcity", WATER_VARIABLES),
    ])
});

pub fn variable_label(variable: &str) -> String {
    match VARIABLE_LABELS.get(variable) {
        Some(label) => label.to_string(),
        None => variable.to_uppercase(),
    }
}

pub fn scenario_label(scenario: &str) -> String {
    match SCENARIOS.iter().find(|(id, _)| *id == scenario) {
        Some((_, label)) => label.to_string(),
        None => scenario.to_uppercase(),
    }
}

pub fn is_known_scenario(scenario: &str) -> bool {
    SCENARIOS.iter().any(|(id, _)| *id == scenario)
}

/// Projection variables that chart a hazard, most relevant first.
pub fn variables_for_hazard(hazard: &str) -> Vec<&'static str> {
    match HAZARD_VARIABLES.get(hazard.trim().to_lowercase().as_str()) {
        Some(variables) => variables.to_vec(),
        None => DEFAULT_VARIABLES.to_vec(),
    }
}
