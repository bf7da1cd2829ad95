use itertools::Itertools;
use serde_json::{Map, Value};

const CODE_KEYS: [&str; 5] = ["code", "id", "iso", "region", "ISO3166-2"];

enum ShapeResponse {
    Records(Vec<Value>),
    Features(Vec<Value>),
    Unrecognized,
}

impl ShapeResponse {
    fn classify(json: Value) -> Self {
        match json {
            Value::Array(records) => ShapeResponse::Records(records),
            Value::Object(mut object) => match object.remove("features") {
                Some(Value::Array(features)) => ShapeResponse::Features(features),
                _ => ShapeResponse::Unrecognized,
            },
            _ => ShapeResponse::Unrecognized,
        }
    }
}

/// Region codes the provider lists for a country, upper-cased, first
/// occurrence kept.
pub fn parse_shape_codes(json: Value) -> Vec<String> {
    let codes = match ShapeResponse::classify(json) {
        ShapeResponse::Records(records) => records
            .iter()
            .filter_map(Value::as_object)
            .filter_map(region_code)
            .collect::<Vec<String>>(),
        ShapeResponse::Features(features) => features
            .iter()
            .filter_map(|feature| feature.get("properties")?.as_object())
            .filter_map(region_code)
            .collect(),
        ShapeResponse::Unrecognized => {
            tracing::debug!("Shape listing had an unexpected JSON shape");
            Vec::new()
        }
    };

    codes.into_iter().unique().collect()
}

fn region_code(properties: &Map<String, Value>) -> Option<String> {
    CODE_KEYS.iter().find_map(|wanted| {
        properties
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .and_then(|(_, value)| value.as_str())
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_uppercase)
    })
}
