#![allow(dead_code)]

use formation::{Formation, FormationConfig, PersistedErrors, RequestData};

pub fn page() -> Formation {
    Formation::new(FormationConfig::default(), RequestData::new())
}

pub fn submitted(pairs: &[(&str, &str)]) -> Formation {
    let request = RequestData::new().with_form_pairs(pairs.iter().copied());
    Formation::new(FormationConfig::default(), request)
}

pub fn with_session_errors(json: &str) -> Formation {
    let errors: PersistedErrors = serde_json::from_str(json)
        .unwrap_or_else(|e| panic!("Invalid persisted errors: {json}\nError: {e}"));
    Formation::new(
        FormationConfig::default(),
        RequestData::new().with_errors(errors),
    )
}

/// Returns the attribute values of every `<input>` with the given name.
pub fn inputs_named<'a>(html: &'a str, name: &str) -> Vec<&'a str> {
    let needle = format!("name=\"{name}\"");
    html.split("<input")
        .skip(1)
        .filter_map(|tag| tag.split('>').next())
        .filter(|tag| tag.contains(&needle))
        .collect()
}
