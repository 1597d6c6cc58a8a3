//! County registry lookup from the Kartverket municipality service.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;

const COUNTY_API: &str = "https://ws.geonorge.no/kommuneinfo/v1/fylker";

#[derive(Debug, Deserialize)]
struct CountyEntry {
    fylkesnummer: String,
    fylkesnavn: String,
}

/// Load county id → name from the registry, plus the synthetic entries for
/// Svalbard and the whole-country extract.
pub fn load_counties() -> Result<HashMap<String, String>> {
    let entries: Vec<CountyEntry> = reqwest::blocking::get(COUNTY_API)
        .context("fetching county registry")?
        .error_for_status()
        .context("county registry request failed")?
        .json()
        .context("decoding county registry")?;

    let mut counties: HashMap<String, String> = entries
        .into_iter()
        .map(|entry| (entry.fylkesnummer, entry.fylkesnavn.trim().to_string()))
        .collect();
    counties.insert("21".to_string(), "Svalbard".to_string());
    counties.insert("00".to_string(), "Norge".to_string());
    Ok(counties)
}

/// County names appear in download URLs and file names with ASCII-safe
/// spelling and underscores.
pub fn normalized_name(name: &str) -> String {
    name.replace('Ø', "O").replace('ø', "o").replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalized_name("Søndre Østfold"), "Sondre_Ostfold");
        assert_eq!(normalized_name("Troms"), "Troms");
        assert_eq!(normalized_name("Møre og Romsdal"), "More_og_Romsdal");
    }
}
