//! Dataset download and archive extraction from the Geonorge download
//! service.

use std::io::{Cursor, Read};

use anyhow::{bail, Context, Result};
use tracing::info;

/// Dataset ids used by the download service for the synthetic county codes.
fn dataset_id(county_id: &str) -> &str {
    match county_id {
        "21" => "2100", // Svalbard
        "00" => "0000", // All of Norway
        other => other,
    }
}

/// Download URL for one county extract. The name must already be normalized
/// (see [`crate::counties::normalized_name`]).
fn dataset_url(county_id: &str, county_name: &str) -> String {
    format!(
        "https://nedlasting.geonorge.no/geonorge/Samferdsel/Luftfartshindre/GML/\
         Samferdsel_{}_{}_25833_Luftfartshindre_GML.zip",
        dataset_id(county_id),
        county_name
    )
}

/// Fetch the county's dataset archive and return its GML content.
pub fn fetch_dataset(county_id: &str, county_name: &str) -> Result<String> {
    let url = dataset_url(county_id, county_name);
    info!(%url, "downloading dataset");

    let bytes = reqwest::blocking::get(&url)
        .context("fetching dataset archive")?
        .error_for_status()
        .context("dataset download failed")?
        .bytes()
        .context("reading dataset archive")?;

    extract_first_member(&bytes)
}

/// The archive holds a single GML file; extract whichever member comes first.
fn extract_first_member(bytes: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("opening dataset archive")?;
    if archive.len() == 0 {
        bail!("dataset archive has no members");
    }
    let mut member = archive.by_index(0).context("reading archive member")?;
    let mut xml = String::with_capacity(member.size() as usize);
    member
        .read_to_string(&mut xml)
        .context("decoding archive member")?;
    Ok(xml)
}
