//! nrl2osm: converts aviation obstacles from the national register into
//! OSM or GeoJSON files, one county extract at a time.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nrl_cli::{counties, download, geojson, gml, osm, projection};
use nrl_core::{assemble_obstacles, assemble_power_grid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    Osm,
    Geojson,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Osm => "osm",
            Format::Geojson => "geojson",
        }
    }
}

/// Convert aviation obstacles from the national register.
#[derive(Debug, Parser)]
#[command(name = "nrl2osm", version)]
struct Args {
    /// County number ("00" is all of Norway)
    county: String,

    /// Convert the power network instead of the general obstacles
    #[arg(long)]
    power: bool,

    /// Read a local GML file instead of downloading the county extract
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Osm)]
    format: Format,

    /// Output file; derived from the county name when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nrl_cli=info".parse()?)
                .add_directive("nrl_core=info".parse()?)
                .add_directive("nrl2osm=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let started = Instant::now();

    // The registry is only needed to resolve the county name; a fully
    // specified offline run (--input and --output) skips it.
    let county_name = if args.input.is_none() || args.output.is_none() {
        let counties = counties::load_counties()?;
        let Some(name) = counties.get(&args.county) else {
            bail!("county code '{}' not found", args.county);
        };
        counties::normalized_name(name)
    } else {
        String::new()
    };

    let xml = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            tracing::info!(county = %county_name, "loading county extract");
            download::fetch_dataset(&args.county, &county_name)?
        }
    };

    let raw_features = gml::parse_features(&xml)?;
    tracing::info!(count = raw_features.len(), "decoded features");

    let assembly = if args.power {
        assemble_power_grid(&raw_features)?
    } else {
        assemble_obstacles(&raw_features)?
    };
    for (code, count) in &assembly.report.unknown_types {
        tracing::warn!(%code, count, "type not found in tagging table");
    }

    let features = projection::reproject(assembly.features);

    let output = args.output.clone().unwrap_or_else(|| {
        let prefix = if args.power { "Kraftnett" } else { "Luftfartshinder" };
        PathBuf::from(format!("{}_{}.{}", prefix, county_name, args.format.extension()))
    });

    match args.format {
        Format::Osm => fs::write(&output, osm::to_osm_xml(&features))
            .with_context(|| format!("writing {}", output.display()))?,
        Format::Geojson => fs::write(&output, geojson::to_geojson(&features)?)
            .with_context(|| format!("writing {}", output.display()))?,
    }

    tracing::info!(
        features = features.len(),
        file = %output.display(),
        elapsed = ?started.elapsed(),
        "done"
    );
    Ok(())
}
