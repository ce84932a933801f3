use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use hub_search::search::CityNames;
use hub_search::search_data::{Hub, HubDataset, HubIdx, HubKind};

use super::{RawAirport, RawCityNames, RawPort, RawWarehouse};
use crate::Suggester;

const AIRPORTS_FILE: &str = "airports.json";
const PORTS_FILE: &str = "ports.json";
const WAREHOUSES_FILE: &str = "warehouses.json";
const CITY_NAMES_FILE: &str = "city-names.json";
const CACHE_FILE: &str = "cache-hubs.bin";

/// Directory of static hub JSON files produced by the upstream data
/// pipeline, plus the binary cache of the parsed dataset
pub struct HubSource {
    dir_path: PathBuf,
}

impl HubSource {
    pub fn new(dir_path: &Path) -> HubSource {
        HubSource {
            dir_path: dir_path.to_owned(),
        }
    }

    fn read_json<R: DeserializeOwned>(&self, filename: &str) -> Result<R, LoadError> {
        let path = self.dir_path.join(filename);
        eprintln!("Opening {}", path.display());
        let file = File::open(&path).map_err(|err| LoadError::Io {
            file: filename.to_owned(),
            source: err,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|err| LoadError::Json {
            file: filename.to_owned(),
            source: err,
        })
    }

    pub fn load_cache(&self) -> Result<Option<HubDataset>, Box<dyn Error>> {
        let path = self.dir_path.join(CACHE_FILE);
        if path.is_file() {
            let file = File::open(path)?;
            let data = rmp_serde::decode::from_read(file)?;
            Ok(Some(data))
        } else {
            Ok(None)
        }
    }

    pub fn write_cache(&self, data: &HubDataset) -> Result<(), Box<dyn Error>> {
        let path = self.dir_path.join(CACHE_FILE);
        let mut file = File::create(path)?;
        rmp_serde::encode::write(&mut file, data)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum LoadError {
    Io {
        file: String,
        source: std::io::Error,
    },
    Json {
        file: String,
        source: serde_json::Error,
    },
    /// Every hub source failed, there is nothing to initialize with
    NoSources,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { file, source } => write!(f, "failed to read {}: {}", file, source),
            LoadError::Json { file, source } => write!(f, "failed to parse {}: {}", file, source),
            LoadError::NoSources => write!(f, "no hub source file could be loaded"),
        }
    }
}

impl Error for LoadError {}

/// Loads every hub source under `dir`, in the fixed order airports, ports,
/// warehouses, so ids and the search tie-break order are reproducible.
/// A source that fails to read or parse is skipped and named in the
/// returned list, loading succeeds with whatever sources remain. Only the
/// loss of all three is an error. Records with invalid coordinates are
/// logged and dropped.
pub fn load_data(dir: &Path) -> Result<(HubDataset, Vec<String>), LoadError> {
    let source = HubSource::new(dir);
    let mut builder = HubDataset::builder();
    let mut failures = Vec::new();
    let mut dropped = 0usize;

    match source.read_json::<Vec<RawAirport>>(AIRPORTS_FILE) {
        Ok(records) => {
            for record in records {
                let added = builder.add_airport(
                    record.code.clone(),
                    record.icao,
                    record.name,
                    record.name_zh,
                    record.city,
                    record.country,
                    geo::Point::new(record.lng, record.lat),
                    record.intl,
                );
                if let Err(err) = added {
                    eprintln!("hubs: dropping airport {}: {}", record.code, err);
                    dropped += 1;
                }
            }
        }
        Err(err) => {
            eprintln!("hubs: {}", err);
            failures.push(AIRPORTS_FILE.to_owned());
        }
    }

    match source.read_json::<Vec<RawPort>>(PORTS_FILE) {
        Ok(records) => {
            for record in records {
                let added = builder.add_port(
                    record.code.clone(),
                    record.name,
                    record.name_zh,
                    record.city,
                    record.country,
                    geo::Point::new(record.lng, record.lat),
                    record.intl,
                );
                if let Err(err) = added {
                    eprintln!("hubs: dropping port {}: {}", record.code, err);
                    dropped += 1;
                }
            }
        }
        Err(err) => {
            eprintln!("hubs: {}", err);
            failures.push(PORTS_FILE.to_owned());
        }
    }

    match source.read_json::<Vec<RawWarehouse>>(WAREHOUSES_FILE) {
        Ok(records) => {
            for record in records {
                let added = builder.add_warehouse(
                    record.code.clone(),
                    record.name,
                    record.name_zh,
                    record.city,
                    record.country,
                    geo::Point::new(record.lng, record.lat),
                    record.category,
                    record.state,
                    record.address,
                );
                if let Err(err) = added {
                    eprintln!("hubs: dropping warehouse {}: {}", record.code, err);
                    dropped += 1;
                }
            }
        }
        Err(err) => {
            eprintln!("hubs: {}", err);
            failures.push(WAREHOUSES_FILE.to_owned());
        }
    }

    if failures.len() == 3 {
        return Err(LoadError::NoSources);
    }
    if dropped > 0 {
        eprintln!("hubs: dropped {} records with invalid coordinates", dropped);
    }
    Ok((builder.build(), failures))
}

/// Reads the translation side-table. Callers degrade a missing or broken
/// table to an empty one, cross-script matching just stops bridging.
pub fn load_city_names(dir: &Path) -> Result<CityNames, LoadError> {
    let raw: RawCityNames = HubSource::new(dir).read_json(CITY_NAMES_FILE)?;
    Ok(CityNames::new(raw.cities, raw.hubs))
}

/// Word index over names and cities for the type-ahead endpoint
pub fn build_hub_word_index(data: &HubDataset) -> Suggester<HubIdx> {
    let mut suggester = Suggester::new();
    for (idx, hub) in data.iter().enumerate() {
        suggester.insert(&hub.name, idx as HubIdx);
        if let Some(name_zh) = &hub.name_zh {
            suggester.insert(name_zh, idx as HubIdx);
        }
        suggester.insert(&hub.city, idx as HubIdx);
    }
    eprintln!("{} words indexed from {} hubs", suggester.num_words(), data.len());
    suggester
}

#[derive(Debug)]
pub enum SearchError {
    HubNotFound(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::HubNotFound(code) => write!(f, "no hub with code {}", code),
        }
    }
}

impl Error for SearchError {}

impl warp::reject::Reject for SearchError {}

pub fn get_hub_by_code<'d>(
    data: &'d HubDataset,
    kind: HubKind,
    code: &str,
) -> Result<&'d Hub, SearchError> {
    data.find_by_code(kind, code)
        .ok_or_else(|| SearchError::HubNotFound(code.to_owned()))
}
