use geo::Point;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use urlencoding::decode;
use warp::Filter;

mod endpoints;
use endpoints::with_data;

use freight_radar::controller::auto_select;
use freight_radar::controller::KIND_PRIORITY;
use freight_radar::distance;
use freight_radar::hubs::db;
use hub_search::geometry::GeoError;
use hub_search::nearest::nearest_hubs;
use hub_search::search::{search, CityNames, MatchReason, SearchHit};
use hub_search::search_data::{Hub, HubDataset, HubKind};

/// How long the road-routing collaborator gets before the measurement
/// ships with the straight line only
const ROUTING_DEADLINE: Duration = Duration::from_secs(8);

fn lookup<'d>(
    data: &'d HubDataset,
    names: &CityNames,
    query: &str,
    kind: Option<HubKind>,
) -> FESearchResult<'d> {
    let (selected_kind, hits) = match kind {
        Some(kind) => (Some(kind), search(data, query, Some(kind), names)),
        None => {
            let per_kind: Vec<(HubKind, Vec<SearchHit<'d>>)> = KIND_PRIORITY
                .iter()
                .map(|&kind| (kind, search(data, query, Some(kind), names)))
                .collect();
            match auto_select(&per_kind) {
                Some(selected) => {
                    let hits = per_kind
                        .into_iter()
                        .find(|(kind, _)| *kind == selected)
                        .map(|(_, hits)| hits)
                        .unwrap_or_default();
                    (Some(selected), hits)
                }
                None => (None, Vec::new()),
            }
        }
    };
    println!(
        "Search for {:?} produced {} hits on the {:?} tab",
        query,
        hits.len(),
        selected_kind
    );
    FESearchResult {
        selected_kind,
        total: hits.len(),
        hits: hits.into_iter().map(FEHub::from).collect(),
    }
}

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct FESearchResult<'s> {
    selected_kind: Option<HubKind>,
    total: usize,
    hits: Vec<FEHub<'s>>,
}

#[derive(Serialize)]
struct FEHub<'s> {
    id: &'s str,
    kind: HubKind,
    code: &'s str,
    icao: Option<&'s str>,
    name: &'s str,
    name_zh: Option<&'s str>,
    city: &'s str,
    country: &'s str,
    lat: f64,
    lng: f64,
    intl: bool,
    reason: MatchReason,
}

impl<'s> FEHub<'s> {
    fn new(hub: &'s Hub, reason: MatchReason) -> FEHub<'s> {
        FEHub {
            id: hub.id.as_str(),
            kind: hub.kind,
            code: &hub.code,
            icao: hub.icao.as_deref(),
            name: &hub.name,
            name_zh: hub.name_zh.as_deref(),
            city: &hub.city,
            country: &hub.country,
            lat: hub.location.y(),
            lng: hub.location.x(),
            intl: hub.is_international,
            reason,
        }
    }
}

impl<'s> From<SearchHit<'s>> for FEHub<'s> {
    fn from(hit: SearchHit<'s>) -> FEHub<'s> {
        FEHub::new(hit.hub, hit.reason)
    }
}

#[derive(Debug, Deserialize)]
struct SearchOptions {
    kind: Option<String>,
}

impl SearchOptions {
    fn kind(&self) -> Option<HubKind> {
        let raw = self.kind.as_deref()?;
        let parsed = parse_kind(raw);
        if parsed.is_none() {
            eprintln!("dir: ignoring unknown kind filter {:?}", raw);
        }
        parsed
    }
}

async fn search_handler(
    query: String,
    options: SearchOptions,
    data: Arc<HubDataset>,
    names: Arc<CityNames>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match decode(&query) {
        Ok(query) => Ok(warp::reply::json(&lookup(
            &data,
            &names,
            &query,
            options.kind(),
        ))),
        Err(err) => {
            eprintln!("dir: failed to decode query={:?}: {:?}", query, err);
            Err(warp::reject::reject())
        }
    }
}

fn search_route(
    data: Arc<HubDataset>,
    names: Arc<CityNames>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("searchHubs" / String)
        .and(warp::query::<SearchOptions>())
        .and(with_data(data))
        .and(with_data(names))
        .and_then(search_handler)
        .with(cors)
}

fn parse_kind(kind: &str) -> Option<HubKind> {
    match kind {
        "airport" => Some(HubKind::Airport),
        "port" => Some(HubKind::Port),
        "warehouse" => Some(HubKind::Warehouse),
        _ => None,
    }
}

/// Popup detail for a single hub addressed by kind and code
async fn hub_handler(
    kind: String,
    code: String,
    data: Arc<HubDataset>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let kind = match parse_kind(&kind) {
        Some(kind) => kind,
        None => return Err(warp::reject::not_found()),
    };
    match decode(&code) {
        Ok(code) => match db::get_hub_by_code(&data, kind, &code) {
            Ok(hub) => Ok(warp::reply::json(&FEHub::new(hub, MatchReason::ExactCode))),
            Err(error) => Err(warp::reject::custom(error)),
        },
        Err(err) => {
            eprintln!("dir: failed to decode code={:?}: {:?}", code, err);
            Err(warp::reject::reject())
        }
    }
}

fn hub_route(
    data: Arc<HubDataset>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("hub" / String / String)
        .and(with_data(data))
        .and_then(hub_handler)
        .with(cors)
}

/// Rejection for coordinates or limits the engine refuses
#[derive(Debug)]
struct BadRequest(GeoError);

impl warp::reject::Reject for BadRequest {}

#[derive(Debug, Deserialize)]
struct NearestOptions {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct FENearestHub<'s> {
    id: &'s str,
    kind: HubKind,
    code: &'s str,
    name: &'s str,
    city: &'s str,
    lat: f64,
    lng: f64,
    km: f64,
}

async fn nearest_handler(
    lat: f64,
    lng: f64,
    options: NearestOptions,
    data: Arc<HubDataset>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = options.limit.unwrap_or(5);
    match nearest_hubs(&data, Point::new(lng, lat), limit) {
        Ok(ranked) => {
            let result: Vec<FENearestHub<'_>> = ranked
                .into_iter()
                .map(|(hub, km)| FENearestHub {
                    id: hub.id.as_str(),
                    kind: hub.kind,
                    code: &hub.code,
                    name: &hub.name,
                    city: &hub.city,
                    lat: hub.location.y(),
                    lng: hub.location.x(),
                    km,
                })
                .collect();
            Ok(warp::reply::json(&result))
        }
        Err(err) => Err(warp::reject::custom(BadRequest(err))),
    }
}

fn nearest_route(
    data: Arc<HubDataset>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("nearestHubs" / f64 / f64)
        .and(warp::query::<NearestOptions>())
        .and(with_data(data))
        .and_then(nearest_handler)
        .with(cors)
}

async fn distance_handler(
    lat1: f64,
    lng1: f64,
    lat2: f64,
    lng2: f64,
) -> Result<impl warp::Reply, warp::Rejection> {
    // no routing collaborator is deployed alongside the webserver, the
    // measurement degrades to the straight line
    let report = distance::measure(
        Point::new(lng1, lat1),
        Point::new(lng2, lat2),
        None,
        ROUTING_DEADLINE,
    )
    .await;
    match report {
        Ok(report) => Ok(warp::reply::json(&report)),
        Err(err) => Err(warp::reject::custom(BadRequest(err))),
    }
}

fn distance_route() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("distance" / f64 / f64 / f64 / f64)
        .and_then(distance_handler)
        .with(cors)
}

fn load_or_cache(source: &db::HubSource, dir: &Path) -> HubDataset {
    match source.load_cache() {
        Ok(Some(data)) => {
            eprintln!("hubs: using cached dataset, {}", data.stats());
            return data;
        }
        Ok(None) => {}
        Err(err) => eprintln!("hubs: ignoring unreadable cache: {}", err),
    }
    let (data, failures) = db::load_data(dir).expect("hub data to load");
    if failures.is_empty() {
        if let Err(err) = source.write_cache(&data) {
            eprintln!("hubs: could not write cache: {}", err);
        }
    } else {
        eprintln!(
            "hubs: not caching a partial dataset, failed: {}",
            failures.join(", ")
        );
    }
    data
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8086".to_owned())
        .parse()
        .unwrap();
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "client/dist".to_owned());
    let data_dir = std::env::var("HUB_DATA_DIR").unwrap_or_else(|_| "data".to_owned());
    let data_dir = Path::new(&data_dir);

    let source = db::HubSource::new(data_dir);
    let data = Arc::new(load_or_cache(&source, data_dir));
    let names = Arc::new(db::load_city_names(data_dir).unwrap_or_else(|err| {
        eprintln!("hubs: continuing without translation table: {}", err);
        CityNames::default()
    }));
    let hub_word_index = Arc::new(db::build_hub_word_index(&data));

    eprintln!("Starting web server on port {}", port);
    warp::serve(
        warp::fs::dir(static_dir)
            .or(search_route(data.clone(), names))
            .or(hub_route(data.clone()))
            .or(nearest_route(data.clone()))
            .or(distance_route())
            .or(endpoints::hub_suggest_route(data.clone(), hub_word_index)),
    )
    .run(([127, 0, 0, 1], port))
    .await;
}
