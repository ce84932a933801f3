use geo::Point;
use std::error::Error;
use std::path::Path;
use std::process;
use std::sync::Arc;

use freight_radar::controller::SearchController;
use freight_radar::hubs::db;
use freight_radar::map::MapSurface;
use hub_search::search_data::Hub;

/// Prints the commands a real map renderer would receive
struct TerminalMap;

impl MapSurface for TerminalMap {
    fn set_markers(&mut self, hubs: &[&Hub]) {
        eprintln!("map: set {} markers", hubs.len());
    }

    fn focus_on_hub(&mut self, hub: &Hub) {
        eprintln!("map: focus on {:?}", hub);
    }

    fn focus_on_coordinate(&mut self, location: Point<f64>, zoom: u8, label: Option<&str>) {
        eprintln!(
            "map: focus on ({}, {}) zoom {} {}",
            location.y(),
            location.x(),
            zoom,
            label.unwrap_or("")
        );
    }

    fn show_distance_line(&mut self, from: Point<f64>, to: Point<f64>) {
        eprintln!(
            "map: line ({}, {}) -> ({}, {})",
            from.y(),
            from.x(),
            to.y(),
            to.x()
        );
    }

    fn clear_distance_line(&mut self) {
        eprintln!("map: clear line");
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let data_dir = std::env::var("HUB_DATA_DIR").unwrap_or_else(|_| "data".to_owned());
    let data_dir = Path::new(&data_dir);
    let query = std::env::args().nth(1).unwrap_or_else(|| "PEK".to_owned());

    let (data, failures) = db::load_data(data_dir)?;
    if !failures.is_empty() {
        eprintln!("search: continuing without {}", failures.join(", "));
    }
    let names = db::load_city_names(data_dir).unwrap_or_default();

    let mut controller = SearchController::new(Arc::new(data), names, TerminalMap);
    controller.set_query(&query);

    println!(
        "{} matches for {:?} on the {} tab",
        controller.state().results.len(),
        query,
        controller.state().active_kind
    );
    for (hub, reason) in controller.visible_results() {
        println!("  {:?} {}, {} [{:?}]", hub, hub.city, hub.country, reason);
    }
    if controller.overflow_count() > 0 {
        println!("  ... and {} more", controller.overflow_count());
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error running search: {}", err);
        process::exit(1);
    }
}
