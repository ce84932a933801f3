use geo::Point;

use hub_search::search_data::Hub;

/// Port to whichever map renderer hosts the markers (Leaflet, MapLibre or
/// the globe). The controller only pushes state at it and never reads map
/// state back.
pub trait MapSurface {
    /// Replace the whole marker set with the given hubs
    fn set_markers(&mut self, hubs: &[&Hub]);

    /// Pan/zoom to a hub and open its popup
    fn focus_on_hub(&mut self, hub: &Hub);

    /// Pan/zoom to an arbitrary coordinate, optionally labelled (searched
    /// addresses get their formatted address as the label)
    fn focus_on_coordinate(&mut self, location: Point<f64>, zoom: u8, label: Option<&str>);

    /// Draw the measurement line between two points
    fn show_distance_line(&mut self, from: Point<f64>, to: Point<f64>);

    fn clear_distance_line(&mut self);
}
