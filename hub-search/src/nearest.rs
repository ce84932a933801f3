use geo::Point;
use lazysort::SortedBy;
use std::cmp::Ordering;

use crate::geometry::{self, GeoError};
use crate::search_data::{Hub, HubDataset};

/// The `limit` closest hubs to `origin`, ascending by great-circle
/// distance, ties kept in dataset order. Scans the whole dataset, which is
/// cheap at tens of thousands of points. A limit beyond the dataset size
/// returns every hub, a zero limit is a contract violation and an error.
pub fn nearest_hubs<'d>(
    dataset: &'d HubDataset,
    origin: Point<f64>,
    limit: usize,
) -> Result<Vec<(&'d Hub, f64)>, GeoError> {
    if limit == 0 {
        return Err(GeoError::ZeroLimit);
    }
    geometry::validate(origin)?;
    let ranked = dataset
        .iter()
        .enumerate()
        .map(|(idx, hub)| {
            let km = geometry::distance_km(origin, hub.location)
                .expect("dataset coordinates validated at load");
            (idx, hub, km)
        })
        .sorted_by(|a, b| {
            a.2.partial_cmp(&b.2)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        })
        .take(limit)
        .map(|(_idx, hub, km)| (hub, km))
        .collect();
    Ok(ranked)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::search_data::HubDataset;
    use geo::Point;

    /// Hubs due north of the origin at roughly 10, 200 and 50 km
    fn line_of_ports() -> HubDataset {
        let mut builder = HubDataset::builder();
        for (code, lat) in &[("NEAR", 0.09), ("FAR", 1.8), ("MID", 0.45)] {
            builder
                .add_port(
                    (*code).to_owned(),
                    format!("{} Harbour", code),
                    None,
                    "Linetown".to_owned(),
                    "ZZ".to_owned(),
                    Point::new(0.0, *lat),
                    false,
                )
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn closest_first() {
        let data = line_of_ports();
        let ranked = nearest_hubs(&data, Point::new(0.0, 0.0), 2).unwrap();
        let codes: Vec<_> = ranked.iter().map(|(hub, _)| hub.code.as_str()).collect();
        assert_eq!(codes, ["NEAR", "MID"]);
        assert!(ranked[0].1 < ranked[1].1);
        assert!((ranked[0].1 - 10.0).abs() < 0.5);
        assert!((ranked[1].1 - 50.0).abs() < 1.0);
    }

    #[test]
    fn limit_beyond_dataset_returns_all() {
        let data = line_of_ports();
        let ranked = nearest_hubs(&data, Point::new(0.0, 0.0), 50).unwrap();
        assert_eq!(ranked.len(), 3);
        let codes: Vec<_> = ranked.iter().map(|(hub, _)| hub.code.as_str()).collect();
        assert_eq!(codes, ["NEAR", "MID", "FAR"]);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let data = line_of_ports();
        assert_eq!(
            nearest_hubs(&data, Point::new(0.0, 0.0), 0).unwrap_err(),
            GeoError::ZeroLimit
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let data = line_of_ports();
        assert!(nearest_hubs(&data, Point::new(0.0, 99.0), 1).is_err());
    }

    #[test]
    fn equidistant_hubs_keep_dataset_order() {
        let mut builder = HubDataset::builder();
        for code in &["EAST", "WEST"] {
            let lng = if *code == "EAST" { 1.0 } else { -1.0 };
            builder
                .add_port(
                    (*code).to_owned(),
                    format!("{} Harbour", code),
                    None,
                    "Mirrortown".to_owned(),
                    "ZZ".to_owned(),
                    Point::new(lng, 0.0),
                    false,
                )
                .unwrap();
        }
        let data = builder.build();
        let ranked = nearest_hubs(&data, Point::new(0.0, 0.0), 2).unwrap();
        let codes: Vec<_> = ranked.iter().map(|(hub, _)| hub.code.as_str()).collect();
        assert_eq!(codes, ["EAST", "WEST"]);
    }
}
