use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the address type-ahead dropdown, as the places proxy
/// returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
}

/// Resolved place for a previously suggested `place_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug)]
pub enum GeocodeError {
    /// The provider could not be reached or answered with an error
    Unavailable(String),
    /// The provider no longer knows the place id
    UnknownPlace(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::Unavailable(detail) => write!(f, "geocoding unavailable: {}", detail),
            GeocodeError::UnknownPlace(place_id) => write!(f, "unknown place id: {}", place_id),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Address search collaborator (Google Places proxy or Nominatim). Provider
/// failures never reach the user as errors, the controller degrades them to
/// an empty dropdown.
pub trait Geocoder {
    fn suggest<'a>(&'a self, input: &'a str)
        -> BoxFuture<'a, Result<Vec<PlaceSuggestion>, GeocodeError>>;

    fn details<'a>(&'a self, place_id: &'a str)
        -> BoxFuture<'a, Result<PlaceDetails, GeocodeError>>;
}
