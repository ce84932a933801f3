use serde::Deserialize;
use std::collections::HashMap;

pub mod db;

/// Raw record of data/airports.json
/// `{"code":"PEK","icao":"ZBAA","name":"Beijing Capital International Airport",
///   "nameZh":"北京首都国际机场","city":"Beijing","country":"CN 中国",
///   "lat":40.0801,"lng":116.5846,"intl":true}`
/// Extra attributes (cargo-throughput scores etc.) are left to the upstream
/// pipeline and ignored here.
#[derive(Debug, Deserialize)]
pub struct RawAirport {
    pub code: String,
    pub icao: Option<String>,
    pub name: String,
    #[serde(rename = "nameZh")]
    pub name_zh: Option<String>,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub intl: bool,
}

/// Raw record of data/ports.json, `code` is the UN/LOCODE
#[derive(Debug, Deserialize)]
pub struct RawPort {
    pub code: String,
    pub name: String,
    #[serde(rename = "nameZh")]
    pub name_zh: Option<String>,
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub intl: bool,
}

/// Raw record of data/warehouses.json
#[derive(Debug, Deserialize)]
pub struct RawWarehouse {
    pub code: String,
    pub name: String,
    #[serde(rename = "nameZh")]
    pub name_zh: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub address: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub category: hub_search::search_data::WarehouseCategory,
}

/// Raw shape of data/city-names.json, the translation side-table:
/// English city keys and hub codes to localized display names
#[derive(Debug, Default, Deserialize)]
pub struct RawCityNames {
    #[serde(default)]
    pub cities: HashMap<String, String>,
    #[serde(default)]
    pub hubs: HashMap<String, String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use hub_search::search_data::WarehouseCategory;

    #[test]
    fn airport_record_parses_with_extras_ignored() {
        let record: RawAirport = serde_json::from_str(
            r#"{"code":"PEK","icao":"ZBAA","name":"Beijing Capital International Airport",
                "nameZh":"北京首都国际机场","city":"Beijing","country":"CN 中国",
                "lat":40.0801,"lng":116.5846,"intl":true,"throughput":2102500}"#,
        )
        .unwrap();
        assert_eq!(record.code, "PEK");
        assert_eq!(record.icao.as_deref(), Some("ZBAA"));
        assert_eq!(record.name_zh.as_deref(), Some("北京首都国际机场"));
        assert!(record.intl);
    }

    #[test]
    fn missing_intl_defaults_to_domestic() {
        let record: RawPort = serde_json::from_str(
            r#"{"code":"CNSHA","name":"Port of Shanghai","city":"Shanghai",
                "country":"CN","lat":31.23,"lng":121.49}"#,
        )
        .unwrap();
        assert!(!record.intl);
        assert!(record.name_zh.is_none());
    }

    #[test]
    fn warehouse_type_field_maps_to_category() {
        let record: RawWarehouse = serde_json::from_str(
            r#"{"code":"ONT8","name":"Amazon ONT8","city":"Moreno Valley","state":"CA",
                "address":"24300 Nandina Ave","country":"US","lat":33.88,"lng":-117.21,
                "type":"retailer-fulfillment"}"#,
        )
        .unwrap();
        assert_eq!(record.category, WarehouseCategory::RetailerFulfillment);
        assert_eq!(record.state.as_deref(), Some("CA"));
    }
}
