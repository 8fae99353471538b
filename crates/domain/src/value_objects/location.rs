//! Postal address, coordinates and business location.

use common::{Failure, Outcome, ValueObject, Validator, in_range, required_text};
use serde::{Deserialize, Serialize};

/// A postal address. Every component is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
}

impl Address {
    /// Validates all components and reports every violation at once.
    pub fn create(
        street: &str,
        city: &str,
        state: &str,
        zip_code: &str,
        country: &str,
    ) -> Outcome<Self> {
        let mut validator = Validator::new();
        let street = validator.collect(required_text(street, "Street address", 255));
        let city = validator.collect(required_text(city, "City", 100));
        let state = validator.collect(required_text(state, "State", 100));
        let zip_code = validator.collect(required_text(zip_code, "Zip code", 20));
        let country = validator.collect(required_text(country, "Country", 100));
        validator.finish()?;

        match (street, city, state, zip_code, country) {
            (Some(street), Some(city), Some(state), Some(zip_code), Some(country)) => Ok(Self {
                street,
                city,
                state,
                zip_code,
                country,
            }),
            _ => Err(Failure::validation("Address is incomplete")),
        }
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    pub fn country(&self) -> &str {
        &self.country
    }
}

impl ValueObject for Address {}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {} {}, {}",
            self.street, self.city, self.state, self.zip_code, self.country
        )
    }
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GeoCoordinate {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    pub fn create(latitude: f64, longitude: f64) -> Outcome<Self> {
        let mut validator = Validator::new();
        validator.collect(in_range(latitude, -90.0, 90.0, "Latitude"));
        validator.collect(in_range(longitude, -180.0, 180.0, "Longitude"));
        validator.finish_with(|| Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoCoordinate) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        Self::EARTH_RADIUS_KM * c
    }

    // -0.0 and 0.0 compare equal, so they must hash equal too.
    fn normalized_bits(value: f64) -> u64 {
        if value == 0.0 { 0 } else { value.to_bits() }
    }
}

// Construction rejects NaN, which makes float equality reflexive here.
impl Eq for GeoCoordinate {}

impl std::hash::Hash for GeoCoordinate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Self::normalized_bits(self.latitude).hash(state);
        Self::normalized_bits(self.longitude).hash(state);
    }
}

impl ValueObject for GeoCoordinate {}

/// Where a business operates: an address and, optionally, its coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusinessLocation {
    address: Address,
    coordinates: Option<GeoCoordinate>,
}

impl BusinessLocation {
    pub fn create(address: Address, coordinates: Option<GeoCoordinate>) -> Outcome<Self> {
        Ok(Self {
            address,
            coordinates,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn coordinates(&self) -> Option<GeoCoordinate> {
        self.coordinates
    }

    /// Distance to a point, when this location has coordinates.
    pub fn distance_to(&self, point: &GeoCoordinate) -> Option<f64> {
        self.coordinates.map(|c| c.distance_km(point))
    }
}

impl ValueObject for BusinessLocation {}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutcomeExt;
    use std::collections::HashSet;

    fn toronto_address() -> Address {
        Address::create("123 Main St", "Toronto", "ON", "M5V 2T6", "Canada").unwrap()
    }

    #[test]
    fn test_address_trims_components() {
        let address = Address::create(" 1 Galle Rd ", "Colombo", "Western", "00300", "Sri Lanka")
            .unwrap();
        assert_eq!(address.street(), "1 Galle Rd");
        assert_eq!(address.country(), "Sri Lanka");
    }

    #[test]
    fn test_address_reports_every_missing_component() {
        let outcome = Address::create("", "", "ON", "", "Canada");
        assert_eq!(
            outcome.messages(),
            vec![
                "Street address is required",
                "City is required",
                "Zip code is required"
            ]
        );
    }

    #[test]
    fn test_address_length_limits() {
        let outcome = Address::create("1 St", "C", "S", &"9".repeat(21), "X");
        assert_eq!(outcome.messages(), vec!["Zip code cannot exceed 20 characters"]);
    }

    #[test]
    fn test_coordinate_boundaries() {
        assert!(GeoCoordinate::create(90.0, 180.0).is_ok());
        assert!(GeoCoordinate::create(-90.0, -180.0).is_ok());
        assert!(GeoCoordinate::create(-90.1, 0.0).is_err());
        assert!(GeoCoordinate::create(0.0, 180.5).is_err());
        assert_eq!(GeoCoordinate::create(91.0, 181.0).errors().len(), 2);
    }

    #[test]
    fn test_distance_between_cities() {
        let colombo = GeoCoordinate::create(6.9271, 79.8612).unwrap();
        let kandy = GeoCoordinate::create(7.2906, 80.6337).unwrap();
        let distance = colombo.distance_km(&kandy);
        assert!((90.0..100.0).contains(&distance), "got {distance}");
        assert!(colombo.distance_km(&colombo).abs() < f64::EPSILON);
    }

    #[test]
    fn test_coordinates_hash_by_value() {
        let a = GeoCoordinate::create(0.0, 10.0).unwrap();
        let b = GeoCoordinate::create(-0.0, 10.0).unwrap();
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_location_distance_without_coordinates() {
        let location = BusinessLocation::create(toronto_address(), None).unwrap();
        let point = GeoCoordinate::create(43.65, -79.38).unwrap();
        assert!(location.distance_to(&point).is_none());
    }
}
