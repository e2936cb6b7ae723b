//! Address-level scoring service
//!
//! Turns an `AddressRequest` (what a data-access layer knows about one
//! address) into typed calculator inputs, scores it and wraps the result in
//! an `AddressReport`.
//!
//! Input assembly:
//! - air: explicit window means, else the mean of hourly samples
//! - traffic: explicit counts, else an estimate from the nearest road, else the
//!   calculator's default estimate
//! - green: a missing park distance is derived from candidate green spaces

use crate::calculator::QevCalculator;
use crate::error::{QevError, ValidationError};
use crate::green::{nearest_green_space, GreenSpaceSite};
use crate::inputs::{AirQualityData, GreenSpaceData, TrafficData};
use crate::report::{AddressReport, NearestGreenSpace, TrafficOrigin};
use crate::result::QevInputs;
use crate::scoring::Preset;
use crate::traffic::{estimate_from_road, RoadClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nearest road as tagged in OpenStreetMap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadInfo {
    /// OSM `highway` tag, e.g. "primary"
    pub highway: String,
    #[serde(default)]
    pub lanes: Option<u32>,
}

/// Everything known about one address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressRequest {
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Window means; takes precedence over `air_samples`
    pub air: AirQualityData,
    pub air_samples: Vec<AirQualityData>,
    pub traffic: TrafficData,
    pub road: Option<RoadInfo>,
    pub green: GreenSpaceData,
    /// Candidate parks used when `green.distance_to_green_space_m` is absent
    pub green_spaces: Vec<GreenSpaceSite>,
}

impl AddressRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(lat) = self.latitude {
            validate_latitude("latitude", lat)?;
        }
        if let Some(lon) = self.longitude {
            validate_longitude("longitude", lon)?;
        }
        for site in &self.green_spaces {
            validate_latitude("green_spaces.latitude", site.latitude)?;
            validate_longitude("green_spaces.longitude", site.longitude)?;
        }
        Ok(())
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

fn validate_latitude(field: &'static str, lat: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::new(
            field,
            lat,
            "must be within [-90, 90] degrees",
        ));
    }
    Ok(())
}

fn validate_longitude(field: &'static str, lon: f64) -> Result<(), ValidationError> {
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(ValidationError::new(
            field,
            lon,
            "must be within [-180, 180] degrees",
        ));
    }
    Ok(())
}

/// Scores address requests with one calculator
#[derive(Debug, Clone)]
pub struct QevService {
    calculator: QevCalculator,
    preset: Preset,
}

impl QevService {
    /// `preset` is recorded in reports as the base regime of the calculator's
    /// configuration
    pub fn new(calculator: QevCalculator, preset: Preset) -> Self {
        QevService { calculator, preset }
    }

    pub fn calculator(&self) -> &QevCalculator {
        &self.calculator
    }

    pub fn score(&self, request: &AddressRequest) -> Result<AddressReport, QevError> {
        self.score_at(request, Utc::now())
    }

    pub fn score_at(
        &self,
        request: &AddressRequest,
        calculated_at: DateTime<Utc>,
    ) -> Result<AddressReport, QevError> {
        log::info!("scoring {}", request.address);
        request.validate()?;

        let air = assemble_air(request);
        let (traffic, traffic_origin) = assemble_traffic(request);
        let (green, nearest) = assemble_green(request);

        let inputs = QevInputs {
            air,
            traffic,
            green,
        };
        let result = self.calculator.calculate_at(&inputs, calculated_at)?;

        log::info!(
            "{}: QeV {:.3} ({}), completeness {:.2}",
            request.address,
            result.qev_score,
            result.category,
            result.data_completeness
        );

        Ok(AddressReport {
            address: request.address.clone(),
            latitude: request.latitude,
            longitude: request.longitude,
            preset: self.preset,
            traffic_origin,
            nearest_green_space: nearest,
            interpretation: result.category.interpretation().to_string(),
            result,
        })
    }
}

impl Default for QevService {
    fn default() -> Self {
        QevService::new(QevCalculator::default(), Preset::default())
    }
}

fn assemble_air(request: &AddressRequest) -> AirQualityData {
    if request.air.is_available() || request.air_samples.is_empty() {
        return request.air;
    }
    log::debug!(
        "averaging {} air samples for {}",
        request.air_samples.len(),
        request.address
    );
    AirQualityData::from_samples(&request.air_samples)
}

fn assemble_traffic(request: &AddressRequest) -> (TrafficData, TrafficOrigin) {
    if request.traffic.is_available() {
        return (request.traffic, TrafficOrigin::Measured);
    }
    match &request.road {
        Some(road) => {
            let class = RoadClass::from_osm(&road.highway);
            let counts = estimate_from_road(class, road.lanes);
            log::debug!(
                "traffic for {} estimated from {} road: {}/{}/{}",
                request.address,
                class.as_str(),
                counts.light,
                counts.utility,
                counts.heavy
            );
            (
                counts.into(),
                TrafficOrigin::RoadEstimate {
                    highway: class.as_str().to_string(),
                    lanes: road.lanes,
                },
            )
        }
        None => (TrafficData::default(), TrafficOrigin::DefaultEstimate),
    }
}

fn assemble_green(request: &AddressRequest) -> (GreenSpaceData, Option<NearestGreenSpace>) {
    let mut green = request.green;
    if green.distance_to_green_space_m.is_some() {
        return (green, None);
    }
    let Some((lat, lon)) = request.coordinates() else {
        return (green, None);
    };
    match nearest_green_space(lat, lon, &request.green_spaces) {
        Some((site, distance_m)) => {
            log::debug!(
                "nearest green space to {}: {} at {:.0} m",
                request.address,
                site.name,
                distance_m
            );
            green.distance_to_green_space_m = Some(distance_m);
            (
                green,
                Some(NearestGreenSpace {
                    name: site.name.clone(),
                    distance_m,
                }),
            )
        }
        None => (green, None),
    }
}
