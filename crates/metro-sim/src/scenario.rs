//! Scenario definitions: map geometry, scripted timeline and starting
//! resources.
//!
//! Scenarios are plain data. They can be built in code (see `test_map`) or
//! loaded from JSON; times are written in milliseconds.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use metro_core::enums::{ElementKind, StationType};
use metro_core::types::{ElementOption, Inventory, Rect};

use crate::error::{ScenarioError, ScenarioResult};

/// A station that appears at a scripted time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationScript {
    #[serde(rename = "at_ms", with = "millis")]
    pub at: Duration,
    pub position: DVec2,
    pub station_type: StationType,
}

/// A scripted offer of resources the player picks one of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementChoiceScript {
    #[serde(rename = "at_ms", with = "millis")]
    pub at: Duration,
    pub options: Vec<ElementOption>,
}

/// Everything needed to start a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub map_width: f64,
    pub map_height: f64,
    #[serde(default)]
    pub water: Vec<Rect>,
    #[serde(default)]
    pub stations: Vec<StationScript>,
    #[serde(default)]
    pub element_choices: Vec<ElementChoiceScript>,
    #[serde(default)]
    pub initial: Inventory,
}

impl ScenarioDefinition {
    /// Parse and validate a JSON scenario.
    pub fn from_json(json: &str) -> ScenarioResult<Self> {
        let scenario: ScenarioDefinition = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check the definition is playable: a non-empty map, stations on dry
    /// land inside it, and offers with at least one non-zero option.
    pub fn validate(&self) -> ScenarioResult<()> {
        if !(self.map_width > 0.0 && self.map_height > 0.0) {
            return Err(self.invalid(format!(
                "map size {}x{} is not positive",
                self.map_width, self.map_height
            )));
        }
        let map = Rect::new(0.0, 0.0, self.map_width, self.map_height);

        if let Some(rect) = self.water.iter().find(|r| r.width < 0.0 || r.height < 0.0) {
            return Err(self.invalid(format!("water region {rect:?} has a negative size")));
        }

        for script in &self.stations {
            if !map.contains(script.position) {
                return Err(self.invalid(format!(
                    "station at {} lies outside the map",
                    script.position
                )));
            }
            if self.water.iter().any(|r| r.contains(script.position)) {
                return Err(self.invalid(format!(
                    "station at {} lies in water",
                    script.position
                )));
            }
        }

        for choice in &self.element_choices {
            if choice.options.is_empty() || choice.options.iter().any(|o| o.weight == 0) {
                return Err(self.invalid(format!(
                    "offer at {:?} needs options with a non-zero weight",
                    choice.at
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> ScenarioError {
        ScenarioError::Invalid {
            name: self.name.clone(),
            reason,
        }
    }
}

/// The built-in 1920x1080 test map: a river of nine water rectangles,
/// thirteen stations over five minutes and six resource offers.
pub fn test_map() -> ScenarioDefinition {
    use ElementKind::*;
    use StationType::*;

    let water = vec![
        Rect::new(0.0, 1010.0, 380.0, 50.0),
        Rect::new(330.0, 780.0, 50.0, 230.0),
        Rect::new(380.0, 780.0, 390.0, 50.0),
        Rect::new(720.0, 450.0, 50.0, 330.0),
        Rect::new(770.0, 450.0, 720.0, 50.0),
        Rect::new(1490.0, 450.0, 50.0, 270.0),
        Rect::new(1540.0, 670.0, 150.0, 50.0),
        Rect::new(1690.0, 450.0, 50.0, 270.0),
        Rect::new(1740.0, 450.0, 180.0, 50.0),
    ];

    let stations = [
        (0, 830.0, 750.0, Circle),
        (0, 560.0, 700.0, Triangle),
        (0, 610.0, 480.0, Square),
        (30, 1300.0, 690.0, Circle),
        (60, 150.0, 530.0, Cross),
        (90, 1620.0, 170.0, Circle),
        (120, 1250.0, 380.0, Triangle),
        (150, 1610.0, 640.0, Cross),
        (180, 980.0, 330.0, Diamond),
        (210, 1030.0, 850.0, Star),
        (240, 350.0, 280.0, Square),
        (270, 930.0, 590.0, Triangle),
        (300, 670.0, 350.0, Diamond),
    ]
    .into_iter()
    .map(|(secs, x, y, station_type)| StationScript {
        at: Duration::from_secs(secs),
        position: DVec2::new(x, y),
        station_type,
    })
    .collect();

    let offers: [(u64, &[(ElementKind, u32)]); 6] = [
        (60, &[(Train, 1)]),
        (120, &[(Line, 1), (StationUpgrade, 1)]),
        (180, &[(PassengerCar, 2), (Line, 1), (Tunnel, 2)]),
        (240, &[(Train, 1), (StationUpgrade, 1)]),
        (300, &[(Line, 1), (PassengerCar, 2), (Tunnel, 2)]),
        (360, &[(StationUpgrade, 1), (Train, 1)]),
    ];
    let element_choices = offers
        .into_iter()
        .map(|(secs, options)| ElementChoiceScript {
            at: Duration::from_secs(secs),
            options: options
                .iter()
                .map(|&(element, weight)| ElementOption { element, weight })
                .collect(),
        })
        .collect();

    ScenarioDefinition {
        name: "test map".into(),
        map_width: 1920.0,
        map_height: 1080.0,
        water,
        stations,
        element_choices,
        initial: Inventory {
            lines: 3,
            trains: 3,
            passenger_cars: 0,
            tunnels: 3,
            station_upgrades: 1,
        },
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_map_is_valid() {
        let map = test_map();
        map.validate().unwrap();
        assert_eq!(map.stations.len(), 13);
        assert_eq!(
            map.stations.iter().filter(|s| s.at == Duration::ZERO).count(),
            3
        );
        assert_eq!(map.element_choices.len(), 6);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "name": "tiny",
            "map_width": 800.0,
            "map_height": 600.0,
            "water": [{"x": 0.0, "y": 500.0, "width": 800.0, "height": 20.0}],
            "stations": [
                {"at_ms": 0, "position": [100.0, 100.0], "station_type": "Circle"},
                {"at_ms": 1500, "position": [300.0, 200.0], "station_type": "Square"}
            ],
            "element_choices": [
                {"at_ms": 60000, "options": [{"element": "Tunnel", "weight": 2}]}
            ],
            "initial": {"lines": 1, "trains": 1, "passenger_cars": 0, "tunnels": 0, "station_upgrades": 0}
        }"#;
        let scenario = ScenarioDefinition::from_json(json).unwrap();
        assert_eq!(scenario.stations[1].at, Duration::from_millis(1500));
        assert_eq!(scenario.element_choices[0].options[0].element, ElementKind::Tunnel);
        assert_eq!(scenario.initial.lines, 1);
    }

    #[test]
    fn test_station_in_water_rejected() {
        let mut scenario = test_map();
        scenario.stations[0].position = DVec2::new(100.0, 1030.0);
        let err = scenario.validate().unwrap_err();
        assert!(matches!(err, ScenarioError::Invalid { .. }));
        assert!(err.to_string().contains("lies in water"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = ScenarioDefinition::from_json("{\"name\": 3}").unwrap_err();
        assert!(matches!(err, ScenarioError::Json(_)));
    }
}
