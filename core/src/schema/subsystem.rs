use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One monitored aircraft component, each with its own schema and endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subsystem {
    Engine,
    Hydraulics,
    LandingGear,
}

/// A named numeric input field and the value the console pre-fills for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: f64,
}

const fn field(name: &'static str, default: f64) -> FieldSpec {
    FieldSpec { name, default }
}

/// Fixed per-subsystem input schema. Field order is the order sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schema {
    pub subsystem: Subsystem,
    pub fields: &'static [FieldSpec],
}

const ENGINE_FIELDS: &[FieldSpec] = &[
    field("op_setting_1", 0.0),
    field("op_setting_2", 0.0),
    field("op_setting_3", 100.0),
    field("sensor_11", 47.0),
    field("sensor_4", 1400.0),
    field("sensor_12", 520.0),
];

const HYDRAULICS_FIELDS: &[FieldSpec] = &[
    field("PS6_mean", 10.0),
    field("PS5_mean", 9.5),
    field("CE_mean", 31.0),
    field("TS4_mean", 52.0),
    field("TS2_mean", 47.0),
    field("TS1_mean", 45.0),
    field("CP_mean", 1.8),
    field("TS3_mean", 48.0),
];

const LANDING_GEAR_FIELDS: &[FieldSpec] = &[
    field("load_during_landing", 75.0),
    field("tire_pressure", 32.5),
    field("speed_during_landing", 160.0),
];

impl Subsystem {
    pub const ALL: [Subsystem; 3] = [
        Subsystem::Engine,
        Subsystem::Hydraulics,
        Subsystem::LandingGear,
    ];

    pub fn schema(self) -> Schema {
        let fields = match self {
            Subsystem::Engine => ENGINE_FIELDS,
            Subsystem::Hydraulics => HYDRAULICS_FIELDS,
            Subsystem::LandingGear => LANDING_GEAR_FIELDS,
        };
        Schema {
            subsystem: self,
            fields,
        }
    }

    pub fn required_columns(self) -> impl Iterator<Item = &'static str> {
        self.schema().fields.iter().map(|spec| spec.name)
    }

    /// Path segment used by the prediction service.
    pub fn slug(self) -> &'static str {
        match self {
            Subsystem::Engine => "engine",
            Subsystem::Hydraulics => "hydraulics",
            Subsystem::LandingGear => "landing-gear",
        }
    }

    pub fn single_path(self) -> String {
        format!("/predict/{}", self.slug())
    }

    pub fn batch_path(self) -> String {
        format!("/predict/{}/batch", self.slug())
    }

    pub fn label(self) -> &'static str {
        match self {
            Subsystem::Engine => "Engine",
            Subsystem::Hydraulics => "Hydraulics",
            Subsystem::LandingGear => "Landing Gear",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subsystem::Engine => "engine",
            Subsystem::Hydraulics => "hydraulics",
            Subsystem::LandingGear => "landing gear",
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown subsystem '{0}' (expected engine, hydraulics, or landing-gear)")]
pub struct UnknownSubsystem(pub String);

impl FromStr for Subsystem {
    type Err = UnknownSubsystem;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "engine" => Ok(Subsystem::Engine),
            "hydraulics" | "hyd" => Ok(Subsystem::Hydraulics),
            "landing-gear" | "lg" => Ok(Subsystem::LandingGear),
            _ => Err(UnknownSubsystem(value.to_string())),
        }
    }
}

impl Schema {
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|spec| spec.name == column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_schema_lists_required_columns_in_wire_order() {
        let columns: Vec<_> = Subsystem::Engine.required_columns().collect();
        assert_eq!(
            columns,
            vec![
                "op_setting_1",
                "op_setting_2",
                "op_setting_3",
                "sensor_11",
                "sensor_4",
                "sensor_12"
            ]
        );
        assert_eq!(Subsystem::Hydraulics.schema().len(), 8);
        assert_eq!(Subsystem::LandingGear.schema().len(), 3);
    }

    #[test]
    fn endpoints_use_kebab_case_slug() {
        assert_eq!(Subsystem::LandingGear.single_path(), "/predict/landing-gear");
        assert_eq!(Subsystem::Hydraulics.batch_path(), "/predict/hydraulics/batch");
    }

    #[test]
    fn subsystem_parses_common_spellings() {
        assert_eq!("landing_gear".parse::<Subsystem>().unwrap(), Subsystem::LandingGear);
        assert_eq!("Engine".parse::<Subsystem>().unwrap(), Subsystem::Engine);
        assert!("rotor".parse::<Subsystem>().is_err());
    }
}
