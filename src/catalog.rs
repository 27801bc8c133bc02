use serde::Serialize;

use crate::types::TrackingFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "mg/L")]
    MgPerL,
    #[serde(rename = "ppm")]
    Ppm,
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "CSI")]
    Csi,
    #[serde(rename = "°F")]
    Fahrenheit,
    #[serde(rename = "gpm")]
    Gpm,
    #[serde(rename = "psi")]
    Psi,
    #[serde(rename = "%")]
    Percent,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::MgPerL => "mg/L",
            Unit::Ppm => "ppm",
            Unit::Ph => "pH",
            Unit::Csi => "CSI",
            Unit::Fahrenheit => "°F",
            Unit::Gpm => "gpm",
            Unit::Psi => "psi",
            Unit::Percent => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Pressure,
    VolumeFlowRate,
}

/// Pool-level switch that gates an optional measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingFlag {
    Salt,
    Borate,
    CombinedChlorine,
    Csi,
}

impl TrackingFlag {
    pub fn field_name(&self) -> &'static str {
        match self {
            TrackingFlag::Salt => "trackSalt",
            TrackingFlag::Borate => "trackBor",
            TrackingFlag::CombinedChlorine => "trackCC",
            TrackingFlag::Csi => "trackCSI",
        }
    }

    pub fn is_enabled(&self, flags: &TrackingFlags) -> bool {
        match self {
            TrackingFlag::Salt => flags.salt,
            TrackingFlag::Borate => flags.bor,
            TrackingFlag::CombinedChlorine => flags.cc,
            TrackingFlag::Csi => flags.csi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub unit: Unit,
    pub icon: &'static str,
    pub device_class: Option<DeviceClass>,
    pub tracked_by: Option<TrackingFlag>,
    /// Chemistry readings that get an out-of-range problem indicator.
    pub chemistry: bool,
}

const ICON_GAUGE: &str = "mdi:gauge";

const fn chem(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    unit: Unit,
    tracked_by: Option<TrackingFlag>,
) -> MeasurementInfo {
    MeasurementInfo {
        key,
        name,
        description,
        unit,
        icon: ICON_GAUGE,
        device_class: None,
        tracked_by,
        chemistry: true,
    }
}

pub const MEASUREMENTS: &[MeasurementInfo] = &[
    chem("fc", "FC", "Free Chlorine", Unit::MgPerL, None),
    chem("cc", "CC", "Combined Chlorine", Unit::MgPerL, Some(TrackingFlag::CombinedChlorine)),
    chem("cya", "CYA", "Cyanuric Acid", Unit::Ppm, None),
    chem("ch", "CH", "Calcium Hardness", Unit::Ppm, None),
    chem("ph", "pH", "Acidity/Basicity", Unit::Ph, None),
    chem("ta", "TA", "Total Alkalinity", Unit::Ppm, None),
    chem("salt", "Salt", "Salt", Unit::Ppm, Some(TrackingFlag::Salt)),
    chem("bor", "Borate", "Borate", Unit::Ppm, Some(TrackingFlag::Borate)),
    MeasurementInfo {
        key: "tds",
        name: "TDS",
        description: "Total Dissolved Solids",
        unit: Unit::Ppm,
        icon: ICON_GAUGE,
        device_class: None,
        tracked_by: None,
        chemistry: false,
    },
    chem("csi", "CSI", "Calcite Saturation Index", Unit::Csi, Some(TrackingFlag::Csi)),
    MeasurementInfo {
        key: "waterTemp",
        name: "Temp",
        description: "Temperature",
        unit: Unit::Fahrenheit,
        icon: "mdi:coolant-temperature",
        device_class: Some(DeviceClass::Temperature),
        tracked_by: None,
        chemistry: false,
    },
    MeasurementInfo {
        key: "flowRate",
        name: "Flow Rate",
        description: "Flow Rate",
        unit: Unit::Gpm,
        icon: "mdi:water-pump",
        device_class: Some(DeviceClass::VolumeFlowRate),
        tracked_by: None,
        chemistry: false,
    },
    MeasurementInfo {
        key: "pressure",
        name: "Pressure",
        description: "Filter Pressure",
        unit: Unit::Psi,
        icon: ICON_GAUGE,
        device_class: Some(DeviceClass::Pressure),
        tracked_by: None,
        chemistry: false,
    },
    MeasurementInfo {
        key: "swgCellPercent",
        name: "SWG Cell",
        description: "SWG Cell Percentage",
        unit: Unit::Percent,
        icon: "mdi:battery-charging",
        device_class: None,
        tracked_by: None,
        chemistry: false,
    },
];

/// Calculated FC + CC; never read from the payload directly.
pub const TOTAL_CHLORINE: MeasurementInfo = MeasurementInfo {
    key: "tc",
    name: "TC",
    description: "Total Chlorine (FC + CC)",
    unit: Unit::MgPerL,
    icon: ICON_GAUGE,
    device_class: None,
    tracked_by: None,
    chemistry: false,
};

pub fn lookup(key: &str) -> Option<&'static MeasurementInfo> {
    if key == TOTAL_CHLORINE.key {
        return Some(&TOTAL_CHLORINE);
    }
    MEASUREMENTS.iter().find(|m| m.key == key)
}

pub fn tracking_rule(key: &str) -> Option<TrackingFlag> {
    lookup(key).and_then(|m| m.tracked_by)
}
