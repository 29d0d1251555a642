//! Everything voyage related for the voyage calculator: the precomputed voyage table, the user's
//! selection and the lookup that ties the two together.
//! Date: 2025-06-12

use crate::*;   // To use everything from the crate

use serde::{Deserialize, Serialize};
use std::{fmt, fs, io, path::Path};

// Constants
//----------------------------------------------------
/// What the dashboard shows in every statistic box when no voyage matches the selection
pub const NOT_AVAILABLE: &str = "NA";

/// Placeholder shown in the port dropdowns before a port is picked
pub const PORT_PLACEHOLDER: &str = "All";

// Structs and Enums
//----------------------------------------------------
/// Navigation method used to plan the route
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Navigation {
    /// Shortest path on the sphere
    #[serde(rename = "GC")]
    GreatCircle,
    /// Constant course, crosses every meridian at the same angle
    #[serde(rename = "RL")]
    RhumbLine,
}

impl Navigation {
    pub const ALL: [Navigation; 2] = [Navigation::GreatCircle, Navigation::RhumbLine];

    /// The short code used by the selectors and the voyage table, "GC" or "RL"
    pub fn code(&self) -> &'static str {
        match self {
            Navigation::GreatCircle => "GC",
            Navigation::RhumbLine => "RL",
        }
    }

    /// Human readable label for the selector
    pub fn label(&self) -> &'static str {
        match self {
            Navigation::GreatCircle => "Great Circle Navigation",
            Navigation::RhumbLine => "Rhumb Line Navigation",
        }
    }

    /// Parses the short code. Anything other than exactly "GC" or "RL" gives None
    pub fn from_code(code: &str) -> Option<Navigation> {
        Navigation::ALL.into_iter().find(|navigation| navigation.code() == code)
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The canal or cape the route transits
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Passage {
    #[serde(rename = "Panama Canal")]
    PanamaCanal,
    #[serde(rename = "Cape Horn")]
    CapeHorn,
}

impl Passage {
    pub const ALL: [Passage; 2] = [Passage::PanamaCanal, Passage::CapeHorn];

    /// Label used both as selector value and in the voyage table
    pub fn label(&self) -> &'static str {
        match self {
            Passage::PanamaCanal => "Panama Canal",
            Passage::CapeHorn => "Cape Horn",
        }
    }

    /// Parses the label, case sensitive
    pub fn from_label(label: &str) -> Option<Passage> {
        Passage::ALL.into_iter().find(|passage| passage.label() == label)
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One precomputed voyage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoyageRecord {
    /// Key into the route geometry
    pub route_id: u32,
    pub passage: Passage,
    pub bunker_port: String,
    pub discharge_port: String,
    pub navigation: Navigation,
    /// Distance in nautical miles
    pub miles: f64,
    /// Speed in knots
    pub speed: f64,
    /// Bunker price in USD per metric ton
    pub bunker_price: f64,
    /// Bunker consumption over the voyage in metric tons
    pub bunker_consumption: f64,
}

impl VoyageRecord {
    /// Voyage distance as a uom length
    pub fn distance(&self) -> uom::si::f64::Length {
        return uom::si::f64::Length::new::<uom::si::length::nautical_mile>(self.miles);
    }

    /// Service speed as a uom velocity
    pub fn service_speed(&self) -> uom::si::f64::Velocity {
        return uom::si::f64::Velocity::new::<uom::si::velocity::knot>(self.speed);
    }

    /// Bunkers burnt over the voyage as a uom mass
    pub fn bunker_mass(&self) -> uom::si::f64::Mass {
        return uom::si::f64::Mass::new::<uom::si::mass::ton>(self.bunker_consumption);
    }

    /// Time at sea when sailing the whole distance at service speed
    pub fn time_at_sea(&self) -> uom::si::f64::Time {
        return self.distance() / self.service_speed();
    }

    /// Total bunker cost in USD
    pub fn bunker_cost(&self) -> f64 {
        return self.bunker_price * self.bunker_consumption;
    }
}

/// The user's choices on the dashboard
/// Navigation and passage are kept as the raw selector strings, a value that is not a known code
/// or label simply matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    /// "GC" or "RL"
    pub navigation: String,
    /// "Panama Canal" or "Cape Horn"
    pub passage: String,
    /// Discharge port, None while the dropdown still shows "All"
    pub destination: Option<String>,
    /// Bunker port, None while the dropdown still shows "All"
    pub bunker: Option<String>,
    /// Show the atmospheric pressure layer on the map
    #[serde(alias = "show_pressure_overlay")]
    pub overlay: bool,
}

impl Default for Selection {
    /// The dashboard opens on rhumb line navigation through the Panama Canal with no ports picked
    fn default() -> Self {
        Selection {
            navigation: Navigation::RhumbLine.code().to_string(),
            passage: Passage::PanamaCanal.label().to_string(),
            destination: None,
            bunker: None,
            overlay: false,
        }
    }
}

impl Selection {
    /// Creates a selection with both ports picked and the pressure layer hidden
    pub fn new(bunker: &str, destination: &str, navigation: &str, passage: &str) -> Selection {
        Selection {
            navigation: navigation.to_string(),
            passage: passage.to_string(),
            destination: Some(destination.to_string()),
            bunker: Some(bunker.to_string()),
            overlay: false,
        }
    }

    /// Same selection with the pressure layer toggled
    pub fn with_overlay(mut self, overlay: bool) -> Selection {
        self.overlay = overlay;
        return self;
    }

    /// Exact, case sensitive comparison of all four selectors against a voyage
    pub fn matches(&self, record: &VoyageRecord) -> bool {
        return self.bunker.as_deref() == Some(record.bunker_port.as_str())
            && self.destination.as_deref() == Some(record.discharge_port.as_str())
            && self.navigation == record.navigation.code()
            && self.passage == record.passage.label();
    }
}

/// The four display strings of the statistic boxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoyageSummary {
    /// Speed in knots with one decimal, e.g. "6.1"
    pub speed: String,
    /// Distance in nautical miles with thousands separators, e.g. "8,531"
    pub miles: String,
    /// Consumption in metric tons with thousands separators, e.g. "1,800"
    pub consumption: String,
    /// Bunker price, e.g. "$425/MT"
    pub price: String,
}

impl VoyageSummary {
    /// "NA" in every box
    pub fn not_available() -> VoyageSummary {
        VoyageSummary {
            speed: NOT_AVAILABLE.to_string(),
            miles: NOT_AVAILABLE.to_string(),
            consumption: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
        }
    }

    /// Formats the lookup result for the statistic boxes
    pub fn from_lookup(record: Option<&VoyageRecord>) -> VoyageSummary {
        match record {
            Some(record) => VoyageSummary {
                speed: format!("{:.1}", record.speed),
                miles: format_thousands(record.miles),
                consumption: format_thousands(record.bunker_consumption),
                price: format!("${}/MT", record.bunker_price),
            },
            None => VoyageSummary::not_available(),
        }
    }

    pub fn is_available(&self) -> bool {
        return self.speed != NOT_AVAILABLE;
    }
}

/// Row layout of the voyage CSV file
#[derive(Debug, Deserialize)]
struct VoyageRow {
    route: u32,
    passage: String,
    bunker: String,
    discharge: String,
    navigation: String,
    miles: f64,
    speed: f64,
    bunker_price: f64,
    bunker_consumption: f64,
}

/// The voyage table, kept in the order it was given
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoyageTable {
    records: Vec<VoyageRecord>,
}

// Implementation of the VoyageTable struct
//----------------------------------------------------
impl VoyageTable {
    pub fn new(records: Vec<VoyageRecord>) -> VoyageTable {
        VoyageTable { records }
    }

    /// The ten voyages of the lecture exercise
    pub fn builtin() -> VoyageTable {
        use Navigation::{GreatCircle as GC, RhumbLine as RL};
        use Passage::{CapeHorn, PanamaCanal};

        let rows: [(u32, Passage, &str, &str, Navigation, f64, f64, f64, f64); 10] = [
            (0, PanamaCanal, "Cristobal", "Kashima", GC, 8531.0, 6.12, 425.0, 638.0),
            (3, PanamaCanal, "Cristobal", "Kashima", RL, 9825.0, 7.0, 425.0, 580.0),
            (9, CapeHorn, "Kashima", "Kashima", RL, 17008.0, 11.6, 375.0, 1525.0),
            (6, CapeHorn, "Kashima", "Kashima", GC, 16482.0, 11.3, 375.0, 1708.0),
            (1, PanamaCanal, "Busan", "Qingdao", GC, 10082.0, 5.83, 390.0, 720.0),
            (2, PanamaCanal, "Cristobal", "Qingdao", GC, 10081.0, 5.85, 425.0, 717.0),
            (4, PanamaCanal, "Busan", "Qingdao", RL, 11121.0, 6.43, 390.0, 648.0),
            (5, PanamaCanal, "Cristobal", "Qingdao", RL, 11120.0, 6.45, 390.0, 645.0),
            (8, CapeHorn, "Busan", "Qingdao", GC, 17079.0, 9.49, 390.0, 1875.0),
            (7, CapeHorn, "Busan", "Qingdao", RL, 18088.0, 10.05, 390.0, 1800.0),
        ];

        let records = rows
            .into_iter()
            .map(|(route_id, passage, bunker_port, discharge_port, navigation, miles, speed, bunker_price, bunker_consumption)| VoyageRecord {
                route_id,
                passage,
                bunker_port: bunker_port.to_string(),
                discharge_port: discharge_port.to_string(),
                navigation,
                miles,
                speed,
                bunker_price,
                bunker_consumption,
            })
            .collect();

        return VoyageTable::new(records);
    }

    /// Reads a voyage table from a semicolon delimited CSV with the header<br>
    /// route;passage;bunker;discharge;navigation;miles;speed;bunker_price;bunker_consumption
    pub fn from_reader<R: io::Read>(reader: R) -> Result<VoyageTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut records: Vec<VoyageRecord> = Vec::new();
        let mut raw = csv::StringRecord::new();
        while csv_reader.read_record(&mut raw)? {
            let line = raw.position().map_or(0, |position| position.line());
            let row: VoyageRow = raw.deserialize(Some(&headers))?;

            // Unknown navigation or passage values would never be selectable, refuse them early
            let navigation = Navigation::from_code(&row.navigation).ok_or_else(|| Error::InvalidRecord {
                line,
                reason: format!("unknown navigation \"{}\"", row.navigation),
            })?;
            let passage = Passage::from_label(&row.passage).ok_or_else(|| Error::InvalidRecord {
                line,
                reason: format!("unknown passage \"{}\"", row.passage),
            })?;
            for (name, value) in [("miles", row.miles), ("speed", row.speed), ("bunker_price", row.bunker_price), ("bunker_consumption", row.bunker_consumption)] {
                if !(value > 0.0) {
                    return Err(Error::InvalidRecord { line, reason: format!("{} must be positive, got {}", name, value) });
                }
            }

            records.push(VoyageRecord {
                route_id: row.route,
                passage,
                bunker_port: row.bunker,
                discharge_port: row.discharge,
                navigation,
                miles: row.miles,
                speed: row.speed,
                bunker_price: row.bunker_price,
                bunker_consumption: row.bunker_consumption,
            });
        }

        log::info!("Loaded {} voyages", records.len());
        return Ok(VoyageTable::new(records));
    }

    /// Reads a voyage table from a CSV file, see [`VoyageTable::from_reader`]
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> Result<VoyageTable> {
        let file = fs::File::open(file_path)?;
        return VoyageTable::from_reader(io::BufReader::new(file));
    }

    pub fn records(&self) -> &[VoyageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Scans the table in order and returns the first voyage matching all four selectors.
    /// None when nothing matches, which the dashboard shows as "NA".
    pub fn lookup(&self, selection: &Selection) -> Option<&VoyageRecord> {
        return self.records.iter().find(|record| selection.matches(record));
    }

    /// Sorted distinct discharge ports for the destination dropdown
    pub fn discharge_ports(&self) -> Vec<String> {
        return sorted_distinct(self.records.iter().map(|record| record.discharge_port.as_str()));
    }

    /// Sorted distinct bunker ports for the bunker dropdown
    pub fn bunker_ports(&self) -> Vec<String> {
        return sorted_distinct(self.records.iter().map(|record| record.bunker_port.as_str()));
    }
}

impl Default for VoyageTable {
    fn default() -> Self {
        VoyageTable::builtin()
    }
}

// Helper functions
//----------------------------------------------------
/// Formats a number with a comma every three digits, e.g. 18088 -> "18,088".
/// Whole numbers are printed without decimals, fractions keep their shortest representation.
pub fn format_thousands(value: f64) -> String {
    let plain = format!("{}", value);
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    // Walk the integer digits and put a comma in front of every group of three
    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    return match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    };
}

/// Sorted, deduplicated copy of the given names
fn sorted_distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut names: Vec<String> = names.map(str::to_string).collect();
    names.sort();
    names.dedup();
    return names;
}
