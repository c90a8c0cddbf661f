//! Synthetic flight inventory.
//!
//! Nothing here talks to a real supplier. Flight numbers are derived from a
//! blake3 digest of the destination and a candidate index, and every fare is
//! derived from the flight number alone, so the price quoted by a search is
//! the price charged when that flight is booked.

use serde::{Deserialize, Serialize};

use crate::domain::flight::{FlightOption, FlightQuery};
use crate::validation::FlightId;

pub const DEFAULT_MAX_RESULTS: usize = 3;
pub const FARE_FLOOR: u32 = 300;
pub const FARE_CEILING: u32 = 700;

struct AirlineProfile {
    airline: &'static str,
    prefix: &'static str,
    duration_minutes: u16,
}

const AIRLINES: [AirlineProfile; 5] = [
    AirlineProfile { airline: "Air India", prefix: "AI", duration_minutes: 150 },
    AirlineProfile { airline: "IndiGo", prefix: "6E", duration_minutes: 145 },
    AirlineProfile { airline: "SpiceJet", prefix: "SG", duration_minutes: 155 },
    AirlineProfile { airline: "Vistara", prefix: "UK", duration_minutes: 140 },
    AirlineProfile { airline: "Go First", prefix: "G8", duration_minutes: 160 },
];

const CITY_CODES: [(&str, &str); 6] = [
    ("mumbai", "Mumbai (BOM)"),
    ("delhi", "Delhi (DEL)"),
    ("bangalore", "Bangalore (BLR)"),
    ("chennai", "Chennai (MAA)"),
    ("kolkata", "Kolkata (CCU)"),
    ("hyderabad", "Hyderabad (HYD)"),
];

const DEPARTURE_MINUTES: [u16; 4] = [0, 15, 30, 45];

/// Derives the fare of a flight from its identifier.
pub trait FarePricer: Send + Sync {
    fn fare_for(&self, flight_id: &FlightId) -> u32;
}

/// Maps a flight id onto `FARE_FLOOR..=FARE_CEILING` through blake3, so the
/// same id is always priced the same within and across processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicFarePricer;

impl FarePricer for DeterministicFarePricer {
    fn fare_for(&self, flight_id: &FlightId) -> u32 {
        let normalized = flight_id.as_str().trim().to_ascii_uppercase();
        let span = u64::from(FARE_CEILING - FARE_FLOOR + 1);
        // span is tiny, the remainder always fits in u32
        FARE_FLOOR + (digest_u64(normalized.as_bytes()) % span) as u32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// Identical queries produce identical results.
    #[default]
    Deterministic,
    /// A random salt is mixed into every search so repeated searches differ.
    Varied,
}

pub struct FlightCatalog<P = DeterministicFarePricer> {
    pricer: P,
    max_results: usize,
    mode: CatalogMode,
}

impl Default for FlightCatalog<DeterministicFarePricer> {
    fn default() -> Self {
        Self::new(DeterministicFarePricer, DEFAULT_MAX_RESULTS, CatalogMode::Deterministic)
    }
}

impl<P> FlightCatalog<P>
where
    P: FarePricer,
{
    pub fn new(pricer: P, max_results: usize, mode: CatalogMode) -> Self {
        Self { pricer, max_results, mode }
    }

    pub fn fare_for(&self, flight_id: &FlightId) -> u32 {
        self.pricer.fare_for(flight_id)
    }

    /// Returns at most `max_results` options priced within the query budget,
    /// cheapest first. An empty list is a normal outcome.
    pub fn search(&self, query: &FlightQuery) -> Vec<FlightOption> {
        let salt = match self.mode {
            CatalogMode::Deterministic => 0,
            CatalogMode::Varied => rand::random::<u64>(),
        };
        let destination_key = query.destination.as_str().trim().to_ascii_lowercase();
        let destination = display_city(query.destination.as_str());
        let departure = query.departure.as_ref().map(|departure| display_city(departure.as_str()));

        let mut options = AIRLINES
            .iter()
            .enumerate()
            .filter_map(|(index, profile)| {
                let seed = digest_u64(format!("{destination_key}|{index}|{salt}").as_bytes());
                let flight_number = format!("{}{}", profile.prefix, 100 + seed % 900);
                let price = FlightId::parse(&flight_number)
                    .map(|flight_id| self.pricer.fare_for(&flight_id))
                    .ok()?;
                if !query.max_price.covers(price) {
                    return None;
                }

                let departure_hour = 6 + (seed >> 16) % 15;
                let departure_minute = DEPARTURE_MINUTES[((seed >> 32) % 4) as usize];
                let departure_at = departure_hour as u16 * 60 + departure_minute;

                Some(FlightOption {
                    flight_number,
                    airline: profile.airline.to_string(),
                    departure: departure.clone(),
                    destination: destination.clone(),
                    departure_time: clock(departure_at),
                    arrival_time: clock(departure_at + profile.duration_minutes),
                    price,
                    duration: duration_label(profile.duration_minutes),
                    date: query.date,
                })
            })
            .collect::<Vec<_>>();

        options.sort_by(|left, right| {
            left.price.cmp(&right.price).then_with(|| left.flight_number.cmp(&right.flight_number))
        });
        options.truncate(self.max_results);
        options
    }
}

/// `Mumbai` becomes `Mumbai (BOM)`; unknown cities are shown as given.
pub fn display_city(raw: &str) -> String {
    let key = raw.trim().to_ascii_lowercase();
    CITY_CODES
        .iter()
        .find(|(city, _)| *city == key)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| raw.trim().to_string())
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

fn clock(minutes_since_midnight: u16) -> String {
    let minutes = minutes_since_midnight % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn duration_label(minutes: u16) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
