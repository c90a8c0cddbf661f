use serde::{Deserialize, Serialize};

use crate::validation::{Departure, Destination, Price, TravelDate};

/// Search criteria for the mock catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlightQuery {
    pub destination: Destination,
    pub max_price: Price,
    pub departure: Option<Departure>,
    pub date: Option<TravelDate>,
}

impl FlightQuery {
    pub fn new(destination: Destination, max_price: Price) -> Self {
        Self { destination, max_price, departure: None, date: None }
    }

    pub fn from_departure(mut self, departure: Departure) -> Self {
        self.departure = Some(departure);
        self
    }

    pub fn on(mut self, date: TravelDate) -> Self {
        self.date = Some(date);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightOption {
    pub flight_number: String,
    pub airline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<String>,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: u32,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<TravelDate>,
}

impl FlightOption {
    /// One-line listing as shown to the planner and to passengers.
    pub fn summary_line(&self, currency: &str) -> String {
        let route = match &self.departure {
            Some(departure) => format!("{departure} -> {}", self.destination),
            None => self.destination.clone(),
        };
        format!(
            "Flight {}: {currency}{} ({}, {route}, departs {} arrives {}, {})",
            self.flight_number,
            self.price,
            self.airline,
            self.departure_time,
            self.arrival_time,
            self.duration
        )
    }
}
