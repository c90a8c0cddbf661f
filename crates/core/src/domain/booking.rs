use chrono::{DateTime, Utc};
use rand::distributions::{Alphanumeric, Distribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::validation::{
    Departure, Destination, EventDetails, FlightId, PassengerName, Price, TravelDate,
    ValidationError,
};

pub const CALENDAR_REMINDER: &str = "2 hours before";
pub const HIGH_STAKES_NOTICE: &str = "This action will charge your account!";

/// A booking intent whose every field has been validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingRequest {
    pub passenger_name: PassengerName,
    pub max_price: Price,
    pub departure: Departure,
    pub destination: Destination,
    pub travel_date: TravelDate,
}

/// Booking intent as it arrives over the wire, before validation.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawBookingRequest {
    pub passenger_name: Option<String>,
    pub max_price: Option<serde_json::Value>,
    pub departure: Option<String>,
    pub destination: Option<String>,
    pub booking_date: Option<String>,
}

impl RawBookingRequest {
    pub fn validate(&self) -> Result<BookingRequest, ValidationError> {
        let passenger_name = PassengerName::parse(self.passenger_name.as_deref().unwrap_or(""))?;
        let max_price = Price::from_json(self.max_price.as_ref())?;
        let departure = Departure::parse(self.departure.as_deref().unwrap_or(""))?;
        let destination = Destination::parse(self.destination.as_deref().unwrap_or(""))?;
        let travel_date =
            TravelDate::parse_flexible("booking_date", self.booking_date.as_deref().unwrap_or(""))?;

        Ok(BookingRequest { passenger_name, max_price, departure, destination, travel_date })
    }
}

/// Shown before any charge is attempted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighStakesWarning {
    pub flight_id: FlightId,
    pub passenger: PassengerName,
    pub cost: u32,
    pub notice: String,
}

impl HighStakesWarning {
    pub fn new(flight_id: FlightId, passenger: PassengerName, cost: u32) -> Self {
        Self { flight_id, passenger, cost, notice: HIGH_STAKES_NOTICE.to_string() }
    }

    pub fn render(&self, currency: &str) -> String {
        let rule = "=".repeat(60);
        format!(
            "{rule}\nHIGH-STAKES ACTION: BOOKING FLIGHT\n{rule}\nFlight ID: {}\nPassenger: {}\nCost: {currency}{}\n{}\n{rule}",
            self.flight_id, self.passenger, self.cost, self.notice
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub pnr: String,
    pub flight_id: FlightId,
    pub passenger_name: PassengerName,
    pub price: u32,
    pub booked_at: DateTime<Utc>,
}

impl BookingConfirmation {
    pub fn issue(flight_id: FlightId, passenger_name: PassengerName, price: u32) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            booking_id: numbered_token(&mut rng, "BK"),
            pnr: pnr(&mut rng),
            flight_id,
            passenger_name,
            price,
            booked_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub event_id: String,
    pub date: TravelDate,
    pub details: EventDetails,
    pub reminder: String,
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn schedule(date: TravelDate, details: EventDetails) -> Self {
        Self {
            event_id: numbered_token(&mut rand::thread_rng(), "CAL"),
            date,
            details,
            reminder: CALENDAR_REMINDER.to_string(),
            created_at: Utc::now(),
        }
    }
}

fn numbered_token(rng: &mut impl Rng, prefix: &str) -> String {
    format!("{prefix}{:06}", rng.gen_range(0..1_000_000u32))
}

fn pnr(rng: &mut impl Rng) -> String {
    Alphanumeric
        .sample_iter(rng)
        .map(char::from)
        .filter(|ch| !ch.is_ascii_lowercase())
        .take(6)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{BookingConfirmation, CalendarEvent, RawBookingRequest};
    use crate::validation::{EventDetails, FlightId, PassengerName, TravelDate, ValidationError};

    fn raw(value: serde_json::Value) -> RawBookingRequest {
        serde_json::from_value(value).expect("raw request should deserialize")
    }

    #[test]
    fn raw_request_converts_boundary_date_to_canonical_form() {
        let request = raw(json!({
            "passenger_name": "John Doe",
            "max_price": 5000,
            "departure": "Delhi",
            "destination": "Mumbai",
            "booking_date": "25-11-2025"
        }))
        .validate()
        .expect("valid request");

        assert_eq!(request.travel_date.to_string(), "2025-11-25");
        assert_eq!(request.passenger_name.as_str(), "John Doe");
    }

    #[test]
    fn raw_request_reports_the_missing_field() {
        let error = raw(json!({
            "passenger_name": "John Doe",
            "max_price": 5000,
            "destination": "Mumbai",
            "booking_date": "25-11-2025"
        }))
        .validate()
        .expect_err("departure is missing");

        assert_eq!(error.field(), "departure");
    }

    #[test]
    fn raw_request_rejects_non_positive_and_non_numeric_prices() {
        let negative = raw(json!({
            "passenger_name": "John Doe",
            "max_price": -100,
            "departure": "Delhi",
            "destination": "Mumbai",
            "booking_date": "25-11-2025"
        }))
        .validate();
        assert_eq!(negative, Err(ValidationError::NotPositive { field: "max_price" }));

        let words = raw(json!({
            "passenger_name": "John Doe",
            "max_price": ["lots"],
            "departure": "Delhi",
            "destination": "Mumbai",
            "booking_date": "25-11-2025"
        }))
        .validate();
        assert!(matches!(words, Err(ValidationError::NotNumeric { .. })));
    }

    #[test]
    fn issued_tokens_follow_their_formats() {
        let confirmation = BookingConfirmation::issue(
            FlightId::parse("AI101").expect("flight id"),
            PassengerName::parse("Alice").expect("name"),
            450,
        );
        assert!(confirmation.booking_id.starts_with("BK"));
        assert_eq!(confirmation.booking_id.len(), 8);
        assert_eq!(confirmation.pnr.len(), 6);
        assert!(confirmation.pnr.chars().all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit()));

        let event = CalendarEvent::schedule(
            TravelDate::parse_canonical("2025-11-30").expect("date"),
            EventDetails::parse("Flight to Mumbai").expect("details"),
        );
        assert!(event.event_id.starts_with("CAL"));
        assert_eq!(event.event_id.len(), 9);
    }
}
