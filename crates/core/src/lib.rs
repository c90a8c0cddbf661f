pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod validation;

pub use catalog::{CatalogMode, DeterministicFarePricer, FarePricer, FlightCatalog};
pub use domain::booking::{
    BookingConfirmation, BookingRequest, CalendarEvent, HighStakesWarning, RawBookingRequest,
};
pub use domain::flight::{FlightOption, FlightQuery};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use ledger::{BudgetLedger, BudgetRejection, LedgerDecision, LedgerSnapshot};
pub use validation::{
    Departure, Destination, EventDetails, FlightId, PassengerName, Price, TravelDate,
    ValidationError,
};
