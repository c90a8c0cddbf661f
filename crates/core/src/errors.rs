use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A tool refused its input midway through an agent run.
    #[error("tool rejected input: {0}")]
    ToolInput(String),
    #[error("orchestrator failure: {0}")]
    Orchestrator(String),
    #[error("orchestrator timed out after {0}s")]
    OrchestratorTimeout(u64),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("unprocessable entity: {message}")]
    UnprocessableEntity { message: String, correlation_id: String },
    #[error("bad gateway: {message}")]
    BadGateway { message: String, correlation_id: String },
    #[error("gateway timeout: {message}")]
    GatewayTimeout { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnprocessableEntity { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::BadGateway { .. } => "The booking agent failed to complete the request.",
            Self::GatewayTimeout { .. } => {
                "The booking agent did not respond in time. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::UnprocessableEntity { message, .. }
            | Self::BadGateway { message, .. }
            | Self::GatewayTimeout { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::UnprocessableEntity { correlation_id, .. }
            | Self::BadGateway { correlation_id, .. }
            | Self::GatewayTimeout { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::UnprocessableEntity { correlation_id: id, .. }
            | InterfaceError::BadGateway { correlation_id: id, .. }
            | InterfaceError::GatewayTimeout { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(error) => {
                Self::UnprocessableEntity { message: error.to_string(), correlation_id }
            }
            ApplicationError::ToolInput(message) => {
                Self::UnprocessableEntity { message, correlation_id }
            }
            ApplicationError::Orchestrator(message) => Self::BadGateway { message, correlation_id },
            timeout @ ApplicationError::OrchestratorTimeout(_) => {
                Self::GatewayTimeout { message: timeout.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::validation::ValidationError;

    #[test]
    fn validation_error_maps_to_unprocessable_entity() {
        let interface =
            ApplicationError::from(DomainError::from(ValidationError::Empty { field: "destination" }))
                .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::UnprocessableEntity {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("destination")
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn orchestrator_failure_maps_to_bad_gateway() {
        let interface =
            ApplicationError::Orchestrator("planner returned garbage".to_owned()).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadGateway { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
        assert_eq!(interface.message(), "planner returned garbage");
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let interface = ApplicationError::OrchestratorTimeout(30).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::GatewayTimeout { .. }));
        assert!(interface.message().contains("30s"));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface =
            ApplicationError::Configuration("missing api key".to_owned()).into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
