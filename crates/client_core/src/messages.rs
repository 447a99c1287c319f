//! User-facing text for registration and admin outcomes.

use shared::error::ErrorCode;

use crate::ApiFailure;

pub const FORM_NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";
pub const ADMIN_NETWORK_ERROR: &str = "Network error. Could not connect to the server.";
pub const ATTENDEE_GONE: &str = "That attendee no longer exists.";
pub const NO_ATTENDEES: &str = "No one has registered for this event yet.";

pub fn submission_message(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::EventNotFound => "The event you are trying to register for could not be found.",
        ErrorCode::EventFull => "Sorry, this event has reached maximum capacity.",
        ErrorCode::AlreadyRegistered => "It looks like you have already registered for this event.",
        ErrorCode::InvalidData => {
            "Please check your information and try again. Invalid data submitted."
        }
        _ => "An unexpected error occurred. Please try again later.",
    }
}

pub fn form_failure_message(failure: &ApiFailure) -> String {
    match failure {
        ApiFailure::Rejected(code) => submission_message(*code).to_string(),
        ApiFailure::Network(_) => FORM_NETWORK_ERROR.to_string(),
    }
}

pub fn load_failure_message(failure: &ApiFailure) -> String {
    match failure {
        ApiFailure::Rejected(code) => format!("Failed to load attendees ({code})."),
        ApiFailure::Network(_) => ADMIN_NETWORK_ERROR.to_string(),
    }
}

pub fn delete_failure_message(failure: &ApiFailure) -> String {
    match failure {
        ApiFailure::Rejected(ErrorCode::NotFound) => ATTENDEE_GONE.to_string(),
        ApiFailure::Rejected(code) => format!("Failed to delete attendee ({code})."),
        ApiFailure::Network(_) => ADMIN_NETWORK_ERROR.to_string(),
    }
}

pub fn total_label(total: usize) -> String {
    format!("Total: {total}")
}
