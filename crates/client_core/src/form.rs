//! Registration form state machine.
//!
//! `Idle -> Submitting -> Success | Error`, and back to `Idle` on [`reset`].
//! Every submission carries an attempt id; an outcome whose attempt is no longer
//! current is discarded, so a late reply can never overwrite a newer state.
//!
//! [`reset`]: RegistrationFormController::reset

use shared::{
    domain::EventId,
    protocol::{RegisterRequest, RegistrationReceipt},
};
use tracing::{debug, info};

use crate::{messages::form_failure_message, ApiFailure, RegistrationApi};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub college: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Success(RegistrationReceipt),
    Error(String),
}

/// One in-flight submission: what to send and which attempt it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    attempt: u64,
    pub event_id: EventId,
    pub request: RegisterRequest,
}

pub struct RegistrationFormController {
    event_id: EventId,
    fields: FormFields,
    state: FormState,
    attempt: u64,
}

impl RegistrationFormController {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            fields: FormFields::default(),
            state: FormState::Idle,
            attempt: 0,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Error text to show, if the last submission failed.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            FormState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.state == FormState::Submitting
    }

    /// Fields are locked while the receipt is on screen.
    pub fn can_edit(&self) -> bool {
        !matches!(self.state, FormState::Success(_))
    }

    pub fn set_name(&mut self, value: impl Into<String>) -> bool {
        self.edit(|fields| &mut fields.name, value.into())
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> bool {
        self.edit(|fields| &mut fields.email, value.into())
    }

    pub fn set_college(&mut self, value: impl Into<String>) -> bool {
        self.edit(|fields| &mut fields.college, value.into())
    }

    fn edit(&mut self, field: impl FnOnce(&mut FormFields) -> &mut String, value: String) -> bool {
        if !self.can_edit() {
            return false;
        }
        *field(&mut self.fields) = value;
        true
    }

    /// Starts a submission from `Idle` or `Error`. Returns `None` while a submission is
    /// in flight or a receipt is shown.
    pub fn begin_submit(&mut self) -> Option<SubmissionTicket> {
        if matches!(self.state, FormState::Submitting | FormState::Success(_)) {
            debug!(event_id = %self.event_id, "submission ignored in current state");
            return None;
        }
        self.attempt += 1;
        self.state = FormState::Submitting;
        Some(SubmissionTicket {
            attempt: self.attempt,
            event_id: self.event_id.clone(),
            request: RegisterRequest::new(
                self.fields.name.clone(),
                self.fields.email.clone(),
                self.fields.college.clone(),
            ),
        })
    }

    /// Applies the outcome of `ticket`. Returns `false` when the ticket is stale.
    pub fn apply_outcome(
        &mut self,
        ticket: &SubmissionTicket,
        outcome: Result<RegistrationReceipt, ApiFailure>,
    ) -> bool {
        if ticket.attempt != self.attempt || !self.is_submitting() {
            debug!(attempt = ticket.attempt, current = self.attempt, "stale submission outcome");
            return false;
        }
        self.state = match outcome {
            Ok(receipt) => {
                info!(
                    event_id = %self.event_id,
                    registration_id = %receipt.registration_id,
                    "registration confirmed"
                );
                FormState::Success(receipt)
            }
            Err(failure) => {
                info!(event_id = %self.event_id, code = %failure.code(), "registration failed");
                FormState::Error(form_failure_message(&failure))
            }
        };
        true
    }

    /// Returns to `Idle`. Leaving `Success` clears the fields for the next person.
    pub fn reset(&mut self) {
        if matches!(self.state, FormState::Success(_)) {
            self.fields = FormFields::default();
        }
        self.attempt += 1;
        self.state = FormState::Idle;
    }

    pub async fn submit(&mut self, api: &dyn RegistrationApi) -> &FormState {
        if let Some(ticket) = self.begin_submit() {
            let outcome = api.register(&ticket.event_id, &ticket.request).await;
            self.apply_outcome(&ticket, outcome);
        }
        &self.state
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
