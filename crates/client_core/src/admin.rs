use shared::domain::{EventId, Registration, RegistrationId};
use tracing::{debug, info, warn};

use crate::{
    messages::{delete_failure_message, load_failure_message},
    ApiFailure, RegistrationApi,
};

/// Operator interaction needed by the admin panel.
pub trait AdminPrompter {
    fn confirm_delete(&self, registration: &Registration) -> bool;
    fn notify_failure(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminState {
    Loading,
    Ready(Vec<Registration>),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Not `Ready`, or the id is not in the local list.
    Ignored,
    Declined,
    Deleted,
    Failed(String),
}

pub struct AdminPanelController {
    event_id: EventId,
    state: AdminState,
    generation: u64,
}

impl AdminPanelController {
    pub fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            state: AdminState::Loading,
            generation: 0,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn state(&self) -> &AdminState {
        &self.state
    }

    pub fn attendees(&self) -> &[Registration] {
        match &self.state {
            AdminState::Ready(attendees) => attendees,
            _ => &[],
        }
    }

    pub fn total(&self) -> usize {
        self.attendees().len()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = AdminState::Loading;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Applies a list result; only the latest load is honoured.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Registration>, ApiFailure>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "stale attendee load"
            );
            return false;
        }
        self.state = match result {
            Ok(attendees) => {
                info!(event_id = %self.event_id, total = attendees.len(), "attendees loaded");
                AdminState::Ready(attendees)
            }
            Err(failure) => {
                warn!(event_id = %self.event_id, code = %failure.code(), "attendee load failed");
                AdminState::Error(load_failure_message(&failure))
            }
        };
        true
    }

    pub async fn refresh(&mut self, api: &dyn RegistrationApi) -> &AdminState {
        let ticket = self.begin_load();
        let result = api.list_attendees(&self.event_id).await;
        self.apply_load(ticket, result);
        &self.state
    }

    /// Confirms with the operator, deletes on the server and drops the row locally.
    /// A failure keeps the list as it was and is reported through the prompter.
    pub async fn delete(
        &mut self,
        api: &dyn RegistrationApi,
        prompter: &dyn AdminPrompter,
        registration_id: RegistrationId,
    ) -> DeleteOutcome {
        let AdminState::Ready(attendees) = &self.state else {
            return DeleteOutcome::Ignored;
        };
        let Some(registration) = attendees
            .iter()
            .find(|registration| registration.registration_id == registration_id)
        else {
            return DeleteOutcome::Ignored;
        };
        if !prompter.confirm_delete(registration) {
            return DeleteOutcome::Declined;
        }

        match api.delete_attendee(&self.event_id, registration_id).await {
            Ok(()) => {
                if let AdminState::Ready(attendees) = &mut self.state {
                    attendees.retain(|registration| registration.registration_id != registration_id);
                }
                info!(event_id = %self.event_id, %registration_id, "attendee deleted");
                DeleteOutcome::Deleted
            }
            Err(failure) => {
                let message = delete_failure_message(&failure);
                warn!(
                    event_id = %self.event_id,
                    %registration_id,
                    code = %failure.code(),
                    "attendee delete failed"
                );
                prompter.notify_failure(&message);
                DeleteOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
