//! In-process attendee store. Used by tests and by deployments that do not need
//! registrations to outlive the process.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{Event, EventId, Registrant, Registration, RegistrationId, RegistrationStatus},
    error::ErrorCode,
};

use crate::{Admission, AdmissionCheck, AttendeeStore};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    events: HashMap<EventId, EventTable>,
    last_registration_id: i64,
}

struct EventTable {
    event: Event,
    registrations: Vec<Registration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl AttendeeStore for MemoryStore {
    async fn health_check(&self) -> Result<()> {
        self.state().map(|_| ())
    }

    async fn create_event(&self, event_id: &EventId, capacity: u32) -> Result<Event> {
        if capacity == 0 {
            bail!("event {event_id} must have a positive capacity");
        }
        let mut state = self.state()?;
        let table = state
            .events
            .entry(event_id.clone())
            .or_insert_with(|| EventTable {
                event: Event {
                    id: event_id.clone(),
                    capacity,
                },
                registrations: Vec::new(),
            });
        Ok(table.event.clone())
    }

    async fn event(&self, event_id: &EventId) -> Result<Option<Event>> {
        Ok(self
            .state()?
            .events
            .get(event_id)
            .map(|table| table.event.clone()))
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state()?
            .events
            .values()
            .map(|table| table.event.clone())
            .collect();
        events.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(events)
    }

    async fn get_all(&self, event_id: &EventId) -> Result<Vec<Registration>> {
        Ok(self
            .state()?
            .events
            .get(event_id)
            .map(|table| table.registrations.clone())
            .unwrap_or_default())
    }

    async fn try_admit(
        &self,
        event_id: &EventId,
        check: &AdmissionCheck<'_>,
        registrant: Registrant,
    ) -> Result<Admission> {
        let mut state = self.state()?;
        let next_id = state.last_registration_id + 1;
        let Some(table) = state.events.get_mut(event_id) else {
            return Ok(Admission::Rejected(ErrorCode::EventNotFound));
        };
        if let Err(code) = check(table.registrations.as_slice()) {
            return Ok(Admission::Rejected(code));
        }

        let registration = Registration {
            registration_id: RegistrationId(next_id),
            event_id: event_id.clone(),
            name: registrant.name,
            email: registrant.email,
            college: registrant.college,
            status: RegistrationStatus::Registered,
            registered_at: Utc::now(),
        };
        table.registrations.push(registration.clone());
        state.last_registration_id = next_id;
        Ok(Admission::Admitted(registration))
    }

    async fn remove(&self, event_id: &EventId, registration_id: RegistrationId) -> Result<bool> {
        let mut state = self.state()?;
        let Some(table) = state.events.get_mut(event_id) else {
            return Ok(false);
        };
        let before = table.registrations.len();
        table
            .registrations
            .retain(|r| r.registration_id != registration_id);
        Ok(table.registrations.len() != before)
    }
}
