use std::sync::Arc;

use futures::future::join_all;
use shared::{
    domain::{EventId, Registrant, Registration},
    error::ErrorCode,
};
use storage::{Admission, AttendeeStore, MemoryStore, Storage};

const CAPACITY: u32 = 10;
const SUBMISSIONS: usize = 60;

fn capacity_and_unique_email(
    email: String,
) -> impl Fn(&[Registration]) -> Result<(), ErrorCode> + Send + Sync {
    move |live: &[Registration]| {
        if live.iter().any(|r| r.email == email) {
            return Err(ErrorCode::AlreadyRegistered);
        }
        if live.len() >= CAPACITY as usize {
            return Err(ErrorCode::EventFull);
        }
        Ok(())
    }
}

async fn race(store: Arc<dyn AttendeeStore>, distinct_emails: bool) -> Vec<Admission> {
    let event = store
        .create_event(&EventId::new("race"), CAPACITY)
        .await
        .expect("event");

    let tasks = (0..SUBMISSIONS).map(|i| {
        let store = Arc::clone(&store);
        let event_id = event.id.clone();
        let email = if distinct_emails {
            format!("user{i}@x.com")
        } else {
            "same@x.com".to_string()
        };
        tokio::spawn(async move {
            let check = capacity_and_unique_email(email.clone());
            store
                .try_admit(
                    &event_id,
                    &check,
                    Registrant {
                        name: "Racer".into(),
                        email,
                        college: "Concurrency U".into(),
                    },
                )
                .await
                .expect("admit")
        })
    });

    let outcomes: Vec<Admission> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    let live = store.get_all(&event.id).await.expect("list");
    assert!(live.len() <= CAPACITY as usize);
    outcomes
}

fn admitted_count(outcomes: &[Admission]) -> usize {
    outcomes
        .iter()
        .filter(|o| matches!(o, Admission::Admitted(_)))
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sqlite_store_never_exceeds_capacity_under_concurrency() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let outcomes = race(Arc::new(storage), true).await;

    assert_eq!(admitted_count(&outcomes), CAPACITY as usize);
    assert!(outcomes
        .iter()
        .filter(|o| !matches!(o, Admission::Admitted(_)))
        .all(|o| *o == Admission::Rejected(ErrorCode::EventFull)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn memory_store_never_exceeds_capacity_under_concurrency() {
    let outcomes = race(Arc::new(MemoryStore::new()), true).await;
    assert_eq!(admitted_count(&outcomes), CAPACITY as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn sqlite_store_admits_one_of_many_identical_emails() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let outcomes = race(Arc::new(storage), false).await;

    assert_eq!(admitted_count(&outcomes), 1);
    assert!(outcomes
        .iter()
        .filter(|o| !matches!(o, Admission::Admitted(_)))
        .all(|o| *o == Admission::Rejected(ErrorCode::AlreadyRegistered)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn memory_store_admits_one_of_many_identical_emails() {
    let outcomes = race(Arc::new(MemoryStore::new()), false).await;
    assert_eq!(admitted_count(&outcomes), 1);
}
