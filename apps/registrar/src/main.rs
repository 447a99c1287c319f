use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    messages::{total_label, NO_ATTENDEES},
    AdminPanelController, AdminPrompter, AdminState, DeleteOutcome, FormState,
    HttpRegistrationApi, RegistrationFormController,
};
use shared::domain::{EventId, Registration, RegistrationId};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, default_value = "123")]
    event_id: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        college: String,
    },
    Attendees,
    Remove {
        registration_id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct TerminalPrompter {
    assume_yes: bool,
}

impl AdminPrompter for TerminalPrompter {
    fn confirm_delete(&self, registration: &Registration) -> bool {
        if self.assume_yes {
            return true;
        }
        print!(
            "Remove {} <{}> (registration {})? [y/N] ",
            registration.name, registration.email, registration.registration_id
        );
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_yes(&answer),
            Err(_) => false,
        }
    }

    fn notify_failure(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_attendees(attendees: &[Registration]) {
    println!("{}", total_label(attendees.len()));
    if attendees.is_empty() {
        println!("{NO_ATTENDEES}");
        return;
    }
    for registration in attendees {
        println!(
            "{:>6}  {}  {}  {}",
            registration.registration_id,
            registration.name,
            registration.email,
            registration.college
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let cli = Cli::parse();
    let api = HttpRegistrationApi::new(cli.server_url);
    let event_id = EventId::new(cli.event_id);

    match cli.command {
        Command::Register {
            name,
            email,
            college,
        } => {
            let mut form = RegistrationFormController::new(event_id);
            form.set_name(name);
            form.set_email(email);
            form.set_college(college);
            match form.submit(&api).await {
                FormState::Success(receipt) => {
                    println!(
                        "Registered! registration_id={} status={}",
                        receipt.registration_id,
                        receipt.status.as_str()
                    );
                }
                FormState::Error(message) => bail!("{message}"),
                state => bail!("submission did not complete: {state:?}"),
            }
        }
        Command::Attendees => {
            let mut panel = AdminPanelController::new(event_id);
            match panel.refresh(&api).await {
                AdminState::Ready(attendees) => print_attendees(attendees),
                AdminState::Error(message) => bail!("{message}"),
                AdminState::Loading => bail!("attendee list did not load"),
            }
        }
        Command::Remove {
            registration_id,
            yes,
        } => {
            let mut panel = AdminPanelController::new(event_id.clone());
            if let AdminState::Error(message) = panel.refresh(&api).await {
                bail!("{message}");
            }
            let prompter = TerminalPrompter { assume_yes: yes };
            match panel
                .delete(&api, &prompter, RegistrationId(registration_id))
                .await
            {
                DeleteOutcome::Deleted => {
                    println!("Removed registration {registration_id}.");
                    print_attendees(panel.attendees());
                }
                DeleteOutcome::Declined => println!("Cancelled."),
                DeleteOutcome::Ignored => {
                    bail!("registration {registration_id} is not listed for event {event_id}")
                }
                DeleteOutcome::Failed(_) => bail!("registration {registration_id} was not removed"),
            }
        }
    }

    Ok(())
}
