use crate::api::RecordApi;
use crate::auth::IdentityProvider;
use crate::cli::Command;
use crate::dashboard::Dashboard;
use crate::error::{Result, UserdeskError};
use crate::sync::{AssumeYes, RecordSynchronizer};
use crate::ui::{self, render_identity, render_records, render_status, TerminalConfirm};
use colored::*;

/// Run one subcommand against the dashboard.
pub async fn run_command<P, A>(dashboard: &mut Dashboard<P, A>, command: Command) -> Result<()>
where
    P: IdentityProvider,
    A: RecordApi,
{
    match command {
        Command::Shell => ui::shell::run_shell(dashboard).await,
        Command::Login => {
            let identity = dashboard.login().await?;
            print!("{}", render_identity(&identity));
            print_records(dashboard.records());
            Ok(())
        }
        Command::Logout => {
            dashboard.logout().await?;
            print_status(dashboard.records());
            Ok(())
        }
        Command::Whoami => {
            let identity = dashboard
                .session()
                .current_identity()
                .ok_or_else(not_signed_in)?;
            print!("{}", render_identity(&identity));
            Ok(())
        }
        Command::List => {
            require_signed_in(dashboard)?;
            let records = dashboard.records_mut();
            records.list().await?;
            print_records(records);
            Ok(())
        }
        Command::Add { name, email } => {
            require_signed_in(dashboard)?;
            let records = dashboard.records_mut();
            let record = records.create(&name, &email).await?;
            print_status(records);
            print!(
                "{}",
                render_records(std::slice::from_ref(&record), None, ui::terminal_width())
            );
            Ok(())
        }
        Command::Update { id, name, email } => {
            require_signed_in(dashboard)?;
            let records = dashboard.records_mut();
            records.update(&id, &name, &email).await?;
            print_status(records);
            Ok(())
        }
        Command::Delete { id, yes } => {
            require_signed_in(dashboard)?;
            let records = dashboard.records_mut();
            let deleted = if yes {
                records.delete(&id, &AssumeYes).await?
            } else {
                records.delete(&id, &TerminalConfirm).await?
            };
            if deleted {
                print_status(records);
            } else {
                println!("{}", "Nothing deleted.".dimmed());
            }
            Ok(())
        }
    }
}

fn require_signed_in<P, A>(dashboard: &Dashboard<P, A>) -> Result<()>
where
    P: IdentityProvider,
    A: RecordApi,
{
    if dashboard.is_signed_in() {
        Ok(())
    } else {
        Err(not_signed_in())
    }
}

fn not_signed_in() -> UserdeskError {
    UserdeskError::Auth("Not signed in. Run `userdesk login` first.".to_string())
}

fn print_status<P, A>(records: &RecordSynchronizer<P, A>)
where
    P: IdentityProvider,
    A: RecordApi,
{
    if let Some(status) = records.status() {
        println!("{}", render_status(status));
    }
}

fn print_records<P, A>(records: &RecordSynchronizer<P, A>)
where
    P: IdentityProvider,
    A: RecordApi,
{
    print_status(records);
    print!(
        "{}",
        render_records(records.records(), records.editing(), ui::terminal_width())
    );
}
