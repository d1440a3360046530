use super::confirm::is_yes;
use super::output::{render_identity, render_status, render_view, terminal_width, View};
use crate::api::RecordApi;
use crate::auth::IdentityProvider;
use crate::dashboard::Dashboard;
use crate::error::{Result, UserdeskError};
use crate::sync::{StatusMessage, DELETE_PROMPT};
use colored::*;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Signed out:
  login                    sign in with the identity provider
  quit                     leave the shell

Signed in:
  list                     fetch all users again
  name <name>              fill the new-user name
  email <email>            fill the new-user email
  add [<name> <email>]     create a user from the form (or from the arguments)
  edit <id>                start editing a user
  set-name <name>          change the name in the edit
  set-email <email>        change the email in the edit
  save | cancel            commit or drop the edit
  delete <id>              delete a user (asks first)
  whoami                   show the signed-in identity
  logout                   sign out and clear the local session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Login,
    Logout,
    WhoAmI,
    List,
    Name(String),
    Email(String),
    Add(Option<(String, String)>),
    Edit(String),
    SetName(String),
    SetEmail(String),
    Save,
    Cancel,
    Delete(String),
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> std::result::Result<ShellCommand, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let required = |usage: &str| -> std::result::Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {}", usage))
        } else {
            Ok(rest.to_string())
        }
    };

    match word.to_lowercase().as_str() {
        "" => Ok(ShellCommand::Empty),
        "login" => Ok(ShellCommand::Login),
        "logout" => Ok(ShellCommand::Logout),
        "whoami" => Ok(ShellCommand::WhoAmI),
        "list" | "refresh" => Ok(ShellCommand::List),
        "name" => Ok(ShellCommand::Name(rest.to_string())),
        "email" => Ok(ShellCommand::Email(rest.to_string())),
        "add" if rest.is_empty() => Ok(ShellCommand::Add(None)),
        "add" => match rest.rsplit_once(char::is_whitespace) {
            Some((name, email)) => Ok(ShellCommand::Add(Some((
                name.trim().to_string(),
                email.trim().to_string(),
            )))),
            None => Err("usage: add [<name> <email>]".to_string()),
        },
        "edit" => required("edit <id>").map(ShellCommand::Edit),
        "set-name" => Ok(ShellCommand::SetName(rest.to_string())),
        "set-email" => Ok(ShellCommand::SetEmail(rest.to_string())),
        "save" => Ok(ShellCommand::Save),
        "cancel" => Ok(ShellCommand::Cancel),
        "delete" | "rm" => required("delete <id>").map(ShellCommand::Delete),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
        other => Err(format!("Unknown command: {} (type `help`)", other)),
    }
}

/// Interactive loop over stdin until `quit` or end of input.
pub async fn run_shell<P, A>(dashboard: &mut Dashboard<P, A>) -> Result<()>
where
    P: IdentityProvider,
    A: RecordApi,
{
    // A failed restore already left its status message.
    let _ = dashboard.restore().await;
    print_screen(dashboard);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt("> ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{}", message.red());
                continue;
            }
        };

        match command {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                println!("{}", HELP);
                continue;
            }
            ShellCommand::WhoAmI => {
                match dashboard.session().current_identity() {
                    Some(identity) => print!("{}", render_identity(&identity)),
                    None => println!("{}", "Not signed in.".yellow()),
                }
                continue;
            }
            ShellCommand::Delete(id) if dashboard.is_signed_in() => {
                prompt(&format!("{} [y/N] ", DELETE_PROMPT))?;
                let answer = lines.next_line().await?.is_some_and(|a| is_yes(&a));
                let _ = dashboard
                    .records_mut()
                    .delete(&id, &|_: &str| answer)
                    .await;
            }
            other => execute(dashboard, other).await,
        }

        print_screen(dashboard);
    }

    Ok(())
}

/// Apply one command. Failures end up in the status line, never here.
pub async fn execute<P, A>(dashboard: &mut Dashboard<P, A>, command: ShellCommand)
where
    P: IdentityProvider,
    A: RecordApi,
{
    let signed_in = dashboard.is_signed_in();

    match command {
        ShellCommand::Login if signed_in => dashboard
            .records_mut()
            .set_status(StatusMessage::info("Already logged in.")),
        ShellCommand::Login => {
            let _ = dashboard.login().await;
        }
        ShellCommand::Empty
        | ShellCommand::Help
        | ShellCommand::Quit
        | ShellCommand::WhoAmI => {}
        _ if !signed_in => dashboard
            .records_mut()
            .set_status(StatusMessage::error("Please log in first.")),
        ShellCommand::Logout => {
            if let Err(e) = dashboard.logout().await {
                dashboard
                    .records_mut()
                    .set_status(StatusMessage::error(format!("Logout failed: {}", e)));
            }
        }
        ShellCommand::List => {
            let _ = dashboard.records_mut().list().await;
        }
        ShellCommand::Name(name) => dashboard.records_mut().set_form_name(name),
        ShellCommand::Email(email) => dashboard.records_mut().set_form_email(email),
        ShellCommand::Add(fields) => {
            let records = dashboard.records_mut();
            if let Some((name, email)) = fields {
                records.set_form_name(name);
                records.set_form_email(email);
            }
            let _ = records.submit_form().await;
        }
        ShellCommand::Edit(id) => {
            let result = dashboard.records_mut().begin_edit(&id);
            report(dashboard, result);
        }
        ShellCommand::SetName(name) => {
            let result = dashboard.records_mut().set_edit_name(name);
            report(dashboard, result);
        }
        ShellCommand::SetEmail(email) => {
            let result = dashboard.records_mut().set_edit_email(email);
            report(dashboard, result);
        }
        ShellCommand::Save => {
            let records = dashboard.records_mut();
            if records.editing().is_none() {
                records.set_status(StatusMessage::error("No user is being edited"));
            } else {
                let _ = records.save_edit().await;
            }
        }
        ShellCommand::Cancel => {
            let records = dashboard.records_mut();
            if records.editing().is_some() {
                records.cancel_edit();
                records.set_status(StatusMessage::info("Edit cancelled."));
            }
        }
        ShellCommand::Delete(_) => {
            // Needs an answer from the operator; run_shell handles it.
        }
    }
}

fn report<P, A>(dashboard: &mut Dashboard<P, A>, result: Result<()>)
where
    P: IdentityProvider,
    A: RecordApi,
{
    if let Err(e) = result {
        let text = match e {
            UserdeskError::Validation(message) => message,
            other => other.to_string(),
        };
        dashboard.records_mut().set_status(StatusMessage::error(text));
    }
}

fn print_screen<P, A>(dashboard: &Dashboard<P, A>)
where
    P: IdentityProvider,
    A: RecordApi,
{
    let records = dashboard.records();

    if !dashboard.is_signed_in() {
        println!("{}", "userdesk".bold());
        if let Some(status) = records.status() {
            println!("{}", render_status(status));
        }
        println!("{}", "Type `login` to sign in, `help` for commands.".dimmed());
        return;
    }

    let identity = dashboard.session().current_identity();
    let view = View {
        identity: identity.as_ref(),
        records: records.records(),
        editing: records.editing(),
        form: records.form(),
        status: records.status(),
        loading: records.is_loading(),
    };
    print!("{}", render_view(&view, terminal_width()));
}

fn prompt(text: &str) -> Result<()> {
    print!("{}", text);
    io::stdout().flush()?;
    Ok(())
}
