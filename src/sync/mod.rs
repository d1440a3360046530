mod confirm;
mod edit;
mod status;

pub use confirm::{AssumeYes, Confirm};
pub use edit::{AddForm, EditBuffer};
pub use status::{StatusKind, StatusMessage};

use crate::api::RecordApi;
use crate::auth::IdentityProvider;
use crate::error::{Result, UserdeskError};
use crate::models::{is_blank, Record, RecordDraft, MISSING_FIELDS_MESSAGE};
use crate::session::SessionManager;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DELETE_PROMPT: &str = "Are you sure you want to delete?";

/// Local, UI-bound copy of the remote record collection.
///
/// Local state only changes after the matching remote call succeeded. A
/// failed call leaves the records as they were and sets an error status.
pub struct RecordSynchronizer<P, A> {
    session: Arc<SessionManager<P>>,
    api: A,
    records: Vec<Record>,
    form: AddForm,
    edit: Option<EditBuffer>,
    status: Option<StatusMessage>,
    loading: bool,
}

impl<P: IdentityProvider, A: RecordApi> RecordSynchronizer<P, A> {
    pub fn new(session: Arc<SessionManager<P>>, api: A) -> Self {
        Self {
            session,
            api,
            records: Vec::new(),
            form: AddForm::default(),
            edit: None,
            status: None,
            loading: false,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn editing(&self) -> Option<&EditBuffer> {
        self.edit.as_ref()
    }

    pub fn form(&self) -> &AddForm {
        &self.form
    }

    pub fn session(&self) -> &SessionManager<P> {
        &self.session
    }

    /// Replace the local records with the remote collection.
    pub async fn list(&mut self) -> Result<()> {
        self.loading = true;
        let result = self.fetch_remote().await;
        self.loading = false;

        match result {
            Ok(records) => {
                debug!(count = records.len(), "fetched users");
                self.records = records;
                Ok(())
            }
            Err(e) => Err(self.fail("Error fetching users.", e)),
        }
    }

    /// Create a record remotely and append the server's copy.
    pub async fn create(&mut self, name: &str, email: &str) -> Result<Record> {
        let draft = self.validate(RecordDraft::new(name, email))?;

        self.loading = true;
        let result = self.create_remote(&draft).await;
        self.loading = false;

        match result {
            Ok(record) => {
                self.records.push(record.clone());
                self.form.clear();
                self.status = Some(StatusMessage::info("User added successfully!"));
                Ok(record)
            }
            Err(e) => Err(self.fail("Error adding user.", e)),
        }
    }

    /// Update a record remotely, then patch it in place and leave edit mode.
    pub async fn update(&mut self, id: &str, name: &str, email: &str) -> Result<()> {
        let draft = if is_blank(id) {
            Err(UserdeskError::Validation(MISSING_FIELDS_MESSAGE.to_string()))
        } else {
            RecordDraft::new(name, email)
        };
        let draft = self.validate(draft)?;

        self.loading = true;
        let result = self.update_remote(id, &draft).await;
        self.loading = false;

        match result {
            Ok(()) => {
                // A record removed meanwhile by someone else stays removed.
                if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
                    record.apply(&draft);
                }
                self.edit = None;
                self.status = Some(StatusMessage::info("User updated successfully!"));
                Ok(())
            }
            Err(e) => Err(self.fail("Error updating user.", e)),
        }
    }

    /// Delete a record after the operator confirms.
    ///
    /// Returns `Ok(false)` when the operator declined; nothing is sent then.
    pub async fn delete(&mut self, id: &str, confirm: &impl Confirm) -> Result<bool> {
        if is_blank(id) || !confirm.confirm(DELETE_PROMPT) {
            return Ok(false);
        }

        self.loading = true;
        let result = self.delete_remote(id).await;
        self.loading = false;

        match result {
            Ok(()) => {
                self.records.retain(|r| r.id != id);
                if self.edit.as_ref().is_some_and(|e| e.editing_id == id) {
                    self.edit = None;
                }
                self.status = Some(StatusMessage::info("User deleted successfully!"));
                Ok(true)
            }
            Err(e) => Err(self.fail("Error deleting user.", e)),
        }
    }

    /// Put one record into edit mode, seeding the buffer with its values.
    /// Any other edit in progress is discarded.
    pub fn begin_edit(&mut self, id: &str) -> Result<()> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| UserdeskError::Validation(format!("No user with id {}", id)))?;
        self.edit = Some(EditBuffer::from_record(record));
        Ok(())
    }

    pub fn set_edit_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.edit_buffer()?.name = name.into();
        Ok(())
    }

    pub fn set_edit_email(&mut self, email: impl Into<String>) -> Result<()> {
        self.edit_buffer()?.email = email.into();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.edit = None;
    }

    /// Commit the edit buffer through [`update`](Self::update).
    pub async fn save_edit(&mut self) -> Result<()> {
        let buffer = self.edit_buffer()?.clone();
        self.update(&buffer.editing_id, &buffer.name, &buffer.email)
            .await
    }

    pub fn set_form_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
    }

    pub fn set_form_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
    }

    /// Create a record from the add form; the form is cleared on success.
    pub async fn submit_form(&mut self) -> Result<Record> {
        let AddForm { name, email } = self.form.clone();
        self.create(&name, &email).await
    }

    /// Drop all local state, e.g. after sign-out.
    pub fn clear(&mut self) {
        self.records.clear();
        self.form.clear();
        self.edit = None;
        self.loading = false;
    }

    fn edit_buffer(&mut self) -> Result<&mut EditBuffer> {
        self.edit
            .as_mut()
            .ok_or_else(|| UserdeskError::Validation("No user is being edited".to_string()))
    }

    fn validate<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.status = Some(StatusMessage::error(match e {
                UserdeskError::Validation(msg) => msg.clone(),
                other => other.to_string(),
            }));
        }
        result
    }

    fn fail(&mut self, message: &str, err: UserdeskError) -> UserdeskError {
        if err.needs_login() {
            debug!(error = %err, "{}", message);
            self.status = Some(StatusMessage::error(format!(
                "{} Please log in again.",
                message
            )));
        } else {
            warn!(error = %err, "{}", message);
            self.status = Some(StatusMessage::error(message));
        }
        err
    }

    async fn fetch_remote(&self) -> Result<Vec<Record>> {
        let token = self.session.bearer_token().await?;
        self.api.list(&token).await
    }

    async fn create_remote(&self, draft: &RecordDraft) -> Result<Record> {
        let token = self.session.bearer_token().await?;
        self.api.create(&token, draft).await
    }

    async fn update_remote(&self, id: &str, draft: &RecordDraft) -> Result<()> {
        let token = self.session.bearer_token().await?;
        self.api.update(&token, id, draft).await
    }

    async fn delete_remote(&self, id: &str) -> Result<()> {
        let token = self.session.bearer_token().await?;
        self.api.delete(&token, id).await
    }
}
