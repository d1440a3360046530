#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use userdesk::api::RecordApi;
use userdesk::auth::IdentityProvider;
use userdesk::models::{Credential, Identity, Record, RecordDraft};
use userdesk::session::{CredentialStore, MemoryCredentialStore, SessionManager, TokenPolicy};
use userdesk::{Result, UserdeskError};

pub enum SignInOutcome {
    Grant(Credential),
    Cancel,
}

/// Identity provider double: scripted sign-in, countable refresh/sign-out.
pub struct FakeProvider {
    outcome: Mutex<SignInOutcome>,
    pub fail_sign_out: bool,
    pub refreshed_token: Mutex<Option<String>>,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    changes: watch::Sender<Option<Credential>>,
}

impl FakeProvider {
    pub fn granting(subject: &str, token: &str) -> Self {
        Self::with_outcome(SignInOutcome::Grant(Credential::new(
            Identity::new(subject).with_email(format!("{}@example.com", subject)),
            token,
        )))
    }

    pub fn cancelling() -> Self {
        Self::with_outcome(SignInOutcome::Cancel)
    }

    fn with_outcome(outcome: SignInOutcome) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            outcome: Mutex::new(outcome),
            fail_sign_out: false,
            refreshed_token: Mutex::new(None),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            changes,
        }
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn refreshing_to(self, token: &str) -> Self {
        *self.refreshed_token.lock().unwrap() = Some(token.to_string());
        self
    }

    /// Simulate a provider-side session change.
    pub fn emit(&self, credential: Option<Credential>) {
        self.changes.send_replace(credential);
    }
}

impl IdentityProvider for FakeProvider {
    async fn sign_in(&self) -> Result<Credential> {
        let credential = match &*self.outcome.lock().unwrap() {
            SignInOutcome::Grant(credential) => credential.clone(),
            SignInOutcome::Cancel => {
                return Err(UserdeskError::Auth("Sign-in was cancelled".to_string()))
            }
        };
        self.emit(Some(credential.clone()));
        Ok(credential)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.emit(None);
        if self.fail_sign_out {
            return Err(UserdeskError::Auth("revocation endpoint unreachable".to_string()));
        }
        Ok(())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.refreshed_token.lock().unwrap().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.changes.subscribe()
    }
}

#[derive(Default)]
pub struct FakeState {
    pub records: Vec<Record>,
    pub calls: Vec<String>,
    pub tokens: Vec<String>,
    pub fail_status: Option<u16>,
    next_id: u32,
}

/// In-memory record API that logs every call it receives.
#[derive(Clone, Default)]
pub struct FakeRecordApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRecordApi {
    pub fn with_records(records: Vec<Record>) -> Self {
        let api = Self::default();
        {
            let mut state = api.state.lock().unwrap();
            state.next_id = records.len() as u32;
            state.records = records;
        }
        api
    }

    pub fn fail_with(&self, status: u16) {
        self.state.lock().unwrap().fail_status = Some(status);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_status = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }

    pub fn remote_records(&self) -> Vec<Record> {
        self.state.lock().unwrap().records.clone()
    }

    /// Change the remote store behind the client's back.
    pub fn remove_remote(&self, id: &str) {
        self.state.lock().unwrap().records.retain(|r| r.id != id);
    }

    fn log(&self, call: String, token: &str) -> Result<std::sync::MutexGuard<'_, FakeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.tokens.push(token.to_string());
        if let Some(status) = state.fail_status {
            return Err(UserdeskError::Api {
                status,
                message: "injected failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl RecordApi for FakeRecordApi {
    async fn list(&self, token: &str) -> Result<Vec<Record>> {
        let state = self.log("GET /users".to_string(), token)?;
        Ok(state.records.clone())
    }

    async fn create(&self, token: &str, draft: &RecordDraft) -> Result<Record> {
        let mut state = self.log("POST /users".to_string(), token)?;
        state.next_id += 1;
        let record = Record::new(
            format!("srv-{}", state.next_id),
            draft.name(),
            draft.email(),
        );
        state.records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, token: &str, id: &str, draft: &RecordDraft) -> Result<()> {
        let mut state = self.log(format!("PUT /users/{}", id), token)?;
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            record.name = draft.name().to_string();
            record.email = draft.email().to_string();
        }
        Ok(())
    }

    async fn delete(&self, token: &str, id: &str) -> Result<()> {
        let mut state = self.log(format!("DELETE /users/{}", id), token)?;
        state.records.retain(|r| r.id != id);
        Ok(())
    }
}

pub fn store_with_token(token: Option<&str>) -> Arc<MemoryCredentialStore> {
    let store = Arc::new(MemoryCredentialStore::new());
    if let Some(token) = token {
        store.set_identity(Some(&Identity::new("operator"))).unwrap();
        store.set_token(Some(token)).unwrap();
    }
    store
}

/// A session that is already signed in with `token`.
pub fn signed_in_session(token: &str) -> Arc<SessionManager<FakeProvider>> {
    Arc::new(SessionManager::new(
        FakeProvider::granting("operator", token),
        store_with_token(Some(token)),
        TokenPolicy::Cached,
    ))
}

pub fn sample_records() -> Vec<Record> {
    vec![
        Record::new("1", "Ada", "ada@x.com"),
        Record::new("2", "A", "a@x.com"),
        Record::new("3", "Grace", "grace@x.com"),
    ]
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
