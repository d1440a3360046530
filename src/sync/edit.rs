use crate::models::Record;

/// An uncommitted edit of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub editing_id: String,
    pub name: String,
    pub email: String,
}

impl EditBuffer {
    pub fn from_record(record: &Record) -> Self {
        Self {
            editing_id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
        }
    }
}

/// The name/email input pair used to add records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddForm {
    pub name: String,
    pub email: String,
}

impl AddForm {
    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
    }
}
