//! Drafts for the create form and the inline row editor.
//!
//! Both hold raw user input as strings. Nothing reaches a store until the
//! draft validates into [`EntryFields`].

use crate::error::ValidationError;
use crate::models::{Entry, EntryField, EntryFields, EntryType};

/// Unvalidated field values as typed by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryDraft {
    pub name: String,
    pub r#type: String,
    pub url: String,
    pub creator: String,
}

impl Default for EntryDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            r#type: EntryType::default().as_str().to_string(),
            url: String::new(),
            creator: String::new(),
        }
    }
}

impl From<&Entry> for EntryDraft {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            r#type: entry.r#type.as_str().to_string(),
            url: entry.url.clone(),
            creator: entry.creator.clone(),
        }
    }
}

impl EntryDraft {
    pub fn set_field(&mut self, field: EntryField, value: impl Into<String>) {
        let value = value.into();
        match field {
            EntryField::Name => self.name = value,
            EntryField::Type => self.r#type = value,
            EntryField::Url => self.url = value,
            EntryField::Creator => self.creator = value,
        }
    }

    /// Check every field and produce trimmed [`EntryFields`].
    pub fn validate(&self) -> Result<EntryFields, ValidationError> {
        let name = required(EntryField::Name, &self.name)?;
        let r#type = self.r#type.trim().parse::<EntryType>()?;
        let url = required(EntryField::Url, &self.url)?;
        let creator = required(EntryField::Creator, &self.creator)?;
        Ok(EntryFields::new(name, r#type, url, creator))
    }
}

fn required(field: EntryField, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(value.to_string())
    }
}

/// The create form.
#[derive(Clone, Debug, Default)]
pub struct EntryForm {
    draft: EntryDraft,
}

impl EntryForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &EntryDraft {
        &self.draft
    }

    pub fn set_field(&mut self, field: EntryField, value: impl Into<String>) {
        self.draft.set_field(field, value);
    }

    pub fn validate(&self) -> Result<EntryFields, ValidationError> {
        self.draft.validate()
    }

    /// Validate and reset the form. A failed validation keeps the draft.
    pub fn submit(&mut self) -> Result<EntryFields, ValidationError> {
        let fields = self.draft.validate()?;
        self.reset();
        Ok(fields)
    }

    pub fn reset(&mut self) {
        self.draft = EntryDraft::default();
    }
}

/// Inline editing of a single row.
#[derive(Clone, Debug, Default)]
pub struct InlineEdit {
    editing: Option<(String, EntryDraft)>,
}

impl InlineEdit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter edit mode for `entry`, replacing any edit in progress.
    pub fn start(&mut self, entry: &Entry) {
        self.editing = Some((entry.id.clone(), EntryDraft::from(entry)));
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.editing_id() == Some(id)
    }

    pub fn draft(&self) -> Option<&EntryDraft> {
        self.editing.as_ref().map(|(_, draft)| draft)
    }

    /// Ignored when nothing is being edited.
    pub fn set_field(&mut self, field: EntryField, value: impl Into<String>) {
        if let Some((_, draft)) = &mut self.editing {
            draft.set_field(field, value);
        }
    }

    pub fn cancel(&mut self) {
        self.editing = None;
    }

    pub fn validate(&self) -> Result<(String, EntryFields), ValidationError> {
        let (id, draft) = self.editing.as_ref().ok_or(ValidationError::NotEditing)?;
        Ok((id.clone(), draft.validate()?))
    }

    /// Validate and leave edit mode. A failed validation stays in edit mode.
    pub fn commit(&mut self) -> Result<(String, EntryFields), ValidationError> {
        let result = self.validate()?;
        self.cancel();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry::from_fields(
            "todo_1_a".to_string(),
            EntryFields::new("React Docs", EntryType::Written, "https://react.dev", "React Team"),
            None,
        )
    }

    #[test]
    fn test_draft_defaults_to_written() {
        let draft = EntryDraft::default();
        assert_eq!(draft.r#type, "Written");
        assert_eq!(draft.validate(), Err(ValidationError::Missing(EntryField::Name)));
    }

    #[test]
    fn test_whitespace_only_is_missing() {
        let mut form = EntryForm::new();
        form.set_field(EntryField::Name, "Docs");
        form.set_field(EntryField::Url, "   ");
        form.set_field(EntryField::Creator, "Me");
        assert_eq!(form.submit(), Err(ValidationError::Missing(EntryField::Url)));
        assert_eq!(form.draft().name, "Docs");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut draft = EntryDraft::default();
        draft.set_field(EntryField::Name, "n");
        draft.set_field(EntryField::Url, "u");
        draft.set_field(EntryField::Creator, "c");
        draft.set_field(EntryField::Type, "Podcast");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::UnknownType("Podcast".to_string()))
        );
    }

    #[test]
    fn test_submit_trims_and_resets() {
        let mut form = EntryForm::new();
        form.set_field(EntryField::Name, "  Docs ");
        form.set_field(EntryField::Type, "Video");
        form.set_field(EntryField::Url, "https://d");
        form.set_field(EntryField::Creator, "Me");
        let fields = form.submit().unwrap();
        assert_eq!(fields, EntryFields::new("Docs", EntryType::Video, "https://d", "Me"));
        assert_eq!(form.draft(), &EntryDraft::default());
    }

    #[test]
    fn test_inline_edit_lifecycle() {
        let mut edit = InlineEdit::new();
        assert_eq!(edit.commit(), Err(ValidationError::NotEditing));
        edit.set_field(EntryField::Name, "ignored");
        assert!(edit.draft().is_none());

        let entry = entry();
        edit.start(&entry);
        assert!(edit.is_editing("todo_1_a"));
        assert_eq!(edit.draft().unwrap().name, "React Docs");

        edit.set_field(EntryField::Creator, "Meta");
        let (id, fields) = edit.commit().unwrap();
        assert_eq!(id, "todo_1_a");
        assert_eq!(fields.creator, "Meta");
        assert!(edit.editing_id().is_none());
    }

    #[test]
    fn test_cancel_discards_changes() {
        let mut edit = InlineEdit::new();
        edit.start(&entry());
        edit.set_field(EntryField::Name, "");
        assert!(edit.commit().is_err());
        assert!(edit.is_editing("todo_1_a"));
        edit.cancel();
        assert!(edit.draft().is_none());
    }
}
