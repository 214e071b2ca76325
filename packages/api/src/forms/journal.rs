//! Journal entries and the practice counters on the dashboard.

use super::{FormController, JournalForm, SubmitControl, SubmitGuard};
use crate::db::{journal, profiles};
use crate::error::AuthError;
use crate::models::{NewJournalEntry, StatField};
use crate::present::Message;

impl FormController {
    /// Write the entry, then bump the journal counter. Returns the new count
    /// when the counter could be updated.
    pub async fn save_journal(
        &self,
        form: &JournalForm,
        submit: &mut dyn SubmitControl,
    ) -> Result<Option<i64>, AuthError> {
        self.check(form.validate())?;
        let Some(user) = self.auth.current_user() else {
            return Err(self.report("journal_save_failed", AuthError::Unauthenticated));
        };
        let busy = self.translator.translate("saving", "Saving...");
        let _busy = SubmitGuard::new(submit, &busy);

        let entry = NewJournalEntry::new(user.id, form.text.trim(), form.mood.clone());
        if let Err(e) = journal::insert(self.auth.backend().as_ref(), &entry).await {
            tracing::error!("Save journal error: {}", e);
            return Err(self.report("journal_save_failed", e.into()));
        }

        let count = self.increment_stat(StatField::JournalEntries).await;
        self.presenter().show_message(Message::success("journal_saved"));
        Ok(count)
    }

    /// Non-atomic read-then-write of one counter. Failures are logged only.
    pub async fn increment_stat(&self, field: StatField) -> Option<i64> {
        let user = self.auth.current_user()?;
        match profiles::increment_stat(self.auth.backend().as_ref(), user.id, field).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Update stats error for {}: {}", field.column(), e);
                None
            }
        }
    }
}
