//! Per-field "enhance" sub-operations.
//!
//! Each enhancement is an independent task keyed by (section, optional
//! index). Tasks never block one another and never touch anything but
//! their own target field, so a slow enhancement cannot clobber
//! concurrent unrelated edits. Completion order is unconstrained:
//! last write wins per field, and a stale completion still applies as
//! long as its target field exists.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::editor::session::{EditorSession, SessionStore};
use crate::remote::{RemoteError, ResumeService};

/// Which part of the document an enhancement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhanceSection {
    Summary,
    Experience,
    Suggestion,
}

impl EnhanceSection {
    /// Section name on the remote service's wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            EnhanceSection::Summary => "summary",
            EnhanceSection::Experience => "experience",
            EnhanceSection::Suggestion => "suggestion",
        }
    }
}

/// Composite task key: section plus, for repeatable sections, the entry
/// index the task owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnhanceKey {
    pub section: EnhanceSection,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceStatus {
    Running,
    Done,
    Failed(String),
}

/// Spawns the enhancement as a detached task. The caller has already
/// recorded the key as `Running`; this future flips it to `Done` or
/// `Failed` and writes the result into the target field only.
pub fn spawn_enhance(
    store: SessionStore,
    remote: Arc<dyn ResumeService>,
    session_id: String,
    key: EnhanceKey,
    content: String,
) {
    tokio::spawn(run_enhance(store, remote, session_id, key, content));
}

pub async fn run_enhance(
    store: SessionStore,
    remote: Arc<dyn ResumeService>,
    session_id: String,
    key: EnhanceKey,
    content: String,
) {
    let outcome = match key.section {
        EnhanceSection::Summary | EnhanceSection::Experience => {
            remote.enhance(key.section.wire_name(), &content).await
        }
        EnhanceSection::Suggestion => remote.suggest(&content).await,
    };

    let applied = store
        .modify(&session_id, |session| {
            apply_outcome(session, key, outcome);
            Ok(())
        })
        .await;

    if let Err(e) = applied {
        // The session was closed while the task was in flight; nothing
        // left to write to.
        warn!("enhance completion for departed session {session_id}: {e}");
    }
}

fn apply_outcome(session: &mut EditorSession, key: EnhanceKey, outcome: Result<String, RemoteError>) {
    let status = match outcome {
        Ok(text) => {
            if write_target_field(session, key, text) {
                EnhanceStatus::Done
            } else {
                EnhanceStatus::Failed("target field no longer exists".to_string())
            }
        }
        Err(e) => {
            warn!(
                "enhance {:?}[{:?}] on session {} failed: {e}",
                key.section, key.index, session.id
            );
            EnhanceStatus::Failed(e.to_string())
        }
    };
    session.enhance.insert(key, status);
}

/// Writes `text` into the field the key owns. Returns false when the
/// target is gone (entry deleted, or the session never got a document).
fn write_target_field(session: &mut EditorSession, key: EnhanceKey, text: String) -> bool {
    let Some(doc) = session.document.as_mut() else {
        return false;
    };
    match (key.section, key.index) {
        (EnhanceSection::Summary, _) => {
            doc.summary = text;
            true
        }
        (EnhanceSection::Suggestion, _) => {
            doc.suggestion = text;
            true
        }
        (EnhanceSection::Experience, Some(index)) => match doc.experience.get_mut(index) {
            Some(entry) => {
                entry.description = text;
                true
            }
            None => false,
        },
        (EnhanceSection::Experience, None) => false,
    }
}
