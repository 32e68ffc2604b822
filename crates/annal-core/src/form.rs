//! Create/edit form state machine.
//!
//! The UI's ad-hoc flags (modal open, editing id, delete confirmation) are
//! reimplemented as one explicit state enum with a single set of transition
//! methods, so illegal states are unrepresentable and the machine can be
//! unit-tested without a rendering environment.
//!
//! The machine also carries the pending PDF selections and an epoch counter.
//! Saves are asynchronous and cannot be cancelled; a submission issues a
//! ticket bound to the current epoch, and a completion arriving after the
//! form has been reset (stale ticket) is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  record::{sub_label, ArchiveRecord, Origin, PaperType, SubQuestion, TagList},
  store::PendingUpload,
};

/// Title auto-detection: four digits (year), optional whitespace, then D or E
/// (paper type), anywhere in the string.
static DSE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(\d{4})\s*([DEde])").expect("static pattern compiles")
});

// ─── Draft ───────────────────────────────────────────────────────────────────

/// The in-progress parent record being created or edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Draft {
  pub title:           String,
  pub origin:          Option<Origin>,
  pub year:            String,
  pub paper_type:      Option<PaperType>,
  pub topic:           TagList,
  pub file_url:        Option<String>,
  pub answer_file_url: Option<String>,
  pub sub_questions:   Vec<SubQuestion>,
}

impl Draft {
  /// A fresh draft: one empty sub-question labelled "a", the given calendar
  /// year, nothing else chosen yet.
  pub fn blank(year: &str) -> Self {
    Self {
      year: year.to_owned(),
      sub_questions: vec![SubQuestion::blank("a")],
      ..Self::default()
    }
  }

  /// Deep-copy an existing record into a draft. Facet lists are already
  /// canonical ([`TagList`] normalises at every decode boundary), so the form
  /// never sees raw legacy strings.
  pub fn from_record(record: &ArchiveRecord) -> Self {
    Self {
      title:           record.title.clone(),
      origin:          Some(record.origin),
      year:            record.year.clone(),
      paper_type:      Some(record.paper_type),
      topic:           record.topic.clone(),
      file_url:        record.file_url.clone(),
      answer_file_url: record.answer_file_url.clone(),
      sub_questions:   record.sub_questions.clone(),
    }
  }

  // ── Field edits ───────────────────────────────────────────────────────

  /// Update the title, running auto-detection on every keystroke's value.
  /// A match fills origin/year/paper type and applies the paper-type side
  /// effects; no match leaves them untouched.
  pub fn set_title(&mut self, value: &str) {
    self.title = value.to_owned();
    if let Some(caps) = DSE_TITLE.captures(value) {
      self.origin = Some(Origin::DsePastpaper);
      self.year = caps[1].to_owned();
      let paper = if caps[2].eq_ignore_ascii_case("D") {
        PaperType::Dbq
      } else {
        PaperType::Essay
      };
      self.set_paper_type(paper);
    }
  }

  /// Change the paper type (directly or via title auto-detection): relabel
  /// every sub-question, seed three blank a/b/c sub-questions when a DBQ
  /// paper is still essentially empty, clear the parent topic for essays.
  pub fn set_paper_type(&mut self, paper: PaperType) {
    self.paper_type = Some(paper);
    self.relabel();
    match paper {
      PaperType::Dbq => {
        let essentially_empty = self.sub_questions.len() <= 1
          && self.sub_questions.first().is_none_or(|sq| sq.content.is_empty());
        if essentially_empty {
          self.sub_questions =
            (0..3).map(|i| SubQuestion::blank(&paper.label_for(i))).collect();
        }
      }
      // Topic tagging moves to the sub-question level for essay papers.
      PaperType::Essay => self.topic.clear(),
    }
  }

  /// Recompute every label from its index. Direct label overrides survive
  /// only until the next structural change calls this.
  pub fn relabel(&mut self) {
    for (index, sq) in self.sub_questions.iter_mut().enumerate() {
      sq.label = sub_label(index, self.paper_type);
    }
  }

  /// Append one empty sub-question with the next computed label.
  pub fn add_sub_question(&mut self) {
    let label = sub_label(self.sub_questions.len(), self.paper_type);
    self.sub_questions.push(SubQuestion::blank(&label));
  }

  /// Remove by index and relabel contiguously. Removing the last remaining
  /// sub-question is disallowed.
  pub fn remove_sub_question(&mut self, index: usize) -> bool {
    if self.sub_questions.len() <= 1 || index >= self.sub_questions.len() {
      return false;
    }
    self.sub_questions.remove(index);
    self.relabel();
    true
  }

  pub fn sub_question_mut(&mut self, index: usize) -> Option<&mut SubQuestion> {
    self.sub_questions.get_mut(index)
  }
}

// ─── FormState ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum FormState {
  Closed,
  Creating { draft: Draft },
  Editing { id: String, draft: Draft },
  /// Delete confirmation, reachable only from `Editing`.
  ConfirmingDelete { id: String, draft: Draft },
}

impl FormState {
  pub fn is_open(&self) -> bool { !matches!(self, FormState::Closed) }
}

// ─── Tickets ─────────────────────────────────────────────────────────────────

/// Proof that a submission was started against a particular form epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket(u64);

// ─── FormMachine ─────────────────────────────────────────────────────────────

/// The form state plus the pending file selections and the stale-response
/// epoch.
#[derive(Debug, Default)]
pub struct FormMachine {
  state:          FormState,
  pending_file:   Option<PendingUpload>,
  pending_answer: Option<PendingUpload>,
  epoch:          u64,
}

impl Default for FormState {
  fn default() -> Self { FormState::Closed }
}

impl FormMachine {
  pub fn new() -> Self { Self::default() }

  pub fn state(&self) -> &FormState { &self.state }

  pub fn draft(&self) -> Option<&Draft> {
    match &self.state {
      FormState::Closed => None,
      FormState::Creating { draft }
      | FormState::Editing { draft, .. }
      | FormState::ConfirmingDelete { draft, .. } => Some(draft),
    }
  }

  pub fn draft_mut(&mut self) -> Option<&mut Draft> {
    match &mut self.state {
      FormState::Closed => None,
      FormState::Creating { draft }
      | FormState::Editing { draft, .. }
      | FormState::ConfirmingDelete { draft, .. } => Some(draft),
    }
  }

  /// The record identifier bound to an edit, if any.
  pub fn editing_id(&self) -> Option<&str> {
    match &self.state {
      FormState::Editing { id, .. } | FormState::ConfirmingDelete { id, .. } => {
        Some(id)
      }
      _ => None,
    }
  }

  // ── Transitions ───────────────────────────────────────────────────────

  pub fn open_create(&mut self, current_year: &str) {
    self.reset(FormState::Creating { draft: Draft::blank(current_year) });
  }

  pub fn open_edit(&mut self, record: &ArchiveRecord) {
    self.reset(FormState::Editing {
      id:    record.id.clone(),
      draft: Draft::from_record(record),
    });
  }

  /// Discard all in-progress form state, including pending file selections.
  pub fn close(&mut self) { self.reset(FormState::Closed); }

  /// `Editing` → `ConfirmingDelete`. Returns false from any other state.
  pub fn request_delete(&mut self) -> bool {
    match std::mem::take(&mut self.state) {
      FormState::Editing { id, draft } => {
        self.state = FormState::ConfirmingDelete { id, draft };
        true
      }
      other => {
        self.state = other;
        false
      }
    }
  }

  /// `ConfirmingDelete` → `Editing`. Returns false from any other state.
  pub fn cancel_delete(&mut self) -> bool {
    match std::mem::take(&mut self.state) {
      FormState::ConfirmingDelete { id, draft } => {
        self.state = FormState::Editing { id, draft };
        true
      }
      other => {
        self.state = other;
        false
      }
    }
  }

  fn reset(&mut self, next: FormState) {
    self.state = next;
    self.pending_file = None;
    self.pending_answer = None;
    self.epoch += 1;
  }

  // ── Pending files ─────────────────────────────────────────────────────

  pub fn select_file(&mut self, upload: PendingUpload) {
    self.pending_file = Some(upload);
  }

  pub fn select_answer_file(&mut self, upload: PendingUpload) {
    self.pending_answer = Some(upload);
  }

  pub fn pending_file(&self) -> Option<&PendingUpload> {
    self.pending_file.as_ref()
  }

  pub fn pending_answer(&self) -> Option<&PendingUpload> {
    self.pending_answer.as_ref()
  }

  /// Hand the pending selections to a submission.
  pub fn take_pending(&mut self) -> (Option<PendingUpload>, Option<PendingUpload>) {
    (self.pending_file.take(), self.pending_answer.take())
  }

  // ── Stale-response guard ──────────────────────────────────────────────

  /// Start a submission against the current form.
  pub fn submit_ticket(&self) -> SubmitTicket { SubmitTicket(self.epoch) }

  /// Apply a completed save. Returns false (and changes nothing) when the
  /// form has been reset since the ticket was issued — there is no request
  /// cancellation, so late responses simply must not touch newer state.
  pub fn finish_submit(&mut self, ticket: SubmitTicket) -> bool {
    if ticket.0 != self.epoch {
      return false;
    }
    self.close();
    true
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
