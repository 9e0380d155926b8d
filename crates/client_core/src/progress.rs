use shared::domain::{FieldId, FieldMarker, ProgressState, REQUIRED_NUMERIC_FIELDS};

use crate::validation::FormState;

/// Counts answered questions: numeric KPIs that are filled and not marked
/// invalid, one for having any attachment, and one for comments.
pub fn recompute(form: &FormState, attachment_count: usize) -> ProgressState {
    let answered = REQUIRED_NUMERIC_FIELDS
        .iter()
        .filter(|field| !form.is_blank(**field) && form.marker(**field) != FieldMarker::Invalid)
        .count() as u32;

    let mut completed = answered;
    if attachment_count > 0 {
        completed += 1;
    }
    // Comments are optional and always count as answered.
    completed += 1;

    ProgressState::new(completed)
}

/// Character counter shown under the comments box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentCounter {
    pub count: usize,
    pub limit: usize,
}

impl CommentCounter {
    pub fn for_form(form: &FormState) -> Self {
        Self {
            count: crate::validation::utf16_len(form.value(FieldId::Comments)),
            limit: FieldId::Comments.spec().max_len.unwrap_or(usize::MAX),
        }
    }

    pub fn over_limit(&self) -> bool {
        self.count > self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> FormState {
        let mut form = FormState::default();
        for field in REQUIRED_NUMERIC_FIELDS {
            form.set_value(field, "1");
            form.set_marker(field, FieldMarker::Valid);
        }
        form
    }

    #[test]
    fn empty_form_counts_only_comments() {
        let progress = recompute(&FormState::default(), 0);
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 11);
    }

    #[test]
    fn complete_form_reaches_total_regardless_of_comment_content() {
        let mut form = filled_form();
        assert!(recompute(&form, 1).is_complete());

        form.set_value(FieldId::Comments, "x".repeat(600));
        form.set_marker(FieldId::Comments, FieldMarker::Invalid);
        assert!(recompute(&form, 1).is_complete());
    }

    #[test]
    fn attachments_and_invalid_markers_gate_completion() {
        let mut form = filled_form();
        assert_eq!(recompute(&form, 0).completed, 10);

        form.set_marker(FieldId::LostLeads, FieldMarker::Invalid);
        assert_eq!(recompute(&form, 3).completed, 10);

        form.set_value(FieldId::PaidOrders, "  ");
        assert_eq!(recompute(&form, 3).completed, 9);
    }

    #[test]
    fn counter_flags_overflow() {
        let mut form = FormState::default();
        form.set_value(FieldId::Comments, "ok");
        let counter = CommentCounter::for_form(&form);
        assert_eq!(counter.count, 2);
        assert!(!counter.over_limit());

        form.set_value(FieldId::Comments, "я".repeat(501));
        assert!(CommentCounter::for_form(&form).over_limit());
    }
}
