use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decimal::Money;
use crate::schedule::Installment;
use crate::types::{InstallmentKey, InstallmentState};

use super::{clean, PaymentOutcome};

/// action applied to every selected pending installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkAction {
    /// mark paid, optionally with a shared reference (e.g. one check for the batch)
    Settle { reference: Option<String> },
    /// move to a caller-chosen date and record a note
    Reschedule { new_date: NaiveDate, note: Option<String> },
}

/// why a selected installment was left alone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    AlreadySettled,
    NotPending(InstallmentState),
    NotFound,
    DuplicateSelection,
    Conflict(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkOutcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    pub key: InstallmentKey,
    pub outcome: BulkOutcome,
}

/// per-item report of a bulk action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BulkReport {
    pub items: Vec<BulkItem>,
    /// number of installments changed
    pub processed: usize,
    /// sum of `total_amount` over the changed installments
    pub processed_total: Money,
}

impl BulkReport {
    pub fn applied(&self) -> impl Iterator<Item = &InstallmentKey> {
        self.items
            .iter()
            .filter(|item| item.outcome == BulkOutcome::Applied)
            .map(|item| &item.key)
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&InstallmentKey, &SkipReason)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            BulkOutcome::Skipped(reason) => Some((&item.key, reason)),
            BulkOutcome::Applied => None,
        })
    }

    fn push(&mut self, key: InstallmentKey, outcome: BulkOutcome) {
        self.items.push(BulkItem { key, outcome });
    }
}

/// apply `action` to the selection, returning the changed installments
///
/// `selection` pairs each requested key with what the store holds for it.
/// Only pending installments are touched; everything else is skipped and
/// reported. Nothing is persisted here.
pub fn apply_bulk_action(
    selection: Vec<(InstallmentKey, Option<Installment>)>,
    action: &BulkAction,
) -> (Vec<Installment>, BulkReport) {
    let mut report = BulkReport::default();
    let mut changed = Vec::new();
    let mut seen = HashSet::new();

    for (key, found) in selection {
        if !seen.insert(key) {
            report.push(key, BulkOutcome::Skipped(SkipReason::DuplicateSelection));
            continue;
        }

        let Some(mut installment) = found else {
            warn!(%key, "bulk selection references a missing installment");
            report.push(key, BulkOutcome::Skipped(SkipReason::NotFound));
            continue;
        };

        match installment.state {
            InstallmentState::Pending => {}
            InstallmentState::Paid => {
                debug!(%key, "already settled, skipped");
                report.push(key, BulkOutcome::Skipped(SkipReason::AlreadySettled));
                continue;
            }
            other => {
                report.push(key, BulkOutcome::Skipped(SkipReason::NotPending(other)));
                continue;
            }
        }

        let applied = match action {
            BulkAction::Settle { reference } => installment
                .record_payment(reference.as_deref())
                .map(|outcome| outcome == PaymentOutcome::Recorded),
            BulkAction::Reschedule { new_date, note } => {
                installment.change_due_date(*new_date).map(|()| {
                    installment.note = clean(note.as_deref());
                    true
                })
            }
        };

        match applied {
            Ok(true) => {
                report.processed += 1;
                report.processed_total += installment.total_amount;
                report.push(key, BulkOutcome::Applied);
                changed.push(installment);
            }
            Ok(false) => report.push(key, BulkOutcome::Skipped(SkipReason::AlreadySettled)),
            Err(err) => report.push(key, BulkOutcome::Skipped(SkipReason::Conflict(err.to_string()))),
        }
    }

    (changed, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn installments(count: u32) -> Vec<Installment> {
        let loan_id = Uuid::new_v4();
        (1..=count)
            .map(|n| {
                Installment::pending(
                    loan_id,
                    n,
                    Money::from_minor(4545),
                    Money::from_minor(455),
                    Money::from_minor(750),
                    date(2024, 3, 15),
                )
            })
            .collect()
    }

    fn selection(items: &[Installment]) -> Vec<(InstallmentKey, Option<Installment>)> {
        items.iter().map(|i| (i.key(), Some(i.clone()))).collect()
    }

    #[test]
    fn test_settle_pending_and_skip_paid() {
        let mut items = installments(4);
        items[3].record_payment(Some("OLD-1")).unwrap();

        let action = BulkAction::Settle {
            reference: Some("CHK-2024".to_string()),
        };
        let (changed, report) = apply_bulk_action(selection(&items), &action);

        assert_eq!(changed.len(), 3);
        for inst in &changed {
            assert_eq!(inst.state, InstallmentState::Paid);
            assert_eq!(inst.payment_reference.as_deref(), Some("CHK-2024"));
        }
        assert_eq!(report.processed, 3);
        assert_eq!(report.processed_total, Money::from_minor(3 * 5750));

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped, vec![(&items[3].key(), &SkipReason::AlreadySettled)]);
    }

    #[test]
    fn test_reschedule_sets_date_and_note() {
        let items = installments(2);
        let action = BulkAction::Reschedule {
            new_date: date(2024, 3, 22),
            note: Some("  holiday week ".to_string()),
        };
        let (changed, report) = apply_bulk_action(selection(&items), &action);

        assert_eq!(report.processed, 2);
        for inst in &changed {
            assert_eq!(inst.due_date, date(2024, 3, 22));
            assert_eq!(inst.note.as_deref(), Some("holiday week"));
            assert_eq!(inst.state, InstallmentState::Pending);
        }
    }

    #[test]
    fn test_skips_rescheduled_missing_and_duplicates() {
        let mut items = installments(2);
        items[1].reschedule("moved");
        let missing = InstallmentKey::new(Uuid::new_v4(), 1);

        let mut sel = selection(&items);
        sel.push((items[0].key(), Some(items[0].clone())));
        sel.push((missing, None));

        let action = BulkAction::Settle { reference: None };
        let (changed, report) = apply_bulk_action(sel, &action);

        assert_eq!(changed.len(), 1);
        assert_eq!(report.applied().count(), 1);
        let reasons: Vec<_> = report.skipped().map(|(_, r)| r.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::NotPending(InstallmentState::Rescheduled),
                SkipReason::DuplicateSelection,
                SkipReason::NotFound,
            ]
        );
    }

    #[test]
    fn test_empty_selection() {
        let (changed, report) = apply_bulk_action(Vec::new(), &BulkAction::Settle { reference: None });
        assert!(changed.is_empty());
        assert_eq!(report.processed, 0);
        assert_eq!(report.processed_total, Money::ZERO);
    }
}
