//! Deactivation selection
//!
//! When a blogger's quota shrinks below their active count, this picks the
//! minimum set of submissions to deactivate. The selection is a pure
//! function of the stored timestamps: the same inputs always select the
//! same subset, so a replayed downgrade event is harmless.

use blogdex_types::{Quota, Submission, SubmissionId};

/// Select which active submissions to deactivate so the remaining count
/// fits `new_quota`.
///
/// Submissions are ranked by `last_activated_at` descending (ties broken by
/// id); the most recently (re)activated ones are kept, the rest are
/// returned for deactivation. Entries that were never stamped sort last and
/// are dropped first.
pub fn select_deactivations(listed: &[Submission], new_quota: Quota) -> Vec<SubmissionId> {
    let keep = match new_quota.limit() {
        None => return Vec::new(),
        Some(n) => n as usize,
    };

    let mut ranked: Vec<&Submission> = listed.iter().collect();
    ranked.sort_by(|a, b| {
        b.last_activated_at
            .cmp(&a.last_activated_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    ranked.into_iter().skip(keep).map(|s| s.id).collect()
}
