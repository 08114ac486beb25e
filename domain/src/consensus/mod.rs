//! Consensus heuristic.
//!
//! A deliberately simple proportional signal, not semantic agreement
//! analysis: the share of the session's total turn budget that has been
//! spoken so far. It is monotonically non-decreasing within a run and
//! saturates at 100.

/// Proportional consensus percentage, rounded to one decimal place.
///
/// `total_messages` is the transcript length (assistant turns plus user
/// injections). Returns 0.0 when the budget or roster is empty rather than
/// dividing by zero.
pub fn consensus_percentage(total_messages: usize, max_rounds: u32, participant_count: usize) -> f64 {
    if max_rounds == 0 || participant_count == 0 {
        return 0.0;
    }
    let capacity = f64::from(max_rounds) * participant_count as f64;
    let raw = (total_messages as f64 / capacity * 100.0).min(100.0);
    (raw * 10.0).round() / 10.0
}
