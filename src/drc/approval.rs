//! Approval resolution and report formatting
//!
//! Callers persist approved message keys as a set of canonical S-expression
//! nodes; this module filters a run's messages against such a set and
//! renders the compatibility report format.

use std::collections::HashSet;

use crate::drc::types::RuleCheckMessage;
use crate::sexpr::SExpr;

/// Splits messages into the approved count and the remaining ones. The
/// remainder keeps its emission order.
pub fn resolve_approvals(
    messages: Vec<RuleCheckMessage>,
    approved: &HashSet<SExpr>,
) -> (usize, Vec<RuleCheckMessage>) {
    let mut approved_count = 0;
    let mut remaining = Vec::with_capacity(messages.len());
    for message in messages {
        if approved.contains(&message.approval_key) {
            approved_count += 1;
        } else {
            remaining.push(message);
        }
    }
    (approved_count, remaining)
}

/// Presentation order: severity descending, then message ascending
pub fn sort_for_presentation(messages: &mut [RuleCheckMessage]) {
    messages.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.message.cmp(&b.message))
    });
}

/// Renders the per-board text report: header, counts, then one indented
/// line per non-approved message
pub fn format_report(
    board_name: &str,
    approved_count: usize,
    non_approved: &[RuleCheckMessage],
) -> String {
    let mut sorted: Vec<RuleCheckMessage> = non_approved.to_vec();
    sort_for_presentation(&mut sorted);
    let mut out = String::new();
    out.push_str(&format!("Board '{}':\n", board_name));
    out.push_str(&format!("  Approved messages: {}\n", approved_count));
    out.push_str(&format!("  Non-approved messages: {}\n", sorted.len()));
    for message in &sorted {
        out.push_str(&format!(
            "    [{}] {}\n",
            message.severity.label(),
            message.message
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::types::Severity;

    fn msg(severity: Severity, text: &str, key: &str) -> RuleCheckMessage {
        RuleCheckMessage::new(
            severity,
            text,
            "",
            SExpr::tagged("approved", [SExpr::atom(key)]),
            Vec::new(),
        )
    }

    #[test]
    fn test_resolve_approvals() {
        let messages = vec![
            msg(Severity::Error, "a", "ka"),
            msg(Severity::Warning, "b", "kb"),
            msg(Severity::Hint, "c", "kc"),
        ];
        let mut approved = HashSet::new();
        approved.insert(SExpr::tagged("approved", [SExpr::atom("kb")]));
        let (count, remaining) = resolve_approvals(messages, &approved);
        assert_eq!(count, 1);
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].message, "a");
        assert_eq!(remaining[1].message, "c");
    }

    #[test]
    fn test_presentation_sort() {
        let mut messages = vec![
            msg(Severity::Hint, "z", "1"),
            msg(Severity::Error, "b", "2"),
            msg(Severity::Error, "a", "3"),
            msg(Severity::Warning, "m", "4"),
        ];
        sort_for_presentation(&mut messages);
        let order: Vec<&str> = messages.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "m", "z"]);
    }

    #[test]
    fn test_report_format() {
        let non_approved = vec![
            msg(Severity::Error, "Clearance violation", "1"),
            msg(Severity::Warning, "Courtyard overlap", "2"),
        ];
        let report = format_report("MyBoard", 3, &non_approved);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Board 'MyBoard':");
        assert_eq!(lines[1], "  Approved messages: 3");
        assert_eq!(lines[2], "  Non-approved messages: 2");
        assert_eq!(lines[3], "    [ERROR] Clearance violation");
        assert_eq!(lines[4], "    [WARNING] Courtyard overlap");
    }
}
