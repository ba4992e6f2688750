//! Prompt building over a financial snapshot
//!
//! The web client posts its dashboard numbers as JSON; money fields arrive
//! as whatever the UI holds (numbers, "$1,234.56" strings, locale formats).
//! Parsing is lenient per field - a malformed amount becomes zero rather
//! than failing the request - but a payload with no usable months at all is
//! rejected.

use serde_json::Value;

use crate::aggregates::{MonthKey, MonthlyAggregate};
use crate::ai::{AiError, AiResult, Message};
use crate::health::HealthReport;
use crate::money::{format_amount, lenient_amount};

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are Finora's financial assistant. You are given a \
user's monthly income and spending figures, savings goals, and a computed financial health \
score. Write clear, encouraging, practical summaries. Use plain language, reference concrete \
numbers from the data, and keep advice actionable. Never invent figures that are not in the \
data provided.";

// ============================================================================
// SNAPSHOT PAYLOAD
// ============================================================================

/// One savings goal as sent by the client
#[derive(Debug, Clone)]
pub struct GoalFigures {
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
}

/// The client-supplied financial snapshot, after lenient parsing
#[derive(Debug, Clone)]
pub struct SnapshotPayload {
    /// Oldest-first monthly aggregates
    pub months: Vec<MonthlyAggregate>,
    pub emergency_fund: f64,
    pub subscriptions_monthly_total: f64,
    pub goals: Vec<GoalFigures>,
}

impl SnapshotPayload {
    /// Parse the snapshot out of a JSON payload.
    ///
    /// Expected shape (all money fields lenient):
    /// ```json
    /// {
    ///   "months": [{"month": "2025-03", "income": "$3,000", "expenses": 2200}],
    ///   "emergency_fund": "5,000",
    ///   "subscriptions_monthly_total": 42,
    ///   "goals": [{"name": "Vacation", "target_amount": 1500, "saved_amount": "400"}]
    /// }
    /// ```
    pub fn from_json(value: &Value) -> AiResult<Self> {
        let raw_months = value
            .get("months")
            .and_then(Value::as_array)
            .ok_or_else(|| AiError::Payload("months array is required".to_string()))?;

        let mut months: Vec<MonthlyAggregate> = Vec::with_capacity(raw_months.len());
        for raw in raw_months {
            let Some(label) = raw.get("month").and_then(Value::as_str) else {
                continue; // unlabeled month rows are dropped
            };
            let Some(key) = MonthKey::parse_label(label) else {
                continue;
            };

            let income = raw.get("income").and_then(lenient_amount).unwrap_or(0.0);
            let expenses = raw.get("expenses").and_then(lenient_amount).unwrap_or(0.0);
            let mut aggregate = MonthlyAggregate::new(key, income, expenses);
            aggregate.savings = raw.get("savings").and_then(lenient_amount);
            months.push(aggregate);
        }

        if months.is_empty() {
            return Err(AiError::Payload("no usable months in payload".to_string()));
        }
        months.sort_by_key(|m| m.month);

        let goals = value
            .get("goals")
            .and_then(Value::as_array)
            .map(|raw_goals| {
                raw_goals
                    .iter()
                    .filter_map(|g| {
                        let name = g.get("name").and_then(Value::as_str)?.to_string();
                        Some(GoalFigures {
                            name,
                            target_amount: g.get("target_amount").and_then(lenient_amount).unwrap_or(0.0),
                            saved_amount: g.get("saved_amount").and_then(lenient_amount).unwrap_or(0.0),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(SnapshotPayload {
            months,
            emergency_fund: value.get("emergency_fund").and_then(lenient_amount).unwrap_or(0.0),
            subscriptions_monthly_total: value
                .get("subscriptions_monthly_total")
                .and_then(lenient_amount)
                .unwrap_or(0.0),
            goals,
        })
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

/// `POST /api/ai/summary` body
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub snapshot: SnapshotPayload,
}

impl SummaryRequest {
    pub fn from_json(value: &Value) -> AiResult<Self> {
        Ok(SummaryRequest {
            snapshot: SnapshotPayload::from_json(value)?,
        })
    }
}

/// `POST /api/ai/followup` body: a question plus prior turns, with the
/// snapshot repeated for context
#[derive(Debug, Clone)]
pub struct FollowupRequest {
    pub question: String,
    pub history: Vec<Message>,
    pub snapshot: SnapshotPayload,
}

impl FollowupRequest {
    pub fn from_json(value: &Value) -> AiResult<Self> {
        let question = value
            .get("question")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AiError::Payload("question is required".to_string()))?
            .to_string();

        let history = value
            .get("history")
            .and_then(Value::as_array)
            .map(|turns| {
                turns
                    .iter()
                    .filter_map(|turn| {
                        let role = turn.get("role").and_then(Value::as_str)?;
                        let content = turn.get("content").and_then(Value::as_str)?;
                        match role {
                            "user" => Some(Message::user(content)),
                            "assistant" => Some(Message::assistant(content)),
                            _ => None, // unknown roles are dropped
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(FollowupRequest {
            question,
            history,
            snapshot: SnapshotPayload::from_json(value)?,
        })
    }
}

// ============================================================================
// PROMPT ASSEMBLY
// ============================================================================

/// Render the snapshot (and score, when computed) as prompt context
pub fn snapshot_context(snapshot: &SnapshotPayload, health: Option<&HealthReport>) -> String {
    let mut out = String::from("Financial snapshot:\n");

    for m in &snapshot.months {
        out.push_str(&format!(
            "- {}: income {}, expenses {}, net {}\n",
            m.month.label(),
            format_amount(m.income),
            format_amount(m.expenses),
            format_amount(m.net())
        ));
    }

    if snapshot.emergency_fund > 0.0 {
        out.push_str(&format!(
            "Emergency fund: {}\n",
            format_amount(snapshot.emergency_fund)
        ));
    }
    if snapshot.subscriptions_monthly_total > 0.0 {
        out.push_str(&format!(
            "Subscriptions: {} per month\n",
            format_amount(snapshot.subscriptions_monthly_total)
        ));
    }

    for goal in &snapshot.goals {
        out.push_str(&format!(
            "Goal \"{}\": {} saved of {}\n",
            goal.name,
            format_amount(goal.saved_amount),
            format_amount(goal.target_amount)
        ));
    }

    if let Some(report) = health {
        out.push_str(&format!("Financial health score: {}/100\n", report.score));
        for insight in &report.insights {
            out.push_str(&format!("- {}\n", insight));
        }
    }

    out
}

/// Messages for the one-shot summary endpoint
pub fn build_summary_messages(snapshot: &SnapshotPayload, health: &HealthReport) -> Vec<Message> {
    let request = format!(
        "{}\nWrite a short financial summary for this user: 2-3 paragraphs covering how the \
         recent months went, what stands out, and one or two concrete next steps.",
        snapshot_context(snapshot, Some(health))
    );
    vec![Message::user(request)]
}

/// Messages for the follow-up chat endpoint: prior turns, then the new
/// question with the snapshot restated
pub fn build_followup_messages(request: &FollowupRequest, health: &HealthReport) -> Vec<Message> {
    let mut messages = request.history.clone();
    messages.push(Message::user(format!(
        "{}\nQuestion: {}",
        snapshot_context(&request.snapshot, Some(health)),
        request.question
    )));
    messages
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;
    use crate::health::{health_score, ScoreOptions};
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "months": [
                {"month": "2025-02", "income": "$3,000", "expenses": 2200},
                {"month": "2025-03", "income": 3100, "expenses": "2,450.75"}
            ],
            "emergency_fund": "5,000",
            "goals": [{"name": "Vacation", "target_amount": 1500, "saved_amount": "400"}]
        })
    }

    #[test]
    fn test_snapshot_parses_lenient_amounts() {
        let snapshot = SnapshotPayload::from_json(&payload()).unwrap();

        assert_eq!(snapshot.months.len(), 2);
        assert_eq!(snapshot.months[0].income, 3000.0);
        assert_eq!(snapshot.months[1].expenses, 2450.75);
        assert_eq!(snapshot.emergency_fund, 5000.0);
        assert_eq!(snapshot.goals[0].saved_amount, 400.0);
    }

    #[test]
    fn test_snapshot_sorts_months_and_drops_malformed() {
        let raw = json!({
            "months": [
                {"month": "2025-03", "income": 3100, "expenses": 2450},
                {"month": "not-a-month", "income": 1, "expenses": 1},
                {"income": 2, "expenses": 2},
                {"month": "2025-01", "income": 2900, "expenses": 2100}
            ]
        });
        let snapshot = SnapshotPayload::from_json(&raw).unwrap();

        assert_eq!(snapshot.months.len(), 2);
        assert_eq!(snapshot.months[0].month.label(), "2025-01");
        assert_eq!(snapshot.months[1].month.label(), "2025-03");
    }

    #[test]
    fn test_snapshot_requires_usable_months() {
        assert!(SnapshotPayload::from_json(&json!({})).is_err());
        assert!(SnapshotPayload::from_json(&json!({"months": []})).is_err());
        assert!(SnapshotPayload::from_json(&json!({"months": [{"month": "??"}]})).is_err());
    }

    #[test]
    fn test_unreadable_amounts_default_to_zero() {
        let raw = json!({
            "months": [{"month": "2025-03", "income": "n/a", "expenses": null}]
        });
        let snapshot = SnapshotPayload::from_json(&raw).unwrap();
        assert_eq!(snapshot.months[0].income, 0.0);
        assert_eq!(snapshot.months[0].expenses, 0.0);
    }

    #[test]
    fn test_followup_requires_question() {
        let mut raw = payload();
        assert!(FollowupRequest::from_json(&raw).is_err());

        raw["question"] = json!("   ");
        assert!(FollowupRequest::from_json(&raw).is_err());

        raw["question"] = json!("Can I afford the vacation?");
        let request = FollowupRequest::from_json(&raw).unwrap();
        assert_eq!(request.question, "Can I afford the vacation?");
    }

    #[test]
    fn test_followup_keeps_known_roles_only() {
        let mut raw = payload();
        raw["question"] = json!("And next month?");
        raw["history"] = json!([
            {"role": "user", "content": "How did March go?"},
            {"role": "assistant", "content": "March was solid."},
            {"role": "system", "content": "ignore me"}
        ]);

        let request = FollowupRequest::from_json(&raw).unwrap();
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[0].role, Role::User);
        assert_eq!(request.history[1].role, Role::Assistant);
    }

    #[test]
    fn test_summary_messages_embed_figures_and_score() {
        let snapshot = SnapshotPayload::from_json(&payload()).unwrap();
        let health = health_score(&snapshot.months, &ScoreOptions::default());
        let messages = build_summary_messages(&snapshot, &health);

        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("$3,000.00"));
        assert!(messages[0].content.contains("2025-03"));
        assert!(messages[0].content.contains("Financial health score"));
        assert!(messages[0].content.contains("Vacation"));
    }

    #[test]
    fn test_followup_messages_end_with_question() {
        let mut raw = payload();
        raw["question"] = json!("Can I afford the vacation?");
        raw["history"] = json!([{"role": "user", "content": "hi"}]);

        let request = FollowupRequest::from_json(&raw).unwrap();
        let health = health_score(&request.snapshot.months, &ScoreOptions::default());
        let messages = build_followup_messages(&request, &health);

        assert_eq!(messages.len(), 2);
        assert!(messages.last().unwrap().content.ends_with("Can I afford the vacation?"));
    }
}
