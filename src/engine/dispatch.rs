//! Alert dispatch: turn an alert decision into deduplicated notification
//! sends.
//!
//! Every send is attempted independently; a notifier failure is recorded in
//! the result and logged, never propagated. Dedup is scoped to one dispatch
//! call (the event's recipient list) — repeat alerts across ingestion calls
//! are intentional.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::AlertDecision;
use crate::models::{AlertEvent, Tank};
use crate::notify::Notifier;

// ---

/// One failed delivery attempt, kept for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchFailure {
    pub address: String,
    pub reason: String,
}

/// Outcome of a dispatch call: the ephemeral event plus per-recipient
/// delivery results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    // ---
    pub event: AlertEvent,
    pub delivered: Vec<String>,
    pub failed: Vec<DispatchFailure>,
}

// ---

/// Dispatch an alert decision for a tank.
///
/// Recipients are the fixed operations address plus the tank's registered
/// contact when present and different. An absent contact address is a
/// no-op, not an error. The message carries the tank id, the rule that
/// fired, the measured values, and the capture timestamp.
pub async fn dispatch<N: Notifier>(
    notifier: &N,
    decision: &AlertDecision,
    tank: &Tank,
    ops_address: &str,
    fired_at: DateTime<Utc>,
) -> DispatchResult {
    // ---
    let mut recipients: Vec<String> = Vec::with_capacity(2);
    if !ops_address.is_empty() {
        recipients.push(ops_address.to_string());
    }
    if let Some(contact) = tank.contact_email.as_deref() {
        if !contact.is_empty() && !recipients.iter().any(|r| r == contact) {
            recipients.push(contact.to_string());
        }
    }

    let event = AlertEvent {
        id: Uuid::new_v4(),
        tank_id: tank.tank_id.clone(),
        rule: decision.rule(),
        severity: decision.severity(),
        recipients,
        fired_at,
    };

    let subject = format!(
        "[{}] {} alert for tank {}",
        event.severity, event.rule, event.tank_id
    );
    let body = format!(
        "Tank {}: {} at {}",
        event.tank_id,
        decision.describe(),
        event.fired_at.to_rfc3339()
    );

    let mut delivered = Vec::new();
    let mut failed = Vec::new();
    for address in &event.recipients {
        match notifier.send(address, &subject, &body).await {
            Ok(()) => delivered.push(address.clone()),
            Err(e) => {
                // Recovered locally: the write that triggered this alert has
                // already succeeded and must stay successful.
                tracing::warn!(
                    tank_id = %event.tank_id,
                    rule = event.rule,
                    address = %address,
                    error = %e,
                    "alert notification failed"
                );
                failed.push(DispatchFailure {
                    address: address.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    DispatchResult {
        event,
        delivered,
        failed,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::EngineError;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Records sends; fails for addresses listed in `fail_for`.
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String, String)>>,
        fail_for: Vec<String>,
    }

    impl RecordingNotifier {
        fn new(fail_for: &[&str]) -> Self {
            RecordingNotifier {
                sent: Mutex::new(Vec::new()),
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(
            &self,
            address: &str,
            subject: &str,
            body: &str,
        ) -> impl std::future::Future<Output = Result<(), EngineError>> + Send {
            let fail = self.fail_for.iter().any(|f| f == address);
            if !fail {
                self.sent.lock().unwrap().push((
                    address.to_string(),
                    subject.to_string(),
                    body.to_string(),
                ));
            }
            async move {
                if fail {
                    Err(EngineError::notification("smtp relay refused connection"))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn tank(contact: Option<&str>) -> Tank {
        Tank {
            tank_id: "tank-9".to_string(),
            capacity_liters: 1000.0,
            contact_email: contact.map(|s| s.to_string()),
        }
    }

    fn low_level_decision() -> AlertDecision {
        AlertDecision::LowLevel {
            current_level: 120.0,
            capacity: 1000.0,
            percentage: 12.0,
        }
    }

    fn fired_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 7, 15, 0).unwrap()
    }

    #[test]
    fn test_notifies_ops_and_contact_independently() {
        // ---
        let notifier = RecordingNotifier::new(&[]);
        let result = tokio_test::block_on(dispatch(
            &notifier,
            &low_level_decision(),
            &tank(Some("seller@example.com")),
            "ops@example.com",
            fired_at(),
        ));

        assert_eq!(
            result.delivered,
            vec!["ops@example.com", "seller@example.com"]
        );
        assert!(result.failed.is_empty());
    }

    #[test]
    fn test_contact_matching_ops_address_is_deduplicated() {
        // ---
        let notifier = RecordingNotifier::new(&[]);
        let result = tokio_test::block_on(dispatch(
            &notifier,
            &low_level_decision(),
            &tank(Some("ops@example.com")),
            "ops@example.com",
            fired_at(),
        ));

        assert_eq!(result.event.recipients, vec!["ops@example.com"]);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_absent_contact_is_a_noop() {
        // ---
        let notifier = RecordingNotifier::new(&[]);
        let result = tokio_test::block_on(dispatch(
            &notifier,
            &low_level_decision(),
            &tank(None),
            "ops@example.com",
            fired_at(),
        ));

        assert_eq!(result.delivered, vec!["ops@example.com"]);
        assert!(result.failed.is_empty());
    }

    #[test]
    fn test_one_failing_recipient_does_not_stop_the_other() {
        // ---
        let notifier = RecordingNotifier::new(&["ops@example.com"]);
        let result = tokio_test::block_on(dispatch(
            &notifier,
            &low_level_decision(),
            &tank(Some("seller@example.com")),
            "ops@example.com",
            fired_at(),
        ));

        assert_eq!(result.delivered, vec!["seller@example.com"]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].address, "ops@example.com");
    }

    #[test]
    fn test_message_carries_tank_rule_values_and_timestamp() {
        // ---
        let notifier = RecordingNotifier::new(&[]);
        tokio_test::block_on(dispatch(
            &notifier,
            &low_level_decision(),
            &tank(None),
            "ops@example.com",
            fired_at(),
        ));

        let sent = notifier.sent.lock().unwrap();
        let (_, subject, body) = &sent[0];
        assert!(subject.contains("tank-9"));
        assert!(subject.contains("low_level"));
        assert!(subject.contains("warning"));
        assert!(body.contains("120.0 L"));
        assert!(body.contains("12.0%"));
        assert!(body.contains("2025-06-10T07:15:00"));
    }
}
