//! User notifications.
//!
//! Notifications are fire-and-forget: delivery failure is logged and never
//! affects the booking that triggered it. Every lifecycle event fans out
//! to both sides of the booking: the customer gets it over message and
//! push, the merchant over message.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    Customer,
    Merchant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Message,
    Push,
}

/// A lifecycle event addressed to one recipient on one channel.
#[derive(Debug, Serialize)]
pub struct NotifyEvent {
    pub event: &'static str,
    pub booking_id: i64,
    pub recipient: Recipient,
    pub recipient_id: i64,
    pub channel: Channel,
    pub details: Value,
}

/// Expand one lifecycle event into the per-recipient deliveries.
///
/// The merchant leg is skipped when the store lookup failed; losing a
/// merchant notification is preferable to losing the customer's.
pub fn fanout(
    event: &'static str,
    booking_id: i64,
    customer_id: i64,
    merchant_id: Option<i64>,
    details: Value,
) -> Vec<NotifyEvent> {
    let mut events = vec![
        NotifyEvent {
            event,
            booking_id,
            recipient: Recipient::Customer,
            recipient_id: customer_id,
            channel: Channel::Message,
            details: details.clone(),
        },
        NotifyEvent {
            event,
            booking_id,
            recipient: Recipient::Customer,
            recipient_id: customer_id,
            channel: Channel::Push,
            details: details.clone(),
        },
    ];
    if let Some(merchant_id) = merchant_id {
        events.push(NotifyEvent {
            event,
            booking_id,
            recipient: Recipient::Merchant,
            recipient_id: merchant_id,
            channel: Channel::Message,
            details,
        });
    }
    events
}

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl Notifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// Deliver an event to the notification webhook, or log it when none
    /// is configured.
    pub async fn send(&self, event: NotifyEvent) {
        if self.webhook_url.is_empty() {
            tracing::info!(
                event = event.event,
                booking_id = event.booking_id,
                recipient = ?event.recipient,
                channel = ?event.channel,
                "Notification (no webhook configured)"
            );
            return;
        }

        let result = self
            .client
            .post(&self.webhook_url)
            .json(&event)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(event = event.event, booking_id = event.booking_id, "Notification delivered");
            }
            Ok(resp) => {
                tracing::warn!(
                    event = event.event,
                    booking_id = event.booking_id,
                    status = %resp.status(),
                    "Notification webhook rejected event"
                );
            }
            Err(e) => {
                tracing::warn!(
                    event = event.event,
                    booking_id = event.booking_id,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_reach_customer_and_merchant() {
        let events = fanout("booking.cancelled", 42, 7, Some(9), json!({ "reason": "rain" }));
        let legs: Vec<(Recipient, Channel, i64)> = events
            .iter()
            .map(|e| (e.recipient, e.channel, e.recipient_id))
            .collect();
        assert_eq!(
            legs,
            vec![
                (Recipient::Customer, Channel::Message, 7),
                (Recipient::Customer, Channel::Push, 7),
                (Recipient::Merchant, Channel::Message, 9),
            ]
        );
        assert!(events.iter().all(|e| e.event == "booking.cancelled"));
        assert!(events.iter().all(|e| e.details["reason"] == "rain"));
    }

    #[test]
    fn merchant_leg_is_skipped_without_a_merchant() {
        let events = fanout("booking.confirmed", 1, 7, None, serde_json::Value::Null);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.recipient == Recipient::Customer));
    }
}
