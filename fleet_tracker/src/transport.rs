use locator::transport::{ReplySender, Transport, Visibility};
use tracing::{debug, info, warn};

/// A cloud link that only exists in this process.
///
/// Published events are logged. If a network reply is configured, it is
/// answered to every subscriber of `hook-response/<event>` as the webhook
/// of the geolocation service would.
pub struct SimulatedTransport {
    connected: bool,
    network_reply: Option<String>,
    subscriptions: Vec<(String, ReplySender)>,
}

impl SimulatedTransport {
    pub fn new(connected: bool, network_reply: Option<String>) -> Self {
        SimulatedTransport {
            connected,
            network_reply,
            subscriptions: Vec::new(),
        }
    }

    fn answer(&mut self, event_name: &str, reply: &str) {
        let response_topic = format!("hook-response/{event_name}");
        self.subscriptions.retain(|(topic, handler)| {
            if !topic.starts_with(&response_topic) {
                return true;
            }
            debug!("Answering {topic} with {reply}");
            match handler.send(reply.to_string()) {
                Ok(()) => true,
                Err(_) => {
                    warn!("Subscriber of {topic} is gone");
                    false
                }
            }
        });
    }
}

impl Transport for SimulatedTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, event_name: &str, payload: &str, visibility: Visibility) -> bool {
        if !self.connected {
            return false;
        }
        info!("Publish {event_name} ({visibility:?}): {payload}");
        if let Some(reply) = self.network_reply.clone() {
            self.answer(event_name, &reply);
        }
        true
    }

    fn subscribe(&mut self, topic: &str, handler: ReplySender) -> bool {
        debug!("Subscribed to {topic}");
        self.subscriptions.push((topic.to_string(), handler));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test_log::test]
    fn answers_subscribers_of_the_response_topic() {
        let mut transport = SimulatedTransport::new(true, Some("1.5,2.5,30".to_string()));
        let (locator_sender, locator_replies) = channel();
        let (other_sender, other_replies) = channel();
        transport.subscribe("hook-response/deviceLocator/e00fce68", locator_sender);
        transport.subscribe("hook-response/other", other_sender);

        assert!(transport.publish("deviceLocator", "{}", Visibility::Private));

        assert_eq!(locator_replies.try_recv().unwrap(), "1.5,2.5,30");
        assert!(other_replies.try_recv().is_err());
    }

    #[test_log::test]
    fn offline_transport_refuses_to_publish() {
        let mut transport = SimulatedTransport::new(false, Some("1.5,2.5,30".to_string()));
        let (sender, replies) = channel();
        transport.subscribe("hook-response/deviceLocator", sender);

        assert!(!transport.is_connected());
        assert!(!transport.publish("deviceLocator", "{}", Visibility::Private));
        assert!(replies.try_recv().is_err());
    }
}
