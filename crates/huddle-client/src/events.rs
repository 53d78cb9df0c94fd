use serde::Serialize;
use tokio::sync::broadcast;

pub const EVENT_SERVER_VERSION_CHANGED: &str = "server-version-changed";

/// Out-of-band notifications raised while talking to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// A response carried an `X-Version-Id` different from the last one
    /// seen. Consumers usually prompt for a reload.
    ServerVersionChanged { version: String },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::ServerVersionChanged { .. } => EVENT_SERVER_VERSION_CHANGED,
        }
    }
}

pub fn emit_event(tx: &broadcast::Sender<ClientEvent>, event: ClientEvent) {
    let name = event.name();
    if tx.send(event).is_err() {
        tracing::debug!(event = name, "No subscribers for event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ClientEvent::ServerVersionChanged {
            version: "4.8.0".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "server-version-changed");
        assert_eq!(json["version"], "4.8.0");
        assert_eq!(event.name(), EVENT_SERVER_VERSION_CHANGED);
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let (tx, _) = broadcast::channel(4);
        emit_event(
            &tx,
            ClientEvent::ServerVersionChanged {
                version: "1".into(),
            },
        );

        let mut rx = tx.subscribe();
        emit_event(
            &tx,
            ClientEvent::ServerVersionChanged {
                version: "2".into(),
            },
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::ServerVersionChanged {
                version: "2".into()
            }
        );
    }
}
