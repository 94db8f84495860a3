use greeting_core::actor::UiEvent;

pub const STATE_EVENT: &str = "greeting://state";
pub const REJECTED_EVENT: &str = "greeting://rejected";

#[cfg_attr(not(feature = "desktop"), allow(dead_code))]
pub fn event_name(event: &UiEvent) -> &'static str {
    match event {
        UiEvent::State(_) => STATE_EVENT,
        UiEvent::Rejected { .. } => REJECTED_EVENT,
    }
}

/// Forwards actor events to every webview. Snapshots go out bare; rejections
/// keep their `{type, command, error}` envelope.
#[cfg(feature = "desktop")]
pub struct TauriSink(pub tauri::AppHandle);

#[cfg(feature = "desktop")]
impl greeting_core::actor::EventSink for TauriSink {
    fn emit(&self, event: UiEvent) {
        use tauri::Emitter;

        let name = event_name(&event);
        let sent = match &event {
            UiEvent::State(snapshot) => self.0.emit(name, snapshot),
            UiEvent::Rejected { .. } => self.0.emit(name, &event),
        };
        if let Err(e) = sent {
            tracing::warn!(event = name, error = %e, "failed to emit to webview");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greeting_core::coordinator::Coordinator;
    use greeting_core::error::CoreError;

    #[test]
    fn routes_by_event_kind() {
        let state = UiEvent::State(Coordinator::default().snapshot());
        assert_eq!(event_name(&state), "greeting://state");

        let rejected = UiEvent::Rejected {
            command: "submit_greeting",
            error: CoreError::EmptyGreeting,
        };
        assert_eq!(event_name(&rejected), "greeting://rejected");
    }

    #[test]
    fn rejected_payload_shape() {
        let rejected = UiEvent::Rejected {
            command: "select_profile",
            error: CoreError::NoProfileSelected,
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["type"], "rejected");
        assert_eq!(json["command"], "select_profile");
        assert_eq!(json["error"]["kind"], "no_profile_selected");
    }
}
