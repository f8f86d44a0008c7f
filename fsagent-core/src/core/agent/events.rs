use serde_json::Value;

/// Observer for progress inside a turn. All methods default to no-ops.
pub trait TurnEvents: Send {
    /// A model request is about to be sent
    fn on_request_start(&mut self) {}

    /// The model request finished, successfully or not
    fn on_request_end(&mut self) {}

    /// Text the model sent alongside tool calls
    fn on_assistant_note(&mut self, _text: &str) {}

    fn on_tool_call(&mut self, _name: &str, _arguments: &str) {}

    fn on_tool_result(&mut self, _name: &str, _result: &Value) {}
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl TurnEvents for NoopEvents {}
