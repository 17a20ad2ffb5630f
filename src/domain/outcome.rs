use serde::Serialize;

/// Structured result handed to external consumers.
///
/// Every run ends in one of these, success or not, so a consumer never has to
/// tell a partial result from a complete one by inspecting the payload.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Outcome {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// A failed run. The message is the full error chain.
    pub fn failure(err: &anyhow::Error) -> Self {
        Outcome {
            success: false,
            message: format!("{err:#}"),
            data: None,
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}
