//! Rendering a remote task result as text

use crate::protocol::{Part, Task};

/// Text of a task's status message, one line group per renderable part.
/// Empty when the task or its status message is absent.
pub fn extract_task_output(task: Option<&Task>) -> String {
    let Some(message) = task.and_then(|t| t.status.message.as_ref()) else {
        return String::new();
    };

    message
        .parts
        .iter()
        .map(part_to_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn part_to_text(part: &Part) -> String {
    match part {
        Part::Text { text } => text.clone(),
        Part::Data { data } => serde_json::to_string_pretty(data).unwrap_or_default(),
        Part::File { file } => format!(
            "Received file content ({}).",
            file.mime_type.as_deref().unwrap_or("unknown mime type")
        ),
    }
}
