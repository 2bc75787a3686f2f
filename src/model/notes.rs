use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A piece of text that ends up in the notes field of an exported task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoteEntry {
    Description {
        text: String,
    },
    Topic {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        created: NaiveDateTime,
        #[serde(default)]
        children: Vec<NoteEntry>,
    },
    Message {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        created: NaiveDateTime,
    },
    TopicAttachment {
        file_name: String,
        created: NaiveDateTime,
    },
    MessageAttachment {
        file_name: String,
        created: NaiveDateTime,
    },
}

impl NoteEntry {
    pub fn description(text: impl Into<String>) -> Self {
        NoteEntry::Description { text: text.into() }
    }

    pub fn display_value(&self) -> String {
        match self {
            NoteEntry::Description { text } => text.clone(),
            NoteEntry::Topic {
                text,
                created,
                children,
            } => {
                let mut lines = vec![format!(
                    "{} Topic: {}",
                    created.format(TIMESTAMP_FORMAT),
                    text.as_deref().unwrap_or_default()
                )];
                for child in children {
                    lines.push(format!("  {}", child.display_value()));
                }
                lines.join("\n")
            }
            NoteEntry::Message { text, created } => format!(
                "{} Message: {}",
                created.format(TIMESTAMP_FORMAT),
                text.as_deref().unwrap_or_default()
            ),
            NoteEntry::TopicAttachment { file_name, created }
            | NoteEntry::MessageAttachment { file_name, created } => {
                format!("{} Attachment: {}", created.format(TIMESTAMP_FORMAT), file_name)
            }
        }
    }
}
