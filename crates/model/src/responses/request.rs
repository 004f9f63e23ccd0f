//! Request body for the Responses API.

use super::Responses;
use sbcore::{AttachmentKind, Prompt, registry};
use serde::Serialize;

/// The Responses API accepts no other temperature for the models routed
/// here.
pub const TEMPERATURE: f64 = 1.0;

#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub model: String,
    /// System turn, history, then the new user turn.
    pub input: Vec<InputItem>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputItem {
    pub role: &'static str,
    pub content: InputContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputContent {
    Text(String),
    Parts(Vec<InputPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText { text: String },
    InputImage { image_url: String },
}

impl Responses {
    /// Build the request body for a turn.
    pub fn request(&self, prompt: &Prompt, stream: bool) -> Request {
        let model = self.base.model(prompt.model.as_deref());
        let params = self.base.parameters();

        let mut input = vec![InputItem {
            role: "system",
            content: InputContent::Text(self.base.system_prompt().to_owned()),
        }];
        input.extend(
            self.base
                .format_history(&prompt.history, prompt.resumption.as_ref())
                .into_iter()
                .map(|turn| InputItem {
                    role: turn.role.as_str(),
                    content: InputContent::Text(turn.content),
                }),
        );

        let images: Vec<_> = if registry::profile(&model).vision {
            prompt
                .attachments
                .iter()
                .filter(|a| a.kind == AttachmentKind::Image)
                .filter_map(|a| a.data_uri())
                .map(|image_url| InputPart::InputImage { image_url })
                .collect()
        } else {
            Vec::new()
        };
        let text = prompt.message.content.clone();
        let content = if images.is_empty() {
            InputContent::Text(text)
        } else {
            let mut parts = vec![InputPart::InputText { text }];
            parts.extend(images);
            InputContent::Parts(parts)
        };
        input.push(InputItem {
            role: "user",
            content,
        });

        Request {
            model,
            input,
            temperature: TEMPERATURE,
            max_output_tokens: params.max_tokens,
            top_p: params.top_p,
            stream,
        }
    }
}
