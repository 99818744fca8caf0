//! Prompts and request/response helpers for the chat completions API.
//!
//! Wire types come from `async-openai`; only the conversation is built here.

use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};

/// Fixes the output format of the suggestion model.
pub const SYSTEM_PROMPT: &str = "You are a professional social media marketing consultant.

Rules:
- Do NOT ask questions.
- Do NOT mention AI.
- Do NOT add explanations.
- Only provide improvement suggestions.
- Keep suggestions short and direct.
- Return exactly 5 bullet points.";

/// Wrap extracted text in the user instruction. The text is embedded verbatim.
pub fn user_prompt(text: &str) -> String {
    format!("Analyze this social media post and give 5 short improvement suggestions:\n\n{text}")
}

/// The fixed system + user conversation for one suggestion request.
pub fn suggestion_request(model: &str, text: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt(text))
                .build()?
                .into(),
        ])
        .build()
}

/// Content of the first choice, if any.
pub fn first_content(response: CreateChatCompletionResponse) -> Option<String> {
    response.choices.into_iter().next().and_then(|choice| choice.message.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(choices: serde_json::Value) -> CreateChatCompletionResponse {
        serde_json::from_value(json!({
            "id": "gen-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "some/model",
            "choices": choices
        }))
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = suggestion_request("some/model", "my post").unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "some/model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(
            value["messages"][1]["content"],
            "Analyze this social media post and give 5 short improvement suggestions:\n\nmy post"
        );
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
        assert!(value.get("stream").is_none());
    }

    #[test]
    fn test_first_choice_only() {
        let response = response(json!([
            {"index": 0, "message": {"role": "assistant", "content": "- first"}, "finish_reason": "stop"},
            {"index": 1, "message": {"role": "assistant", "content": "- second"}, "finish_reason": "stop"}
        ]));

        assert_eq!(first_content(response).as_deref(), Some("- first"));
    }

    #[test]
    fn test_no_choices() {
        assert_eq!(first_content(response(json!([]))), None);
    }

    #[test]
    fn test_null_content() {
        let response = response(json!([
            {"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "length"}
        ]));

        assert_eq!(first_content(response), None);
    }
}
