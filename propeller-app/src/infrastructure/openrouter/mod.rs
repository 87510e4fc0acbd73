mod client;
pub mod prompt;
mod types;

pub use client::{OpenRouterClient, TEXT_MODEL, TITLE_MODEL, VISION_MODEL};
pub use types::{
    ChatCompletionRequest, ContentPart, ImageUrl, Message, MessageContent,
};
