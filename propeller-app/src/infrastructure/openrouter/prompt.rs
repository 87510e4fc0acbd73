use super::types::{ContentPart, ImageUrl, MessageContent};

const DEFAULT_LANGUAGE: &str = "en";

pub const TITLE_PROMPT: &str =
    "Generate a short, concise title (2-5 words) for this conversation. Only return the title, nothing else.";

fn language_prompt(language: &str) -> Option<&'static str> {
    let prompt = match language {
        "en" => "You are Propeller, an intelligent and helpful AI assistant. Be concise, accurate, and friendly in your responses. When analyzing images, describe what you see in detail.",
        "es" => "Eres Propeller, un asistente de IA inteligente y servicial. Sé conciso, preciso y amigable en tus respuestas. Responde siempre en español. Cuando analices imágenes, describe lo que ves en detalle.",
        "fr" => "Vous êtes Propeller, un assistant IA intelligent et serviable. Soyez concis, précis et amical dans vos réponses. Répondez toujours en français. Lorsque vous analysez des images, décrivez ce que vous voyez en détail.",
        "de" => "Du bist Propeller, ein intelligenter und hilfreicher KI-Assistent. Sei präzise, genau und freundlich in deinen Antworten. Antworte immer auf Deutsch. Beschreibe beim Analysieren von Bildern detailliert, was du siehst.",
        "zh" => "你是Propeller，一个智能且乐于助人的AI助手。在回答中要简洁、准确和友好。始终用中文回答。分析图像时，详细描述你看到的内容。",
        "ja" => "あなたはPropellerという知的で役立つAIアシスタントです。簡潔で正確、親しみやすい回答を心がけてください。常に日本語で回答してください。画像を分析する際は、見えるものを詳しく説明してください。",
        "hi" => "आप Propeller हैं, एक बुद्धिमान और सहायक AI सहायक। अपने उत्तरों में संक्षिप्त, सटीक और मिलनसार रहें। हमेशा हिंदी में जवाब दें। छवियों का विश्लेषण करते समय, आप जो देखते हैं उसका विस्तार से वर्णन करें।",
        _ => return None,
    };
    Some(prompt)
}

/// A personality prompt wins over the language prompt; unknown languages get English.
pub fn system_prompt(personality_prompt: Option<&str>, language: Option<&str>) -> String {
    if let Some(personality) = personality_prompt.filter(|p| !p.trim().is_empty()) {
        return personality.to_string();
    }

    language
        .and_then(language_prompt)
        .or_else(|| language_prompt(DEFAULT_LANGUAGE))
        .unwrap_or_default()
        .to_string()
}

/// The user's turn: a bare string when it is only text, otherwise text and image parts.
pub fn user_content(text: Option<&str>, image_data_urls: Vec<String>) -> MessageContent {
    let text = text.filter(|t| !t.trim().is_empty());

    if image_data_urls.is_empty() {
        if let Some(text) = text {
            return MessageContent::Text(text.to_string());
        }
    }

    let mut parts = Vec::with_capacity(image_data_urls.len() + 1);
    if let Some(text) = text {
        parts.push(ContentPart::Text {
            text: text.to_string(),
        });
    }
    parts.extend(image_data_urls.into_iter().map(|url| ContentPart::ImageUrl {
        image_url: ImageUrl { url },
    }));
    MessageContent::Parts(parts)
}

pub fn title_request_text(first_message: &str) -> String {
    format!("First message: \"{}\"", first_message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_selection() {
        assert!(system_prompt(None, Some("es")).contains("español"));
        assert!(system_prompt(None, Some("xx")).starts_with("You are Propeller"));
        assert!(system_prompt(None, None).starts_with("You are Propeller"));
        assert_eq!(
            system_prompt(Some("You are a pirate."), Some("fr")),
            "You are a pirate."
        );
        assert!(system_prompt(Some("  "), Some("de")).contains("Deutsch"));
    }

    #[test]
    fn test_user_content_text_only_is_plain() {
        assert_eq!(
            user_content(Some("hello"), vec![]),
            MessageContent::Text("hello".into())
        );
    }

    #[test]
    fn test_user_content_with_images_uses_parts() {
        let content = user_content(Some("look"), vec!["data:image/png;base64,AA==".into()]);
        match content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0], ContentPart::Text { .. }));
                assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
            }
            other => panic!("expected parts, got {:?}", other),
        }

        let content = user_content(Some("   "), vec!["data:image/png;base64,AA==".into()]);
        assert!(matches!(content, MessageContent::Parts(ref parts) if parts.len() == 1));
    }
}
