//! Provider kind value object.
//!
//! Identifies the vendor behind a participant's capability client. Most
//! vendors expose an OpenAI-compatible chat-completions surface and differ
//! only in endpoint; Anthropic and Gemini speak their own wire formats and
//! get dedicated adapters in the infrastructure layer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Known LLM vendors (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
    DeepSeek,
    Kimi,
    Qwen,
    Zhipu,
    /// Any OpenAI-compatible vendor not listed above; requires an explicit
    /// endpoint on the participant configuration.
    Custom(String),
}

impl ProviderKind {
    /// Stable string tag for this kind
    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Kimi => "kimi",
            ProviderKind::Qwen => "qwen",
            ProviderKind::Zhipu => "zhipu",
            ProviderKind::Custom(s) => s,
        }
    }

    /// Whether this vendor speaks the OpenAI chat-completions wire format.
    pub fn is_chat_completions_compatible(&self) -> bool {
        !matches!(self, ProviderKind::Anthropic | ProviderKind::Gemini)
    }

    /// Default API base URL for chat-completions-compatible vendors.
    ///
    /// `None` for vendors with a dedicated wire format (the adapter owns the
    /// endpoint) and for `Custom`, which must configure one explicitly.
    pub fn default_api_base(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::DeepSeek => Some("https://api.deepseek.com/v1"),
            ProviderKind::Kimi => Some("https://api.moonshot.cn/v1"),
            ProviderKind::Qwen => Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
            ProviderKind::Zhipu => Some("https://open.bigmodel.cn/api/paas/v4"),
            ProviderKind::Anthropic | ProviderKind::Gemini | ProviderKind::Custom(_) => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "anthropic" | "claude" => ProviderKind::Anthropic,
            "openai" => ProviderKind::OpenAi,
            "gemini" => ProviderKind::Gemini,
            "deepseek" => ProviderKind::DeepSeek,
            "kimi" => ProviderKind::Kimi,
            "qwen" => ProviderKind::Qwen,
            "zhipu" => ProviderKind::Zhipu,
            other => ProviderKind::Custom(other.to_string()),
        })
    }
}

impl Serialize for ProviderKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            ProviderKind::Anthropic,
            ProviderKind::OpenAi,
            ProviderKind::Gemini,
            ProviderKind::DeepSeek,
            ProviderKind::Kimi,
            ProviderKind::Qwen,
            ProviderKind::Zhipu,
        ] {
            let parsed: ProviderKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_claude_alias_parses_to_anthropic() {
        let kind: ProviderKind = "claude".parse().unwrap();
        assert_eq!(kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_unknown_kind_becomes_custom() {
        let kind: ProviderKind = "groq".parse().unwrap();
        assert_eq!(kind, ProviderKind::Custom("groq".to_string()));
        assert!(kind.is_chat_completions_compatible());
        assert!(kind.default_api_base().is_none());
    }

    #[test]
    fn test_wire_format_split() {
        assert!(!ProviderKind::Anthropic.is_chat_completions_compatible());
        assert!(!ProviderKind::Gemini.is_chat_completions_compatible());
        assert!(ProviderKind::DeepSeek.is_chat_completions_compatible());
        assert_eq!(
            ProviderKind::Kimi.default_api_base(),
            Some("https://api.moonshot.cn/v1")
        );
    }
}
