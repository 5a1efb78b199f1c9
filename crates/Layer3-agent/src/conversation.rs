//! Conversation buffer - 세션 하나의 최근 대화
//!
//! 최대 `max_messages`개만 보관하고 (앞에서부터 버림), LLM 컨텍스트로
//! 렌더링할 때만 메시지를 `max_content_len` 문자로 자릅니다. 저장된 내용은
//! 잘리지 않습니다.
//!
//! 세션마다 하나씩 쓰는 단일 writer 구조라 내부 잠금이 없습니다.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use steward_foundation::{ConversationConfig, Error, Result};
use tracing::debug;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// `"<role>: <content>"` 한 줄, 내용은 `max_chars` 문자로 자른 뒤 trim
    ///
    /// 잘라낸 내용이 비어 있으면 None
    fn render(&self, max_chars: usize) -> Option<String> {
        let truncated: String = self.content.chars().take(max_chars).collect();
        let content = truncated.trim();
        if content.is_empty() {
            return None;
        }
        Some(format!("{}: {}", self.role, content))
    }
}

/// Bounded conversation history
#[derive(Debug, Clone)]
pub struct ConversationBuffer {
    messages: VecDeque<Message>,
    max_messages: usize,
    max_content_len: usize,
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        let config = ConversationConfig::default();
        Self {
            messages: VecDeque::with_capacity(config.max_messages),
            max_messages: config.max_messages,
            max_content_len: config.max_content_len,
        }
    }
}

impl ConversationBuffer {
    /// `max_messages == 0`이면 `Error::Config`
    pub fn new(max_messages: usize, max_content_len: usize) -> Result<Self> {
        if max_messages == 0 {
            return Err(Error::Config(
                "conversation maxMessages must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            messages: VecDeque::with_capacity(max_messages),
            max_messages,
            max_content_len,
        })
    }

    pub fn from_config(config: &ConversationConfig) -> Result<Self> {
        Self::new(config.max_messages, config.max_content_len)
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn max_content_len(&self) -> usize {
        self.max_content_len
    }

    // ========================================================================
    // Append
    // ========================================================================

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// 메시지 추가 후 앞에서부터 초과분 제거
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        let mut dropped = 0;
        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            debug!(dropped, kept = self.messages.len(), "Conversation trimmed");
        }
    }

    /// 모델 응답 기록
    ///
    /// 응답이 있으면 assistant 메시지로 추가하고 그대로 돌려줍니다.
    /// 없으면 아무것도 추가하지 않습니다.
    pub fn record_response(&mut self, response: Option<String>) -> Option<String> {
        let response = response?;
        self.append_assistant(response.clone());
        Some(response)
    }

    // ========================================================================
    // Render
    // ========================================================================

    /// LLM 프롬프트용 대화 컨텍스트
    ///
    /// 마지막 `exclude_last`개 메시지를 빼고 나머지를 `"<role>: <content>"`
    /// 줄로 이어 붙입니다. 방금 추가한 사용자 입력을 프롬프트에 따로 넣을 때
    /// `exclude_last = 1`을 씁니다.
    pub fn context_for_llm(&self, exclude_last: usize) -> String {
        let end = self.messages.len().saturating_sub(exclude_last);
        let start = end.saturating_sub(self.max_messages);

        self.messages
            .range(start..end)
            .filter_map(|m| m.render(self.max_content_len))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// 보관 중인 메시지 (오래된 순)
    pub fn messages(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_from_front() {
        let mut buffer = ConversationBuffer::new(3, 500).unwrap();
        for i in 0..5 {
            buffer.append_user(format!("m{}", i));
        }
        assert_eq!(buffer.len(), 3);
        let contents: Vec<_> = buffer.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ConversationBuffer::new(0, 500).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_context_renders_roles() {
        let mut buffer = ConversationBuffer::default();
        buffer.append_user("Why did EX-2025-001 fail?");
        buffer.append_assistant("Insufficient funds.");
        assert_eq!(
            buffer.context_for_llm(0),
            "user: Why did EX-2025-001 fail?\nassistant: Insufficient funds."
        );
    }

    #[test]
    fn test_context_excludes_last() {
        let mut buffer = ConversationBuffer::default();
        buffer.append_user("first");
        buffer.append_assistant("reply");
        buffer.append_user("current question");

        assert_eq!(buffer.context_for_llm(1), "user: first\nassistant: reply");
        assert_eq!(buffer.context_for_llm(3), "");
        assert_eq!(buffer.context_for_llm(10), "");
    }

    #[test]
    fn test_context_truncates_by_chars_without_mutating() {
        let mut buffer = ConversationBuffer::new(10, 3).unwrap();
        buffer.append_user("결제 실패 원인");
        assert_eq!(buffer.context_for_llm(0), "user: 결제");
        assert_eq!(buffer.last().unwrap().content, "결제 실패 원인");
    }

    #[test]
    fn test_context_skips_blank_messages() {
        let mut buffer = ConversationBuffer::default();
        buffer.append_user("   ");
        buffer.append_assistant("");
        buffer.append_user("  retry?  ");
        assert_eq!(buffer.context_for_llm(0), "user: retry?");
    }

    #[test]
    fn test_record_response() {
        let mut buffer = ConversationBuffer::default();
        buffer.append_user("hello");

        assert_eq!(buffer.record_response(None), None);
        assert_eq!(buffer.len(), 1);

        assert_eq!(buffer.record_response(Some("hi".into())).as_deref(), Some("hi"));
        assert_eq!(buffer.last(), Some(&Message::assistant("hi")));
    }

    #[test]
    fn test_from_config_and_clear() {
        let config = ConversationConfig {
            max_messages: 2,
            max_content_len: 50,
        };
        let mut buffer = ConversationBuffer::from_config(&config).unwrap();
        buffer.append_user("a");
        buffer.append_assistant("b");
        buffer.append_user("c");
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.max_content_len(), 50);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.context_for_llm(0), "");
    }
}
