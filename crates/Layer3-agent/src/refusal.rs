//! 거버넌스 거절 → 사용자에게 보여줄 메시지
//!
//! 거버넌스 실패로 세션을 끊지 않고 응답으로 돌려주기 위한 변환입니다.
//! 그 밖의 에러는 None이며 호출자가 그대로 전파합니다.

use steward_foundation::Error;

/// 거절 메시지 (거버넌스 에러가 아니면 None)
pub fn refusal_message(error: &Error) -> Option<String> {
    let message = match error {
        Error::AgentDisabled(agent) => format!(
            "Agent '{}' is currently disabled by an operator. Please try again later.",
            agent
        ),
        Error::ModelDisabled(model) => format!(
            "The model '{}' is currently disabled. No action was taken.",
            model
        ),
        Error::PolicyDenied { policy, reason } => format!(
            "This action was blocked by policy '{}' ({}).",
            policy, reason
        ),
        Error::PolicyNotFound(policy) => format!(
            "This action requires policy '{}', which is not available. No action was taken.",
            policy
        ),
        Error::ToolNotAllowed { tool, .. } => {
            format!("I'm not permitted to use the tool '{}'.", tool)
        }
        Error::ToolNotFound(tool) => format!("The tool '{}' is not available right now.", tool),
        _ => return None,
    };
    Some(message)
}

/// 감사 기록용 거절 분류
pub(crate) fn refusal_kind(error: &Error) -> Option<&'static str> {
    match error {
        Error::AgentDisabled(_) => Some("agent_disabled"),
        Error::ModelDisabled(_) => Some("model_disabled"),
        Error::PolicyDenied { .. } => Some("policy_denied"),
        Error::PolicyNotFound(_) => Some("policy_not_found"),
        Error::ToolNotAllowed { .. } => Some("tool_not_allowed"),
        Error::ToolNotFound(_) => Some("tool_not_found"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governance_errors_have_messages() {
        let cases = [
            Error::AgentDisabled("payment_failed".into()),
            Error::ModelDisabled("gemini-2.5-flash".into()),
            Error::policy_denied("payments/retry", "amount_limit_exceeded"),
            Error::PolicyNotFound("payments/unknown".into()),
            Error::tool_not_allowed("restart_instance", "payment_failed"),
            Error::ToolNotFound("suggest_payment_resolution".into()),
        ];
        for error in &cases {
            assert!(refusal_message(error).is_some(), "{:?}", error);
            assert!(refusal_kind(error).is_some(), "{:?}", error);
        }
    }

    #[test]
    fn test_message_names_reason() {
        let message =
            refusal_message(&Error::policy_denied("payments/retry", "retry_limit_exceeded")).unwrap();
        assert!(message.contains("payments/retry"));
        assert!(message.contains("retry_limit_exceeded"));
    }

    #[test]
    fn test_other_errors_pass_through() {
        assert!(refusal_message(&Error::tool_execution("x", "timeout")).is_none());
        assert!(refusal_message(&Error::Internal("boom".into())).is_none());
        assert!(refusal_kind(&Error::Config("bad".into())).is_none());
    }
}
