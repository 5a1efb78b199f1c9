//! `steward demo` - 결제 재시도 시나리오를 거버넌스 경로 전체로 실행
//!
//! 조회 도구와 재시도 도구는 로컬 스텁이며 재시도 도구에는
//! `payments/retry` 정책이 연결됩니다.

use crate::cli::load_policies;
use crate::DemoArgs;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use steward_agent::{AgentDefinition, ConversationBuffer, GovernedAgent};
use steward_foundation::{AuditStore, KillSwitch, StewardConfig};
use steward_policy::PAYMENTS_RETRY;
use steward_tool::{FnTool, RiskTier, ToolDefinition, ToolRegistry};
use tracing::info;

const AGENT_ID: &str = "payment_failed";
const EXCEPTION_ID: &str = "EX-2025-001";

fn demo_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(
        Arc::new(FnTool::new("get_payment_exception", |input: Value| async move {
            Ok(json!({
                "exception_id": input["exception_id"],
                "reason": "insufficient_funds",
                "status": "failed",
            })
            .to_string())
        })),
        ToolDefinition::new("get_payment_exception")
            .with_domain("payments")
            .with_description("Fetch a payment exception")
            .with_data_source("payments_db"),
    );
    registry.register(
        Arc::new(FnTool::new("execute_payment_retry", |input: Value| async move {
            Ok(json!({
                "exception_id": input["exception_id"],
                "status": "retry_scheduled",
            })
            .to_string())
        })),
        ToolDefinition::new("execute_payment_retry")
            .with_domain("payments")
            .with_description("Schedule a retry for a failed payment")
            .with_risk_tier(RiskTier::High)
            .with_human_approval(false),
    );
    registry
}

fn demo_agent(config: &StewardConfig) -> AgentDefinition {
    AgentDefinition::new(AGENT_ID)
        .with_domain("payments")
        .with_goal("Investigate failed payments and retry them when policy allows")
        .with_model(config.models.auto_default.clone())
        .with_tool("get_payment_exception")
        .with_tool("execute_payment_retry")
        .with_tool_policy("execute_payment_retry", PAYMENTS_RETRY)
}

pub async fn run(config: &StewardConfig, args: DemoArgs) -> Result<()> {
    let mut audit_config = config.audit.clone();
    if let Some(path) = args.audit_log {
        audit_config = audit_config.with_mirror(path);
    }
    let audit = Arc::new(AuditStore::new(&audit_config).context("Failed to open audit store")?);
    let policies = Arc::new(load_policies(config, None)?);
    let kill_switch = Arc::new(KillSwitch::new().with_auto_model(config.models.auto_default.clone()));

    if args.disable_agent {
        kill_switch.disable_agent(AGENT_ID);
    }

    let agent = match GovernedAgent::new(
        demo_agent(config),
        Arc::new(demo_tools()),
        policies,
        Arc::clone(&audit),
        Arc::clone(&kill_switch),
    ) {
        Ok(agent) => agent,
        Err(e) if e.is_disabled() => {
            println!("✗ {}", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let mut agent = agent.with_conversation(ConversationBuffer::from_config(&config.conversation)?);
    info!(agent_id = AGENT_ID, "Demo agent started");

    let lookup = agent
        .handle_tool_turn(
            format!("Why did {} fail?", EXCEPTION_ID),
            "get_payment_exception",
            json!({ "exception_id": EXCEPTION_ID }),
        )
        .await?;
    println!("\n[lookup] {}", lookup.unwrap_or_default());

    let input = json!({
        "exception_id": EXCEPTION_ID,
        "amount": args.amount,
        "previous_retries": args.retries,
        "escalation_requested": args.escalate,
    });
    let retry = agent
        .handle_tool_turn("Retry the payment", "execute_payment_retry", input)
        .await?;
    println!("[retry]  {}", retry.unwrap_or_default());

    println!("\nConversation:");
    println!("{}", agent.conversation().context_for_llm(0));

    println!("\nAudit trail (oldest first):");
    for entry in agent.audit_trail(usize::MAX).iter().rev() {
        println!("  {:<14} {}", entry.event_type, entry.payload);
    }

    audit.shutdown();
    Ok(())
}
