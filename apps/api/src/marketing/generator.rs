use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::context_block;
use crate::llm_client::{CompletionRequest, CompletionService, Message};
use crate::marketing::parser::parse_plan;
use crate::marketing::prompts::{marketing_plan_system_prompt, marketing_plan_user_prompt};
use crate::models::knowledge::KnowledgeBase;
use crate::models::marketing::MarketingPlan;
use crate::models::profile::UserProfile;
use crate::prompting::formatter::{format_knowledge_base, format_profile};

const MARKETING_TEMPERATURE: f32 = 0.7;
const MARKETING_MAX_TOKENS: u32 = 1000;

/// One completion call, then best-effort parsing of the reply.
///
/// Upstream failures are errors. A reply that cannot be parsed is not: it
/// yields a plan with empty fields.
pub async fn generate_plan(
    completion: &dyn CompletionService,
    prompt_text: &str,
    profile: &UserProfile,
    knowledge_base: &KnowledgeBase,
) -> Result<MarketingPlan, AppError> {
    let context = context_block(&format_profile(profile), &format_knowledge_base(knowledge_base));
    let request = CompletionRequest {
        messages: vec![
            Message::system(marketing_plan_system_prompt()),
            Message::user(marketing_plan_user_prompt(prompt_text, &context)),
        ],
        temperature: MARKETING_TEMPERATURE,
        max_tokens: MARKETING_MAX_TOKENS,
    };

    let reply = completion.complete(&request).await.map_err(|e| {
        error!("Marketing plan completion failed: {e}");
        AppError::Llm(format!("Marketing plan generation failed: {e}"))
    })?;

    let fields = parse_plan(&reply);
    if fields.is_empty() {
        info!("Marketing plan reply had no recognizable fields; returning empty plan");
    }

    Ok(MarketingPlan {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        best_products: fields.best_products,
        marketing_technique: fields.marketing_technique,
        conversation_starter: fields.conversation_starter,
        conversation_sequence: fields.conversation_sequence,
        user_profile: profile.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCompletion;
    use crate::llm_client::Role;
    use crate::models::profile::IncomeLevel;

    #[tokio::test]
    async fn test_request_carries_prompt_profile_and_knowledge_base() {
        let llm = ScriptedCompletion::replying(&[r#"{"bestProducts": ["eMAS"]}"#]);
        let profile = UserProfile {
            income_level: IncomeLevel::High,
            ..UserProfile::default()
        };
        let plan = generate_plan(&llm, "Sell gold.", &profile, &KnowledgeBase::default())
            .await
            .unwrap();
        assert_eq!(plan.best_products, vec!["eMAS"]);
        assert_eq!(plan.user_profile, profile);

        let request = llm.last_request().unwrap();
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        let user = &request.messages[1].content;
        assert!(user.starts_with("Sell gold."));
        assert!(user.contains("- Income Level: High"));
        assert!(user.contains("## Reksa Dana"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_gives_empty_plan() {
        let llm = ScriptedCompletion::replying(&["Sorry, no plan today."]);
        let plan = generate_plan(&llm, "p", &UserProfile::default(), &KnowledgeBase::default())
            .await
            .unwrap();
        assert!(plan.best_products.is_empty());
        assert!(plan.marketing_technique.is_empty());
        assert!(plan.conversation_sequence.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_generation_error() {
        let llm = ScriptedCompletion::failing(500);
        let err = generate_plan(&llm, "p", &UserProfile::default(), &KnowledgeBase::default())
            .await
            .unwrap_err();
        match err {
            AppError::Llm(msg) => assert!(msg.starts_with("Marketing plan generation failed")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
