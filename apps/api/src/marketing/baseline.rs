//! Rule-based plan built from the profile alone, without a model call.

use chrono::Utc;
use uuid::Uuid;

use crate::models::knowledge::ProductKey;
use crate::models::marketing::MarketingPlan;
use crate::models::profile::{BehavioralTrait, IncomeLevel, TraitLevel, UserProfile};

const YOUNG_INVESTOR_AGE: u8 = 40;

const BASELINE_SEQUENCE: [&str; 5] = [
    "Introduce the product and its main benefit",
    "Explain how it specifically addresses their needs based on their profile",
    "Present a success story or testimonial that resonates with their personality type",
    "Address potential objections based on their risk tolerance",
    "Offer a small, easy first step to get started",
];

pub fn baseline_plan(profile: &UserProfile) -> MarketingPlan {
    let best_products = select_products(profile);
    let conversation_starter = match profile.behavioral_trait {
        BehavioralTrait::Saver => "I noticed you're careful with your money. Have you considered how DANA+ could help you grow your savings more effectively?".to_string(),
        BehavioralTrait::Spender => "Wouldn't it be great if some of your spending could actually work for you? Let me show you how our products can help.".to_string(),
        _ => format!(
            "As someone interested in investments, I think you'll appreciate the returns our {} product can offer.",
            best_products[0]
        ),
    };

    MarketingPlan {
        id: Uuid::new_v4(),
        timestamp: Utc::now(),
        marketing_technique: select_technique(profile).to_string(),
        conversation_starter,
        conversation_sequence: BASELINE_SEQUENCE.iter().map(|s| s.to_string()).collect(),
        best_products,
        user_profile: profile.clone(),
    }
}

/// Never empty: falls back to DANA+.
fn select_products(profile: &UserProfile) -> Vec<String> {
    let investor = profile.behavioral_trait == BehavioralTrait::Investor;
    let mut products = Vec::new();

    if profile.income_level == IncomeLevel::Low
        || profile.behavioral_trait == BehavioralTrait::Saver
    {
        products.push(ProductKey::DanaPlus.label().to_string());
    }
    if profile.income_level == IncomeLevel::High || investor {
        products.push(ProductKey::Reksadana.label().to_string());
    }
    if profile.age < YOUNG_INVESTOR_AGE || investor {
        products.push(ProductKey::Emas.label().to_string());
    }
    if products.is_empty() {
        products.push(ProductKey::DanaPlus.label().to_string());
    }
    products
}

fn select_technique(profile: &UserProfile) -> &'static str {
    let high = |level: &TraitLevel| *level == TraitLevel::High;
    if high(&profile.openness) {
        "Emphasize innovation and new possibilities"
    } else if high(&profile.conscientiousness) {
        "Focus on reliability and long-term benefits"
    } else if high(&profile.extraversion) {
        "Highlight social proof and community aspects"
    } else if high(&profile.agreeableness) {
        "Stress how the product helps others and society"
    } else {
        "Present clear data and security features"
    }
}
