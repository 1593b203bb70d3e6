//! Renders the profile and knowledge base into prompt text. Pure, no I/O.

use crate::models::knowledge::{KnowledgeBase, ProductKey};
use crate::models::profile::UserProfile;

/// Fixed-order, multi-line description of a profile.
pub fn format_profile(profile: &UserProfile) -> String {
    let owned = owned_products(profile);
    let owned = if owned.is_empty() {
        "None".to_string()
    } else {
        owned.join(", ")
    };

    format!(
        "Personality Traits:\n\
         - Openness: {}\n\
         - Conscientiousness: {}\n\
         - Extraversion: {}\n\
         - Agreeableness: {}\n\
         - Neuroticism: {}\n\
         \n\
         Demographics:\n\
         - Age: {}\n\
         - Education Level: {}\n\
         - Income Level: {}\n\
         \n\
         Living Situation:\n\
         - Housing Status: {}\n\
         - Vehicle Ownership: {}\n\
         \n\
         Work & Family:\n\
         - Nature of Work: {}\n\
         - Family Dependants: {}\n\
         \n\
         Behavioral Trait: {}\n\
         \n\
         Products Owned: {}",
        profile.openness,
        profile.conscientiousness,
        profile.extraversion,
        profile.agreeableness,
        profile.neuroticism,
        profile.age,
        profile.education_level,
        profile.income_level,
        profile.housing_status,
        profile.vehicle_ownership,
        profile.work_nature,
        profile.family_dependants,
        profile.behavioral_trait,
        owned,
    )
}

/// Labels of the products the profile owns, in canonical order.
pub fn owned_products(profile: &UserProfile) -> Vec<&'static str> {
    ProductKey::ALL
        .into_iter()
        .filter(|key| match key {
            ProductKey::DanaPlus => profile.dana_plus.owned(),
            ProductKey::Reksadana => profile.reksadana.owned(),
            ProductKey::Emas => profile.emas.owned(),
        })
        .map(ProductKey::label)
        .collect()
}

/// One block per product listing every non-empty field.
pub fn format_knowledge_base(knowledge_base: &KnowledgeBase) -> String {
    ProductKey::ALL
        .into_iter()
        .map(|key| {
            let info = knowledge_base.product(key);
            let name = if info.name.trim().is_empty() {
                key.label()
            } else {
                info.name.trim()
            };
            let mut block = format!("## {name}");
            for (label, value) in info.fields() {
                let value = value.trim();
                if !value.is_empty() {
                    block.push_str(&format!("\n{label}: {value}"));
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
