//! Synthetic end-user profile the advisor persona is tuned against.
//!
//! Enumerated attributes accept labels outside their known set and carry them
//! verbatim, so a UI that grows a new option never breaks a stored profile.

use serde::{Deserialize, Serialize};

/// Declares a string-labelled enum with an `Other(String)` catch-all.
/// Serializes to and from the plain label.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn label(&self) -> &str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Other(raw) => raw.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.as_str() {
                    $($label => $name::$variant,)+
                    _ => $name::Other(raw),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.label().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

labelled_enum!(
    /// Level of one Big Five personality trait.
    TraitLevel { High => "High", Low => "Low" }
);

labelled_enum!(EducationLevel {
    HighSchool => "High School",
    Bachelors => "Bachelor's",
    Masters => "Master's",
    Phd => "PhD",
});

labelled_enum!(IncomeLevel {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

labelled_enum!(HousingStatus {
    Renting => "Renting",
    OwnHouse => "Own House",
    LivingWithFamily => "Living with Family",
});

labelled_enum!(VehicleOwnership {
    None => "None",
    Car => "Car",
    Motorcycle => "Motorcycle",
});

labelled_enum!(WorkNature {
    Salaried => "Salaried",
    SelfEmployed => "Self-employed",
    Freelancer => "Freelancer",
    Retired => "Retired",
});

labelled_enum!(BehavioralTrait {
    Saver => "Saver",
    Spender => "Spender",
    Investor => "Investor",
});

/// Product ownership flag, exchanged as "Yes" / "No".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ownership {
    Yes,
    #[default]
    No,
}

impl Ownership {
    pub fn owned(self) -> bool {
        self == Ownership::Yes
    }
}

pub const MIN_AGE: u8 = 18;
pub const MAX_AGE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub openness: TraitLevel,
    pub conscientiousness: TraitLevel,
    pub extraversion: TraitLevel,
    pub agreeableness: TraitLevel,
    pub neuroticism: TraitLevel,

    pub education_level: EducationLevel,
    pub income_level: IncomeLevel,
    pub housing_status: HousingStatus,
    pub vehicle_ownership: VehicleOwnership,
    pub work_nature: WorkNature,
    pub family_dependants: u32,
    pub age: u8,
    pub behavioral_trait: BehavioralTrait,

    pub dana_plus: Ownership,
    pub reksadana: Ownership,
    #[serde(rename = "eMAS")]
    pub emas: Ownership,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            openness: TraitLevel::High,
            conscientiousness: TraitLevel::High,
            extraversion: TraitLevel::High,
            agreeableness: TraitLevel::High,
            neuroticism: TraitLevel::Low,
            education_level: EducationLevel::Bachelors,
            income_level: IncomeLevel::Medium,
            housing_status: HousingStatus::Renting,
            vehicle_ownership: VehicleOwnership::Car,
            work_nature: WorkNature::Salaried,
            family_dependants: 0,
            age: 30,
            behavioral_trait: BehavioralTrait::Saver,
            dana_plus: Ownership::No,
            reksadana: Ownership::No,
            emas: Ownership::No,
        }
    }
}

/// Field-by-field update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub openness: Option<TraitLevel>,
    pub conscientiousness: Option<TraitLevel>,
    pub extraversion: Option<TraitLevel>,
    pub agreeableness: Option<TraitLevel>,
    pub neuroticism: Option<TraitLevel>,
    pub education_level: Option<EducationLevel>,
    pub income_level: Option<IncomeLevel>,
    pub housing_status: Option<HousingStatus>,
    pub vehicle_ownership: Option<VehicleOwnership>,
    pub work_nature: Option<WorkNature>,
    pub family_dependants: Option<u32>,
    pub age: Option<u8>,
    pub behavioral_trait: Option<BehavioralTrait>,
    pub dana_plus: Option<Ownership>,
    pub reksadana: Option<Ownership>,
    #[serde(rename = "eMAS")]
    pub emas: Option<Ownership>,
}

impl UserProfile {
    /// Returns a copy with every field present in `patch` overwritten.
    pub fn merged(&self, patch: ProfilePatch) -> UserProfile {
        let current = self.clone();
        UserProfile {
            openness: patch.openness.unwrap_or(current.openness),
            conscientiousness: patch.conscientiousness.unwrap_or(current.conscientiousness),
            extraversion: patch.extraversion.unwrap_or(current.extraversion),
            agreeableness: patch.agreeableness.unwrap_or(current.agreeableness),
            neuroticism: patch.neuroticism.unwrap_or(current.neuroticism),
            education_level: patch.education_level.unwrap_or(current.education_level),
            income_level: patch.income_level.unwrap_or(current.income_level),
            housing_status: patch.housing_status.unwrap_or(current.housing_status),
            vehicle_ownership: patch.vehicle_ownership.unwrap_or(current.vehicle_ownership),
            work_nature: patch.work_nature.unwrap_or(current.work_nature),
            family_dependants: patch.family_dependants.unwrap_or(current.family_dependants),
            age: patch.age.unwrap_or(current.age),
            behavioral_trait: patch.behavioral_trait.unwrap_or(current.behavioral_trait),
            dana_plus: patch.dana_plus.unwrap_or(current.dana_plus),
            reksadana: patch.reksadana.unwrap_or(current.reksadana),
            emas: patch.emas.unwrap_or(current.emas),
        }
    }

    /// Checks the numeric ranges. Enumerated fields are never rejected.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(format!(
                "age must be between {MIN_AGE} and {MAX_AGE}, got {}",
                self.age
            ));
        }
        Ok(())
    }
}
