//! The fixed set of persona categories.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use super::selector::EvidenceSelector;
use crate::evidence::EvidenceItem;

/// One facet of the persona.
///
/// Declaration order is the processing order: reports, citation numbering
/// and rendering all follow it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[strum(to_string = "Demographics")]
    Demographics,
    #[strum(to_string = "Personality Traits")]
    PersonalityTraits,
    #[strum(to_string = "Interests & Hobbies")]
    InterestsAndHobbies,
    #[strum(to_string = "Behaviors & Habits")]
    BehaviorsAndHabits,
    #[strum(to_string = "Motivations & Goals")]
    MotivationsAndGoals,
    #[strum(to_string = "Frustrations & Pain Points")]
    FrustrationsAndPainPoints,
}

impl Category {
    /// All categories in processing order.
    pub fn ordered() -> Vec<Category> {
        Category::iter().collect()
    }

    /// Position in processing order.
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// Display name.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Key used in configuration files.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Demographics => "demographics",
            Category::PersonalityTraits => "personality_traits",
            Category::InterestsAndHobbies => "interests_and_hobbies",
            Category::BehaviorsAndHabits => "behaviors_and_habits",
            Category::MotivationsAndGoals => "motivations_and_goals",
            Category::FrustrationsAndPainPoints => "frustrations_and_pain_points",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Category> {
        Category::iter().find(|c| c.slug() == slug)
    }

    /// What the inference step should extract for this category.
    pub fn goal_description(&self) -> &'static str {
        match self {
            Category::Demographics => {
                "Estimate demographic information: approximate age range, occupation or field \
                 of study, location or region, and life stage. Only state what the evidence \
                 clearly supports and say so when something cannot be determined."
            }
            Category::PersonalityTraits => {
                "Describe personality traits visible in how the user writes and interacts: \
                 tone, openness, agreeableness, humour, confidence, and how they handle \
                 disagreement."
            }
            Category::InterestsAndHobbies => {
                "Identify interests and hobbies, both explicitly mentioned and implied by the \
                 communities the user takes part in."
            }
            Category::BehaviorsAndHabits => {
                "Describe behavioural patterns: how and when the user posts, how they engage \
                 with others, recurring habits and routines they mention."
            }
            Category::MotivationsAndGoals => {
                "Identify what drives the user: goals they are working towards, values they \
                 express, and the reasons behind their participation."
            }
            Category::FrustrationsAndPainPoints => {
                "Identify frustrations, complaints and pain points: recurring problems, things \
                 that annoy them, challenges they are trying to overcome and negative \
                 experiences they share."
            }
        }
    }

    /// System instruction framing the inference call.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Category::Demographics => {
                "You are an expert at analyzing text to identify demographic information. Be \
                 conservative in your estimates and only make claims based on clear evidence."
            }
            Category::PersonalityTraits => {
                "You are an expert at analyzing writing style and communication patterns to \
                 identify personality traits. Focus on observable behaviors and communication \
                 patterns."
            }
            Category::InterestsAndHobbies => {
                "You are an expert at identifying interests and hobbies from online activity. \
                 Consider both explicit mentions and implicit interests shown through \
                 participation."
            }
            Category::BehaviorsAndHabits => {
                "You are an expert at analyzing behavioral patterns from online activity. Focus \
                 on observable patterns in posting, engagement, and interaction styles."
            }
            Category::MotivationsAndGoals => {
                "You are an expert at identifying underlying motivations and goals from online \
                 behavior. Look for patterns that reveal what drives the person."
            }
            Category::FrustrationsAndPainPoints => {
                "You are an expert at identifying frustrations and pain points from online \
                 communication. Focus on explicit complaints and recurring negative themes."
            }
        }
    }

    pub fn default_selector(&self) -> EvidenceSelector {
        match self {
            Category::PersonalityTraits => EvidenceSelector::CommentsOnly,
            Category::MotivationsAndGoals => EvidenceSelector::TopByScore(25),
            _ => EvidenceSelector::All,
        }
    }

    /// Whether the prompt should list the account's active communities.
    pub fn wants_subreddit_context(&self) -> bool {
        matches!(self, Category::InterestsAndHobbies)
    }

    /// Placeholder narrative for a category that could not be inferred.
    pub fn placeholder_narrative(&self) -> String {
        format!("Insufficient data to infer {}.", self.name().to_lowercase())
    }
}

/// A category together with the selector that picks its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub category: Category,
    pub selector: EvidenceSelector,
}

impl CategoryDefinition {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            selector: category.default_selector(),
        }
    }

    pub fn with_selector(mut self, selector: EvidenceSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Bucketizer: the evidence this category analyzes, in input order.
    pub fn select(&self, items: &[EvidenceItem]) -> Vec<EvidenceItem> {
        self.selector.select(items)
    }

    /// The default definitions of every category, in processing order.
    pub fn defaults() -> Vec<CategoryDefinition> {
        Category::iter().map(CategoryDefinition::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_order() {
        let names: Vec<String> = Category::ordered().iter().map(Category::name).collect();
        assert_eq!(
            names,
            vec![
                "Demographics",
                "Personality Traits",
                "Interests & Hobbies",
                "Behaviors & Habits",
                "Motivations & Goals",
                "Frustrations & Pain Points",
            ]
        );
        assert_eq!(Category::FrustrationsAndPainPoints.ordinal(), 5);
    }

    #[test]
    fn test_slug_round_trip() {
        for category in Category::ordered() {
            assert_eq!(Category::from_slug(category.slug()), Some(category));
        }
        assert_eq!(Category::from_slug("hobbies"), None);
    }

    #[test]
    fn test_placeholder_mentions_category() {
        assert_eq!(
            Category::MotivationsAndGoals.placeholder_narrative(),
            "Insufficient data to infer motivations & goals."
        );
    }

    #[test]
    fn test_definition_override() {
        let def = CategoryDefinition::new(Category::PersonalityTraits)
            .with_selector(EvidenceSelector::All);
        assert_eq!(def.selector, EvidenceSelector::All);
        assert_eq!(CategoryDefinition::defaults().len(), 6);
    }
}
