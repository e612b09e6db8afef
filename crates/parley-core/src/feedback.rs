//! Feedback scoring and narrative generation.
//!
//! A pure function of the transcript and scenario; no service calls. The
//! scores are a deliberately crude character-count heuristic (100 characters
//! of speech ≈ 1 point, capped at 10) kept for its predictability.

use crate::model::Conversation;
use serde::{Deserialize, Serialize};

/// Scores in `[0, 10]`. `total` is always the mean of the other two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackScore {
    #[serde(rename = "Clarity")]
    pub clarity: f64,
    #[serde(rename = "Persuasiveness")]
    pub persuasiveness: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

/// Structured feedback for a finished session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub score: FeedbackScore,
    pub summary: String,
    pub points_to_consider: String,
    pub performance_analysis: String,
    pub improvements: Vec<String>,
}

impl Feedback {
    /// Score a transcript. An empty conversation yields all-zero scores and
    /// still renders the narrative sections.
    pub fn from_conversation(conversation: &Conversation, scenario: &str) -> Self {
        let user_chars: usize = conversation
            .iter()
            .map(|turn| turn.user.chars().count())
            .sum();
        let ai_chars: usize = conversation
            .iter()
            .map(|turn| turn.ai.chars().count())
            .sum();

        let clarity = (user_chars as f64 / 100.0).min(10.0);
        let persuasiveness = (ai_chars as f64 / 100.0).min(10.0);
        let total = (clarity + persuasiveness) / 2.0;

        let points_to_consider = format!(
            "### Points to Consider When Initiating Negotiation:\n\
             1. **Preparation**: Research the topic thoroughly. For example, in a {scenario}, \
             understand market rates, company policies, and your own achievements.\n\
             2. **Clear Objectives**: Define what you want to achieve. For instance, in a {scenario}, \
             decide on the exact salary increase or benefits you are seeking.\n\
             3. **Active Listening**: Pay attention to the other party's concerns and respond thoughtfully.\n\
             4. **Flexibility**: Be open to compromise and alternative solutions."
        );

        let performance_analysis = format!(
            "### Detailed Performance Analysis:\n\
             - **Clarity**: Your clarity score is {clarity:.2}/10. This reflects how clearly you communicated your points.\n\
             - **Persuasiveness**: Your persuasiveness score is {persuasiveness:.2}/10. This reflects how effectively you convinced the other party.\n\
             - **Total Score**: Your overall performance score is {total:.2}/10.\n\n\
             **Areas for Improvement**:\n\
             1. **Be More Concise**: Avoid lengthy explanations. Focus on key points.\n\
             2. **Use Data and Examples**: Support your arguments with data and specific examples.\n\
             3. **Practice Active Listening**: Respond to the other party's concerns more effectively."
        );

        Self {
            score: FeedbackScore {
                clarity,
                persuasiveness,
                total,
            },
            summary: "You demonstrated good negotiation skills but could improve on clarity and structure."
                .to_string(),
            points_to_consider,
            performance_analysis,
            improvements: vec![
                "Be more concise in your arguments.".to_string(),
                "Use data and examples to support your points.".to_string(),
                "Practice active listening to better understand the other party.".to_string(),
            ],
        }
    }
}
