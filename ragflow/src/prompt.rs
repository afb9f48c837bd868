//! Prompt templates.

use serde::{Deserialize, Serialize};

/// A fixed instruction wrapped around the query and retrieved snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Personalised product recommendations.
    #[default]
    ProductRecommendation,
    /// Three-bullet summary of a customer profile.
    CustomerSummary,
}

impl PromptTemplate {
    /// Builds the prompt. Snippets keep their order and are joined by newlines.
    #[must_use]
    pub fn compose(&self, query: &str, context: &[String]) -> String {
        let snippets = context.join("\n");
        match self {
            Self::ProductRecommendation => format!(
                "Based on the following user query and product information, provide personalized product recommendations:\n\
                 \n\
                 User Query: {query}\n\
                 \n\
                 Product Information:\n\
                 {snippets}\n\
                 \n\
                 Please provide detailed recommendations explaining why these products would be suitable for the user."
            ),
            Self::CustomerSummary => format!(
                "Summarize the following customer profile in 3 bullet points:\n\
                 {snippets}\n\
                 \n\
                 Customer query: {query}"
            ),
        }
    }
}
