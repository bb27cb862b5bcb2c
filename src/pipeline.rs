//! Three-stage context augmentation pipeline.
//!
//! Turns raw retrieved chunks plus the query into a final answer via three
//! sequential model calls: **analysis** → **augmentation** → **generation**.
//! Each stage is a plain configuration record ([`StageSpec`]) consumed by
//! one generic executor; a stage only ever sees the outputs of the stages
//! before it, appended to its task prompt. Any stage failure aborts the
//! whole invocation with the triggering error.
//!
//! Stage inputs:
//!
//! | Stage | Input |
//! |-------|-------|
//! | analysis | query + source-prefixed retrieved chunks |
//! | augmentation | analysis output only |
//! | generation | query + analysis output + augmentation output |

use std::sync::Arc;

use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::CagError;
use crate::generate::{ChatMessage, ChatProvider};
use crate::models::{context_block, ContextEntry, PipelineArtifacts};

/// A persona and task for one pipeline stage.
///
/// Role, goal, and backstory shape the system prompt; `task` is the user
/// prompt before prior-stage outputs are appended.
pub struct StageSpec {
    pub name: &'static str,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub expected_output: String,
    pub task: String,
}

impl StageSpec {
    fn system_prompt(&self) -> String {
        format!(
            "You are a {role}. {backstory}\n\nYour goal: {goal}\n\nExpected output: {expected}",
            role = self.role,
            backstory = self.backstory,
            goal = self.goal,
            expected = self.expected_output,
        )
    }
}

fn analysis_stage(restaurant: &str, query: &str, context: &[ContextEntry]) -> StageSpec {
    StageSpec {
        name: "analysis",
        role: "Context Analyst".to_string(),
        goal: format!(
            "Analyze and extract relevant context from the {restaurant} menu knowledge base"
        ),
        backstory: format!(
            "You are an expert at understanding and analyzing restaurant information, menus, \
             and business data. You excel at finding relevant information and understanding \
             relationships between different pieces of data. You work with the {restaurant} \
             restaurant's menu data."
        ),
        expected_output: "A detailed analysis of the menu context with key insights about \
                          dishes, prices, and categories"
            .to_string(),
        task: format!(
            "Analyze the following context pieces from {restaurant}'s menus for the \
             query: '{query}'\n\n\
             Context pieces:\n{context}\n\n\
             Identify key information, relationships between menu items, price patterns, \
             and any gaps in the context. Focus on understanding the restaurant's offerings.",
            context = context_block(context),
        ),
    }
}

fn augmentation_stage(restaurant: &str) -> StageSpec {
    StageSpec {
        name: "augmentation",
        role: "Context Augmenter".to_string(),
        goal: "Enhance and expand context with additional insights about menu items and \
               relationships"
            .to_string(),
        backstory: "You specialize in enriching context by identifying patterns, relationships, \
                    and implicit information in restaurant menus. You can infer additional \
                    context from existing data and make intelligent connections between dishes, \
                    ingredients, prices, and categories."
            .to_string(),
        expected_output: format!(
            "Enhanced context with additional insights about {restaurant}'s offerings"
        ),
        task: "Based on the context analysis, augment the information by:\n\
               1. Identifying implicit relationships between menu items, prices, and categories\n\
               2. Inferring additional relevant details about ingredients or preparation methods\n\
               3. Suggesting related menu items or pairings that might be helpful\n\
               4. Highlighting any special patterns, pricing tiers, or menu groupings\n\
               5. Making connections between different menu sections"
            .to_string(),
    }
}

fn generation_stage(restaurant: &str, query: &str) -> StageSpec {
    StageSpec {
        name: "generation",
        role: "Response Generator".to_string(),
        goal: format!("Generate comprehensive responses about {restaurant} using augmented context"),
        backstory: format!(
            "You are a master at crafting detailed, accurate, and helpful responses about \
             restaurant menus and offerings. You use all available context to provide the \
             most relevant and complete answers possible about {restaurant}."
        ),
        expected_output: format!(
            "A comprehensive, friendly response about {restaurant}'s menu offerings"
        ),
        task: format!(
            "Using all the analyzed and augmented context about {restaurant}, generate a \
             comprehensive response to the query: '{query}'\n\n\
             Ensure the response is:\n\
             - Accurate to the source menu data\n\
             - Enhanced with the augmented insights about relationships and patterns\n\
             - Well-structured and easy to understand\n\
             - Complete with all relevant details including prices where applicable\n\
             - Helpful for someone trying to understand {restaurant}'s offerings"
        ),
    }
}

/// Sequential executor for the three augmentation stages.
pub struct AugmentationPipeline {
    chat: Arc<dyn ChatProvider>,
    config: GenerationConfig,
}

impl AugmentationPipeline {
    pub fn new(chat: Arc<dyn ChatProvider>, config: GenerationConfig) -> Self {
        Self { chat, config }
    }

    /// Run analysis → augmentation → generation, strictly in order.
    pub async fn run(
        &self,
        query: &str,
        context: &[ContextEntry],
    ) -> Result<PipelineArtifacts, CagError> {
        let restaurant = &self.config.restaurant;
        let stages = [
            analysis_stage(restaurant, query, context),
            augmentation_stage(restaurant),
            generation_stage(restaurant, query),
        ];

        let mut outputs: Vec<(&'static str, String)> = Vec::with_capacity(stages.len());

        for stage in &stages {
            let mut prompt = stage.task.clone();
            if !outputs.is_empty() {
                prompt.push_str("\n\nOutput from earlier stages:\n");
                for (name, output) in &outputs {
                    prompt.push_str(&format!("\n[{name}]\n{output}\n"));
                }
            }

            debug!(stage = stage.name, "running pipeline stage");
            let output = self
                .chat
                .complete(
                    &stage.system_prompt(),
                    &[ChatMessage::user(prompt)],
                    self.config.temperature,
                    self.config.max_tokens,
                )
                .await?;

            outputs.push((stage.name, output));
        }

        let mut iter = outputs.into_iter().map(|(_, output)| output);
        Ok(PipelineArtifacts {
            analysis: iter.next().unwrap_or_default(),
            augmentation: iter.next().unwrap_or_default(),
            answer: iter.next().unwrap_or_default(),
        })
    }
}
