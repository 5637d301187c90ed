//! AI-assisted task breakdown.

use thiserror::Error;

use crate::config::{
    Config, LLMConfig, BREAKDOWN_MAX_TOKENS, BREAKDOWN_MODEL, BREAKDOWN_SYSTEM_PROMPT,
    BREAKDOWN_TEMPERATURE,
};
use crate::llm::{LLMError, Provider, Sampling, LLM};

/// Sampling used for breakdown calls.
pub fn breakdown_sampling() -> Sampling {
    Sampling::new(BREAKDOWN_MAX_TOKENS, BREAKDOWN_TEMPERATURE)
}

/// The chat settings with the model swapped for the breakdown model.
pub fn breakdown_llm_config(config: &Config) -> LLMConfig {
    let mut llm = config.llm.clone();
    llm.model = match &config.tasks.breakdown_model {
        Some(model) => Some(model.clone()),
        None if llm.is_openai_compatible() => Some(BREAKDOWN_MODEL.to_string()),
        None => llm.model,
    };
    llm
}

/// Builds the client used by [`break_down_task`].
pub fn breakdown_llm(config: &Config) -> Result<Box<dyn LLM>, LLMError> {
    Provider::from_config(&breakdown_llm_config(config)).build_with(breakdown_sampling())
}

/// Builds the user prompt sent for `task`.
pub fn build_breakdown_prompt(task: &str) -> String {
    format!("Break down this task into simple tasks: {}", task)
}

/// Asks the model to split `task` into simpler subtasks.
///
/// The client should come from [`breakdown_llm`].
pub async fn break_down_task<L: LLM + ?Sized>(llm: &L, task: &str) -> Result<String, BreakdownError> {
    let task = task.trim();
    if task.is_empty() {
        return Err(BreakdownError::EmptyTask);
    }

    tracing::debug!(task, "Requesting task breakdown");
    let response = llm
        .complete_with_system(BREAKDOWN_SYSTEM_PROMPT, &build_breakdown_prompt(task))
        .await?;

    Ok(response.trim().to_string())
}

/// Errors from the breakdown helper.
#[derive(Debug, Error)]
pub enum BreakdownError {
    #[error("Task description is empty")]
    EmptyTask,

    #[error(transparent)]
    LLM(#[from] LLMError),
}
