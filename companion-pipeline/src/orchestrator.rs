use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use companion_guardrails::{GuardrailFilter, InputViolation, find_sensitive_keywords};
use companion_provider::{GenerationError, GenerationInvoker, GenerationParams};
use companion_recipes::{CONTEXT_PLACEHOLDER, ModelProfile, OutputFormat, Recipe, RecipeRegistry};

use crate::clean::clean_text;
use crate::error::{PipelineError, Result};
use crate::format::to_bullets;
use crate::request::{RunOverrides, RunRequest, RunResult};

/// Runs recipes end to end: lookup, input guardrails, generation, output
/// guardrails.
///
/// Everything a `Pipeline` holds is immutable after construction, so one
/// instance can serve any number of concurrent runs. Dropping a `run` future
/// cancels only that run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    recipes: Arc<RecipeRegistry>,
    guardrails: Arc<GuardrailFilter>,
    invoker: GenerationInvoker,
}

impl Pipeline {
    pub fn new(
        recipes: Arc<RecipeRegistry>,
        guardrails: Arc<GuardrailFilter>,
        invoker: GenerationInvoker,
    ) -> Self {
        Self {
            recipes,
            guardrails,
            invoker,
        }
    }

    pub fn recipes(&self) -> &RecipeRegistry {
        &self.recipes
    }

    pub fn guardrails(&self) -> &GuardrailFilter {
        &self.guardrails
    }

    pub async fn run_text(
        &self,
        recipe_id: &str,
        context: &str,
        overrides: RunOverrides,
    ) -> Result<RunResult> {
        self.run(RunRequest::new(recipe_id, context).with_overrides(overrides))
            .await
    }

    /// Execute one request. Any failure short-circuits with a typed error.
    pub async fn run(&self, request: RunRequest) -> Result<RunResult> {
        let started = Instant::now();
        let RunRequest {
            recipe_id,
            context,
            overrides,
        } = request;

        let recipe = self.recipes.get(&recipe_id)?;

        let context = clean_text(&context);
        self.guardrails
            .validate_input(&context)
            .map_err(|violation| PipelineError::InvalidInput(violation.to_string()))?;
        validate_overrides(&overrides)?;
        let variables: BTreeMap<String, String> = overrides
            .variables
            .iter()
            .map(|(name, value)| (name.clone(), clean_text(value)))
            .collect();
        check_total_input(
            &context,
            &variables,
            self.guardrails.policy().max_input_chars,
        )?;

        let sensitive_keywords: Vec<String> = find_sensitive_keywords(&context)
            .into_iter()
            .map(str::to_string)
            .collect();

        // Nothing below this point sees unredacted input.
        let input = self.guardrails.redact(&context);
        let mut input_redactions = input.counts;
        let mut vars = BTreeMap::new();
        for (name, value) in variables {
            let redacted = self.guardrails.redact(&value);
            merge_counts(&mut input_redactions, redacted.counts);
            vars.insert(name, redacted.text);
        }
        vars.insert(CONTEXT_PLACEHOLDER.to_string(), input.text.clone());

        let model = choose_profile(recipe, &overrides, context.chars().count());
        // Values that were clean on their own can form a match once joined.
        let rendered = self.guardrails.redact(&recipe.render(&vars)?);
        merge_counts(&mut input_redactions, rendered.counts);
        let prompt = rendered.text;
        let params = self.invoker.bound(build_params(recipe, &model, &overrides));
        tracing::debug!(
            recipe = %recipe.id,
            model = %model.name,
            tier = ?model.tier,
            prompt_chars = prompt.chars().count(),
            "invoking generation"
        );

        let raw = self.invoker.invoke(&prompt, params.clone()).await?;

        let output = self.guardrails.redact(&raw);
        let shaped = match recipe.output_format {
            OutputFormat::Plain => output.text.trim().to_string(),
            OutputFormat::Bullets { max_bullets } => to_bullets(&output.text, max_bullets),
        };
        if shaped.trim().is_empty() {
            return Err(GenerationError::Malformed(
                "no content left after formatting".to_string(),
            )
            .into());
        }
        let capped = self
            .guardrails
            .cap_output(&shaped, overrides.max_output_chars);

        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let redacted = !input_redactions.is_empty() || !output.counts.is_empty();
        tracing::info!(
            recipe = %recipe.id,
            model = %model.name,
            latency_ms,
            redacted,
            truncated = capped.truncated,
            output_chars = capped.text.chars().count(),
            "run complete"
        );
        if !sensitive_keywords.is_empty() {
            tracing::info!(
                recipe = %recipe.id,
                keywords = sensitive_keywords.len(),
                "input mentions sensitive keywords"
            );
        }

        Ok(RunResult {
            text: capped.text,
            recipe_id: recipe.id.clone(),
            redacted,
            truncated: capped.truncated,
            model,
            params,
            input_redactions,
            output_redactions: output.counts,
            sensitive_keywords,
            redacted_input: input.text,
            latency_ms,
        })
    }
}

/// Context and template variables together must fit the input limit.
fn check_total_input(
    context: &str,
    variables: &BTreeMap<String, String>,
    limit: usize,
) -> Result<()> {
    let chars = context.chars().count()
        + variables
            .values()
            .map(|value| value.chars().count())
            .sum::<usize>();
    if chars > limit {
        return Err(PipelineError::InvalidInput(
            InputViolation::TooLong { chars, limit }.to_string(),
        ));
    }
    Ok(())
}

fn merge_counts(into: &mut BTreeMap<String, usize>, counts: BTreeMap<String, usize>) {
    for (rule, n) in counts {
        *into.entry(rule).or_default() += n;
    }
}

fn validate_overrides(overrides: &RunOverrides) -> Result<()> {
    let invalid = |reason: &str| Err(PipelineError::InvalidInput(reason.to_string()));
    if overrides.max_new_length == Some(0) {
        return invalid("max_new_length must be positive");
    }
    if overrides.max_output_chars == Some(0) {
        return invalid("max_output_chars must be positive");
    }
    if overrides
        .temperature
        .is_some_and(|t| !t.is_finite() || t < 0.0)
    {
        return invalid("temperature must be a non-negative number");
    }
    if overrides
        .model
        .as_deref()
        .is_some_and(|model| model.trim().is_empty())
    {
        return invalid("model must not be blank");
    }
    if overrides.variables.contains_key(CONTEXT_PLACEHOLDER) {
        return invalid("the context variable cannot be overridden");
    }
    Ok(())
}

/// Explicit model override, then the long-input profile, then the recipe's
/// own profile.
fn choose_profile(recipe: &Recipe, overrides: &RunOverrides, input_chars: usize) -> ModelProfile {
    let selected = recipe.select_profile(input_chars);
    match &overrides.model {
        Some(name) => ModelProfile::new(name.trim(), selected.tier),
        None => selected.clone(),
    }
}

fn build_params(recipe: &Recipe, model: &ModelProfile, overrides: &RunOverrides) -> GenerationParams {
    let defaults = &recipe.defaults;
    GenerationParams::new(
        model.name.clone(),
        overrides.max_new_length.unwrap_or(defaults.max_new_length),
        overrides.deterministic.unwrap_or(defaults.deterministic),
    )
    .with_temperature(overrides.temperature.or(defaults.temperature))
}
