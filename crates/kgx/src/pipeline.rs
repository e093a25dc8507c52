//! The three-stage extraction pipeline.
//!
//! Extraction proposes triples, verification audits them for specific entities and clear
//! relations (it may delete or rewrite), confirmation fact-checks what is left against the
//! source text (it may only delete). Every stage sees the original text, and every stage's
//! output fully replaces the previous list.

use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use strum_macros::Display;
use tracing::{info, warn};

use crate::errors::KgResult;
use crate::models::message::Message;
use crate::models::triple::{triples_to_json, Triple};
use crate::parser::parse_triples;
use crate::prompt_template::{
    load_prompt, CONFIRM_TEMPLATE, EXTRACT_TEMPLATE, SYSTEM_PROMPT, VERIFY_TEMPLATE,
};
use crate::providers::base::{GenerationParams, Provider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Extraction,
    Verification,
    Confirmation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineOptions {
    pub params: GenerationParams,
    /// Drop confirmed triples that were not in the verification output
    pub enforce_confirmation_subset: bool,
}

/// The output of every stage of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub extracted: Vec<Triple>,
    pub verified: Vec<Triple>,
    pub confirmed: Vec<Triple>,
}

pub struct TriplePipeline {
    provider: Box<dyn Provider>,
    options: PipelineOptions,
}

impl TriplePipeline {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Propose an initial set of triples from the source text
    pub async fn extract(&self, text: &str) -> KgResult<Vec<Triple>> {
        let prompt = load_prompt(EXTRACT_TEMPLATE, &json!({ "text": text }))?;
        self.ask(Stage::Extraction, prompt).await
    }

    /// Audit candidates for concrete entities and unambiguous relations, deleting or correcting them
    pub async fn verify(&self, text: &str, candidates: &[Triple]) -> KgResult<Vec<Triple>> {
        let prompt = load_prompt(
            VERIFY_TEMPLATE,
            &json!({ "text": text, "triples": embed(candidates) }),
        )?;
        self.ask(Stage::Verification, prompt).await
    }

    /// Keep only candidates whose meaning and evidence are backed by the source text
    pub async fn confirm(&self, text: &str, candidates: &[Triple]) -> KgResult<Vec<Triple>> {
        let prompt = load_prompt(
            CONFIRM_TEMPLATE,
            &json!({ "text": text, "triples": embed(candidates) }),
        )?;
        self.ask(Stage::Confirmation, prompt).await
    }

    /// Run all three stages and return the confirmed triples
    pub async fn run(&self, text: &str) -> KgResult<Vec<Triple>> {
        Ok(self.run_stages(text).await?.confirmed)
    }

    /// Run all three stages, keeping each stage's output
    pub async fn run_stages(&self, text: &str) -> KgResult<PipelineRun> {
        let extracted = self.extract(text).await?;
        let verified = self.verify(text, &extracted).await?;
        let confirmed = self.confirm(text, &verified).await?;
        let confirmed = self.check_confirmation(&verified, confirmed);

        Ok(PipelineRun {
            extracted,
            verified,
            confirmed,
        })
    }

    fn check_confirmation(&self, verified: &[Triple], confirmed: Vec<Triple>) -> Vec<Triple> {
        let known: HashSet<&Triple> = verified.iter().collect();
        let enforce = self.options.enforce_confirmation_subset;

        confirmed
            .into_iter()
            .filter(|triple| {
                if known.contains(triple) {
                    return true;
                }
                warn!(
                    head = triple.head(),
                    relation = triple.relation(),
                    tail = triple.tail(),
                    dropped = enforce,
                    "confirmation returned a triple that verification did not produce"
                );
                !enforce
            })
            .collect()
    }

    async fn ask(&self, stage: Stage, prompt: String) -> KgResult<Vec<Triple>> {
        let messages = [Message::system(SYSTEM_PROMPT.trim_end()), Message::user(prompt)];
        let (raw, usage) = self
            .provider
            .complete(&messages, &self.options.params)
            .await?;
        let triples = parse_triples(&raw)?;

        info!(
            %stage,
            triples = triples.len(),
            total_tokens = usage.total_tokens,
            "stage finished"
        );
        Ok(triples)
    }
}

fn embed(candidates: &[Triple]) -> String {
    triples_to_json(candidates).to_string()
}
