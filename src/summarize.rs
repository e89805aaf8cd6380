use log::{debug, info};
use serde::Serialize;

use crate::completion::{CompletionService, GenerationParams, generate};
use crate::error::Stage;
use crate::splitter::TextSplitter;
use crate::{Error, Result};

/// Separator placed between chunk summaries before the reduce pass
pub const SUMMARY_SEPARATOR: &str = "\n\n";

pub fn map_prompt(text: &str) -> String {
    format!(
        "Please provide a comprehensive summary of the following text.\n\
         Focus on the main points and key details while maintaining the original context and meaning:\n\n\
         {text}\n\n\
         SUMMARY:"
    )
}

pub fn reduce_prompt(text: &str) -> String {
    format!(
        "Please provide a final, concise summary combining all these points:\n\n\
         {text}\n\n\
         FINAL SUMMARY:"
    )
}

/// Final summary of one transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub text: String,
    /// Number of transcript chunks the summary was built from
    pub chunks: usize,
}

/// Map-reduce summarizer: one completion per chunk, then one to merge them.
///
/// Chunks are processed strictly in order and the first failure aborts the
/// run. A transcript that fits in a single chunk skips the reduce pass and
/// its chunk summary is returned as the final summary.
pub struct SummaryPipeline<'a> {
    service: &'a dyn CompletionService,
    splitter: TextSplitter,
    params: &'a GenerationParams,
}

impl<'a> SummaryPipeline<'a> {
    pub fn new(service: &'a dyn CompletionService, splitter: TextSplitter, params: &'a GenerationParams) -> Self {
        Self {
            service,
            splitter,
            params,
        }
    }

    pub async fn summarize(&self, transcript_text: &str) -> Result<Summary> {
        if transcript_text.trim().is_empty() {
            return Err(Error::EmptyTranscript);
        }

        let chunks = self.splitter.split(transcript_text);
        info!("Summarizing {} chunk(s)", chunks.len());

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            debug!("Map pass for chunk {}/{}", chunk.index + 1, chunks.len());
            let partial = generate(
                self.service,
                self.params,
                &map_prompt(&chunk.text),
                Stage::Map { chunk: chunk.index },
            )
            .await?;
            partials.push(partial);
        }

        if let [only] = partials.as_slice() {
            return Ok(Summary {
                text: only.clone(),
                chunks: 1,
            });
        }

        debug!("Reduce pass over {} chunk summaries", partials.len());
        let combined = partials.join(SUMMARY_SEPARATOR);
        let text = generate(self.service, self.params, &reduce_prompt(&combined), Stage::Reduce).await?;

        Ok(Summary {
            text,
            chunks: chunks.len(),
        })
    }
}
