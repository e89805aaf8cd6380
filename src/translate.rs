use log::info;
use serde::Serialize;

use crate::completion::{CompletionService, GenerationParams, generate};
use crate::error::Stage;
use crate::languages::Language;
use crate::summarize::Summary;

pub fn translate_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Please translate the following text to {target_language}.\n\
         Maintain the same format and structure while ensuring accurate translation:\n\n\
         {text}\n\n\
         TRANSLATION:"
    )
}

/// A summary rendered in another language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub language: Language,
    pub text: String,
}

/// Translate `summary` into `target` with a single completion call.
/// Failures are reported as generation errors and never retried.
pub async fn translate(
    service: &dyn CompletionService,
    params: &GenerationParams,
    summary: &Summary,
    target: &Language,
) -> crate::Result<Translation> {
    info!("Translating summary to {target}");
    let text = generate(
        service,
        params,
        &translate_prompt(&summary.text, &target.name),
        Stage::Translate,
    )
    .await?;
    Ok(Translation {
        language: target.clone(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::FakeCompletion;

    fn summary() -> Summary {
        Summary {
            text: "- point one\n- point two".to_string(),
            chunks: 1,
        }
    }

    #[tokio::test]
    async fn test_translate_single_call() {
        let service = FakeCompletion::new();
        let french = Language::new("French", "fr");

        let t = translate(&service, &GenerationParams::default(), &summary(), &french)
            .await
            .unwrap();

        assert_eq!(service.prompts(), vec![translate_prompt("- point one\n- point two", "French")]);
        assert_eq!(t.text, "summary 1");
        assert_eq!(t.language, french);
    }

    #[tokio::test]
    async fn test_translate_failure_is_not_retried() {
        let service = FakeCompletion::failing_on(1);

        let err = translate(
            &service,
            &GenerationParams::default(),
            &summary(),
            &Language::new("German", "de"),
        )
        .await
        .unwrap_err();

        assert_eq!(service.calls(), 1);
        assert!(matches!(err, Error::Generation { stage: Stage::Translate, .. }));
    }

    #[test]
    fn test_translate_prompt_names_language() {
        let p = translate_prompt("hello", "Japanese");
        assert!(p.starts_with("Please translate the following text to Japanese."));
        assert!(p.contains("\n\nhello\n\nTRANSLATION:"));
    }
}
