use serde::Serialize;

use crate::VideoId;
use crate::captions::LanguageChoice;
use crate::summarize::Summary;
use crate::translate::Translation;

/// Result of one run, ready for rendering
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    pub video_id: &'a VideoId,
    pub title: &'a str,
    pub caption_language: &'a LanguageChoice,
    pub summary: &'a Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<&'a Translation>,
}

/// Render the report as plain text: the summary, then the translation
pub fn render_text(report: &Report<'_>) -> String {
    let mut out = report.summary.text.trim_end().to_string();
    if let Some(t) = report.translation {
        out.push_str(&format!("\n\n--- {} Translation ---\n{}", t.language.name, t.text.trim_end()));
    }
    out
}

/// Render the report as pretty-printed JSON
pub fn render_json(report: &Report<'_>) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{CaptionTrack, Selection};
    use crate::languages::Language;

    fn choice() -> LanguageChoice {
        LanguageChoice {
            requested: "en".to_string(),
            track: CaptionTrack {
                language_code: "en".to_string(),
                name: "English".to_string(),
                auto_generated: false,
            },
            selection: Selection::Requested,
        }
    }

    fn summary() -> Summary {
        Summary {
            text: "- first point\n- second point\n".to_string(),
            chunks: 2,
        }
    }

    #[test]
    fn test_render_text_summary_only() {
        let id = VideoId::new("abcDEFghiJK");
        let (choice, summary) = (choice(), summary());
        let report = Report {
            url: None,
            video_id: &id,
            title: "Demo",
            caption_language: &choice,
            summary: &summary,
            translation: None,
        };
        assert_eq!(render_text(&report), "- first point\n- second point");
    }

    #[test]
    fn test_render_text_with_translation() {
        let id = VideoId::new("abcDEFghiJK");
        let (choice, summary) = (choice(), summary());
        let translation = Translation {
            language: Language::new("French", "fr"),
            text: "- premier point".to_string(),
        };
        let report = Report {
            url: None,
            video_id: &id,
            title: "Demo",
            caption_language: &choice,
            summary: &summary,
            translation: Some(&translation),
        };
        assert_eq!(
            render_text(&report),
            "- first point\n- second point\n\n--- French Translation ---\n- premier point"
        );
    }

    #[test]
    fn test_render_json_includes_source_url() {
        let id = VideoId::new("abcDEFghiJK");
        let (choice, summary) = (choice(), summary());
        let report = Report {
            url: Some("https://youtu.be/abcDEFghiJK"),
            video_id: &id,
            title: "Demo",
            caption_language: &choice,
            summary: &summary,
            translation: None,
        };
        let json: serde_json::Value = serde_json::from_str(&render_json(&report)).unwrap();
        assert_eq!(json["url"], "https://youtu.be/abcDEFghiJK");
        assert_eq!(render_text(&report), "- first point\n- second point");
    }

    #[test]
    fn test_render_json() {
        let id = VideoId::new("abcDEFghiJK");
        let (choice, summary) = (choice(), summary());
        let report = Report {
            url: None,
            video_id: &id,
            title: "Demo",
            caption_language: &choice,
            summary: &summary,
            translation: None,
        };
        let json: serde_json::Value = serde_json::from_str(&render_json(&report)).unwrap();
        assert_eq!(json["video_id"], "abcDEFghiJK");
        assert!(json.get("url").is_none());
        assert_eq!(json["caption_language"]["track"]["language_code"], "en");
        assert_eq!(json["summary"]["chunks"], 2);
        assert!(json.get("translation").is_none());
    }
}
