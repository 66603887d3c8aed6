// Slide drafting: lesson pages in, a reviewable preview out.
//
// Pages are converted one at a time. Each page is one model call, and one bad
// page never sinks the run: its error is recorded in the report and the next
// page is processed. The run only fails when nothing beyond the title slide
// was produced, or when the model quota is exhausted.

use super::draft_models::{Lesson, PreviewBundle, SlideDraft, Subject, Unit};
use super::prompt::ChunkPrompt;
use super::response_parsing::parse_slides_response;
use crate::core::ai::{AiError, ModelCaller};
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// ERRORS
// ============================================================================

/// Why a whole generation run was refused or failed. The messages are shown
/// to the user as-is.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No active subject selected.")]
    NoActiveSubject,

    #[error("No lesson found.")]
    LessonNotFound,

    #[error("This lesson has no content to generate slides from.")]
    NoUsableContent,

    #[error("Failed to generate slides. Please check lesson content.")]
    AllChunksFailed { report: GenerationReport },

    #[error("AI usage limit reached for this month.")]
    LimitReached,
}

/// Why a single page produced no slides.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("model call failed: {0}")]
    Model(#[from] AiError),

    #[error("model response was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

// ============================================================================
// REPORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives progress and user-facing notices while a run is in flight.
pub trait GenerationObserver: Send + Sync {
    fn on_progress(&self, _percent: u8, _status: &str) {}
    fn on_notice(&self, _level: NoticeLevel, _message: &str) {}
}

/// Observer for callers that don't display anything.
pub struct SilentObserver;

impl GenerationObserver for SilentObserver {}

#[derive(Debug)]
pub struct ChunkOutcome {
    /// 0-based index among the pages that had content.
    pub page_index: usize,
    pub page_title: String,
    /// Number of slides appended, or why none were.
    pub result: Result<usize, ChunkError>,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub chunks: Vec<ChunkOutcome>,
    /// Slides in the preview, title slide included.
    pub total_slides: usize,
}

impl GenerationReport {
    pub fn skipped(&self) -> usize {
        self.chunks.iter().filter(|c| c.result.is_err()).count()
    }
}

/// `round(step / total * 90)`; the last 10% is reserved for finalizing.
pub fn chunk_progress(step: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((step as f64 / total as f64) * 90.0).round() as u8
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct DraftService<M: ModelCaller> {
    model: M,
    /// The single live preview. A new run replaces it.
    preview: RwLock<Option<PreviewBundle>>,
}

impl<M: ModelCaller> DraftService<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            preview: RwLock::new(None),
        }
    }

    /// Generates a preview for the first selected lesson and stores it as the
    /// live preview.
    pub async fn generate_preview(
        &self,
        lesson_ids: &[String],
        lessons: &[Lesson],
        active_subject: Option<&Subject>,
        units: &[Unit],
        observer: &dyn GenerationObserver,
    ) -> Result<GenerationReport, GenerationError> {
        let result = self
            .run(lesson_ids, lessons, active_subject, units, observer)
            .await;

        if let Err(e) = &result {
            let level = match e {
                GenerationError::NoActiveSubject => NoticeLevel::Warning,
                _ => NoticeLevel::Error,
            };
            observer.on_notice(level, &e.to_string());
        }
        result
    }

    async fn run(
        &self,
        lesson_ids: &[String],
        lessons: &[Lesson],
        active_subject: Option<&Subject>,
        units: &[Unit],
        observer: &dyn GenerationObserver,
    ) -> Result<GenerationReport, GenerationError> {
        let subject = active_subject.ok_or(GenerationError::NoActiveSubject)?;

        let lesson = lessons
            .iter()
            .find(|l| lesson_ids.contains(&l.id))
            .ok_or(GenerationError::LessonNotFound)?;

        let pages: Vec<_> = lesson.pages.iter().filter(|p| p.has_content()).collect();
        if pages.is_empty() {
            return Err(GenerationError::NoUsableContent);
        }

        // From here on the previous preview is stale.
        *self.preview.write().await = None;

        observer.on_progress(5, "Initializing AI Model...");
        tracing::info!(
            lesson_id = %lesson.id,
            pages = pages.len(),
            "Generating slide preview"
        );

        let mut slides = vec![SlideDraft::title_slide(lesson, subject).with_fallback_title(1)];
        let mut report = GenerationReport::default();
        let total = pages.len();

        for (index, page) in pages.iter().enumerate() {
            let step = index + 1;
            observer.on_progress(
                chunk_progress(step, total),
                &format!("Analyzing section {} of {}...", step, total),
            );

            let titles: Vec<&str> = slides
                .iter()
                .map(|s| s.title.as_str())
                .filter(|t| !t.is_empty())
                .collect();
            let prompt = ChunkPrompt {
                part: step,
                total,
                existing_titles: &titles,
                content: &page.content,
            }
            .render();

            let result = match self.convert_chunk(&prompt).await {
                Ok(drafts) => {
                    let added = drafts.len();
                    for draft in drafts {
                        let position = slides.len() + 1;
                        slides.push(draft.with_fallback_title(position));
                    }
                    Ok(added)
                }
                Err(ChunkError::Model(AiError::LimitReached)) => {
                    observer.on_progress(0, "Stopped: usage limit reached.");
                    return Err(GenerationError::LimitReached);
                }
                Err(e) => {
                    tracing::warn!("Error processing slide chunk {}: {}", step, e);
                    Err(e)
                }
            };

            report.chunks.push(ChunkOutcome {
                page_index: index,
                page_title: page.title.clone(),
                result,
            });
        }

        if slides.len() <= 1 {
            observer.on_progress(0, "Generation failed.");
            return Err(GenerationError::AllChunksFailed { report });
        }

        observer.on_progress(100, "Finalizing layout...");
        report.total_slides = slides.len();

        let skipped = report.skipped();
        if skipped > 0 {
            observer.on_notice(
                NoticeLevel::Warning,
                &format!(
                    "{} of {} sections could not be converted and were skipped.",
                    skipped, total
                ),
            );
        }

        *self.preview.write().await = Some(PreviewBundle {
            slides,
            source_lesson_ids: lesson_ids.to_vec(),
            source_lesson_data: lessons.to_vec(),
            source_unit_data: units.to_vec(),
            subject: subject.clone(),
        });

        observer.on_notice(
            NoticeLevel::Success,
            "Generation complete! Review your slides.",
        );
        tracing::info!(
            slides = report.total_slides,
            skipped,
            "Slide preview ready"
        );
        Ok(report)
    }

    async fn convert_chunk(&self, prompt: &str) -> Result<Vec<SlideDraft>, ChunkError> {
        let raw = self.model.call_model(prompt).await?;
        Ok(parse_slides_response(&raw)?)
    }

    pub async fn preview(&self) -> Option<PreviewBundle> {
        self.preview.read().await.clone()
    }

    /// Swaps in user-edited slides. Returns false when there is no preview.
    pub async fn replace_preview_slides(&self, slides: Vec<SlideDraft>) -> bool {
        match self.preview.write().await.as_mut() {
            Some(bundle) => {
                bundle.slides = slides;
                true
            }
            None => false,
        }
    }

    pub async fn take_preview(&self) -> Option<PreviewBundle> {
        self.preview.write().await.take()
    }

    pub async fn discard_preview(&self) {
        *self.preview.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::slides::LessonPage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, AiError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelCaller for ScriptedModel {
        async fn call_model(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::Provider("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        progress: Mutex<Vec<u8>>,
        notices: Mutex<Vec<(NoticeLevel, String)>>,
    }

    impl GenerationObserver for RecordingObserver {
        fn on_progress(&self, percent: u8, _status: &str) {
            self.progress.lock().unwrap().push(percent);
        }

        fn on_notice(&self, level: NoticeLevel, message: &str) {
            self.notices.lock().unwrap().push((level, message.to_string()));
        }
    }

    fn subject() -> Subject {
        Subject {
            id: "sci".into(),
            title: "Science".into(),
        }
    }

    fn lesson(pages: &[&str]) -> Lesson {
        Lesson {
            id: "l1".into(),
            title: "Plants".into(),
            unit_id: Some("u1".into()),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, content)| LessonPage {
                    title: format!("Page {}", i + 1),
                    content: content.to_string(),
                })
                .collect(),
        }
    }

    fn ids() -> Vec<String> {
        vec!["l1".to_string()]
    }

    fn slides_json(titles: &[&str]) -> Result<String, AiError> {
        let slides: Vec<_> = titles
            .iter()
            .map(|t| serde_json::json!({ "title": t, "body": "text" }))
            .collect();
        Ok(serde_json::json!({ "slides": slides }).to_string())
    }

    #[tokio::test]
    async fn every_chunk_succeeding_yields_title_plus_content_slides() {
        let model = ScriptedModel::new(vec![slides_json(&["Roots"]), slides_json(&["Leaves", "Stems"])]);
        let service = DraftService::new(model);
        let observer = RecordingObserver::default();

        let report = service
            .generate_preview(&ids(), &[lesson(&["roots", "leaves"])], Some(&subject()), &[], &observer)
            .await
            .unwrap();

        assert_eq!(report.total_slides, 4);
        assert_eq!(report.skipped(), 0);

        let preview = service.preview().await.unwrap();
        let titles: Vec<_> = preview.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Plants", "Roots", "Leaves", "Stems"]);
        assert_eq!(preview.slides[0].body, "Subject: Science");
        assert_eq!(*observer.progress.lock().unwrap(), vec![5, 45, 90, 100]);
    }

    #[tokio::test]
    async fn later_prompts_remember_earlier_titles() {
        let model = ScriptedModel::new(vec![slides_json(&["Roots"]), slides_json(&["Leaves"])]);
        let service = DraftService::new(model);

        service
            .generate_preview(&ids(), &[lesson(&["a", "b"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();

        let prompts = service.model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("[ Plants ]"));
        assert!(prompts[1].contains("[ Plants | Roots ]"));
        assert!(prompts[1].contains("IS FINAL BATCH: true"));
    }

    #[tokio::test]
    async fn one_bad_chunk_does_not_abort_the_batch() {
        let model = ScriptedModel::new(vec![
            Ok("I cannot help with that".into()),
            Err(AiError::Provider("boom".into())),
            Ok("Sure! ```json\n{\"slides\":[{\"title\":\"Kept\"}]}\n```".into()),
        ]);
        let service = DraftService::new(model);
        let observer = RecordingObserver::default();

        let report = service
            .generate_preview(&ids(), &[lesson(&["a", "b", "c"])], Some(&subject()), &[], &observer)
            .await
            .unwrap();

        assert_eq!(report.skipped(), 2);
        assert!(matches!(report.chunks[0].result, Err(ChunkError::InvalidJson(_))));
        assert!(matches!(report.chunks[1].result, Err(ChunkError::Model(_))));
        assert_eq!(report.chunks[2].result.as_ref().ok(), Some(&1));
        assert_eq!(service.preview().await.unwrap().slides.len(), 2);

        let notices = observer.notices.lock().unwrap();
        assert!(notices
            .iter()
            .any(|(level, msg)| *level == NoticeLevel::Warning && msg.starts_with("2 of 3 sections")));
    }

    #[tokio::test]
    async fn all_chunks_failing_leaves_no_preview() {
        let model = ScriptedModel::new(vec![
            slides_json(&["First run"]),
            Err(AiError::Provider("down".into())),
            Ok("{}".into()),
        ]);
        let service = DraftService::new(model);
        service
            .generate_preview(&ids(), &[lesson(&["a"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();
        assert!(service.preview().await.is_some());

        let err = service
            .generate_preview(&ids(), &[lesson(&["a", "b"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap_err();

        match err {
            GenerationError::AllChunksFailed { report } => assert_eq!(report.skipped(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.preview().await.is_none());
    }

    #[tokio::test]
    async fn limit_reached_stops_the_run() {
        let model = ScriptedModel::new(vec![
            slides_json(&["Roots"]),
            Err(AiError::LimitReached),
            slides_json(&["Never"]),
        ]);
        let service = DraftService::new(model);

        let err = service
            .generate_preview(&ids(), &[lesson(&["a", "b", "c"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::LimitReached));
        assert_eq!(service.model.prompts().len(), 2);
        assert!(service.preview().await.is_none());
    }

    #[tokio::test]
    async fn preconditions_fail_fast_without_model_calls() {
        let service = DraftService::new(ScriptedModel::new(vec![]));
        let observer = RecordingObserver::default();

        let no_subject = service
            .generate_preview(&ids(), &[lesson(&["a"])], None, &[], &observer)
            .await;
        assert!(matches!(no_subject, Err(GenerationError::NoActiveSubject)));

        let no_lesson = service
            .generate_preview(&["other".to_string()], &[lesson(&["a"])], Some(&subject()), &[], &observer)
            .await;
        assert!(matches!(no_lesson, Err(GenerationError::LessonNotFound)));

        let blank = service
            .generate_preview(&ids(), &[lesson(&["   ", ""])], Some(&subject()), &[], &observer)
            .await;
        assert!(matches!(blank, Err(GenerationError::NoUsableContent)));

        assert!(service.model.prompts().is_empty());
        let notices = observer.notices.lock().unwrap();
        assert_eq!(notices[0], (NoticeLevel::Warning, "No active subject selected.".to_string()));
        assert_eq!(notices[1].1, "No lesson found.");
    }

    #[tokio::test]
    async fn untitled_model_slides_get_position_titles() {
        let model = ScriptedModel::new(vec![Ok(r#"{"slides":[{"body":"no title"}]}"#.into())]);
        let service = DraftService::new(model);

        service
            .generate_preview(&ids(), &[lesson(&["a"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();

        assert_eq!(service.preview().await.unwrap().slides[1].title, "Slide 2");
    }

    #[tokio::test]
    async fn edited_slides_replace_the_live_preview() {
        let service = DraftService::new(ScriptedModel::new(vec![slides_json(&["Roots"])]));
        assert!(!service.replace_preview_slides(vec![]).await);

        service
            .generate_preview(&ids(), &[lesson(&["a"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();

        let edited = vec![SlideDraft {
            title: "Edited".into(),
            ..Default::default()
        }];
        assert!(service.replace_preview_slides(edited.clone()).await);
        assert_eq!(service.take_preview().await.unwrap().slides, edited);
        assert!(service.preview().await.is_none());
    }

    #[tokio::test]
    async fn blank_lesson_title_falls_back_to_slide_one() {
        let service = DraftService::new(ScriptedModel::new(vec![slides_json(&["Roots"])]));
        let mut untitled = lesson(&["a"]);
        untitled.title = "  ".into();

        service
            .generate_preview(&ids(), &[untitled], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();

        let preview = service.preview().await.unwrap();
        assert_eq!(preview.slides[0].title, "Slide 1");
        assert_eq!(preview.slides[1].title, "Roots");
    }

    #[tokio::test]
    async fn discarding_clears_the_live_preview() {
        let service = DraftService::new(ScriptedModel::new(vec![slides_json(&["Roots"])]));
        service
            .generate_preview(&ids(), &[lesson(&["a"])], Some(&subject()), &[], &SilentObserver)
            .await
            .unwrap();
        assert!(service.preview().await.is_some());

        service.discard_preview().await;

        assert!(service.preview().await.is_none());
        assert!(service.take_preview().await.is_none());
    }

    #[test]
    fn progress_scales_to_ninety() {
        assert_eq!(chunk_progress(1, 3), 30);
        assert_eq!(chunk_progress(1, 2), 45);
        assert_eq!(chunk_progress(3, 3), 90);
        assert_eq!(chunk_progress(1, 7), 13);
    }
}
