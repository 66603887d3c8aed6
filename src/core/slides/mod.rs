pub mod draft_models;
pub mod draft_service;
pub mod prompt;
pub mod response_parsing;

pub use draft_models::{
    Lesson, LessonPage, MaterializationTarget, NotesContent, PreviewBundle, SlideDraft,
    SpeakerNotes, Subject, TableData, Unit,
};
pub use draft_service::{
    ChunkError, ChunkOutcome, DraftService, GenerationError, GenerationObserver,
    GenerationReport, NoticeLevel, SilentObserver,
};
