//! Per-user session state.
//!
//! A `Session` owns the history of completed readings and the image set of
//! the dream currently being worked on. All mutation goes through the
//! transition methods below, so a history entry can only be written once an
//! image of the current set has been selected.

use crate::models::{DreamInterpretation, DreamSubmission, GeneratedImage, HistoryEntry};
use crate::parse::PROMPT_SET_SIZE;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use uuid::Uuid;

#[derive(Debug)]
struct Generation {
    submission: DreamSubmission,
    images: Vec<GeneratedImage>,
    selected: Option<usize>,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Local>,
    history: Vec<HistoryEntry>,
    current: Option<Generation>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            history: Vec::new(),
            current: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Replace the current image set. Any previous selection is dropped.
    pub fn begin_generation(
        &mut self,
        submission: DreamSubmission,
        images: Vec<GeneratedImage>,
    ) -> Result<()> {
        if images.len() > PROMPT_SET_SIZE {
            return Err(Error::Invariant(format!(
                "A dream can have at most {} images, got {}",
                PROMPT_SET_SIZE,
                images.len()
            )));
        }

        self.current = Some(Generation {
            submission,
            images,
            selected: None,
        });
        Ok(())
    }

    pub fn current_submission(&self) -> Option<&DreamSubmission> {
        self.current.as_ref().map(|g| &g.submission)
    }

    pub fn current_images(&self) -> &[GeneratedImage] {
        self.current
            .as_ref()
            .map(|g| g.images.as_slice())
            .unwrap_or(&[])
    }

    /// Select the image at zero-based `index` of the current set.
    pub fn select_image(&mut self, index: usize) -> Result<&GeneratedImage> {
        let len = self.current_images().len();
        let generation = self
            .current
            .as_mut()
            .filter(|g| index < g.images.len())
            .ok_or_else(|| Error::bad_selection(index, len))?;

        generation.selected = Some(index);
        Ok(&generation.images[index])
    }

    pub fn selected_image(&self) -> Option<&GeneratedImage> {
        let generation = self.current.as_ref()?;
        generation.selected.map(|i| &generation.images[i])
    }

    /// Append a history entry for the selected image.
    pub fn record_interpretation(
        &mut self,
        interpretation: &DreamInterpretation,
    ) -> Result<&HistoryEntry> {
        let generation = self.current.as_ref().ok_or(Error::NoSelection)?;
        let index = generation.selected.ok_or(Error::NoSelection)?;

        let entry = HistoryEntry::new(
            generation.submission.clone(),
            generation.images[index].clone(),
            interpretation,
        );
        tracing::info!("Session {}: recorded history entry {}", self.id, entry.id);

        self.history.push(entry);
        Ok(&self.history[self.history.len() - 1])
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeneratedPrompt, InterpretationStyle};

    fn submission() -> DreamSubmission {
        DreamSubmission::new("曇り空、湖、木の橋", InterpretationStyle::Psychological).unwrap()
    }

    fn images(count: usize) -> Vec<GeneratedImage> {
        (0..count)
            .map(|i| GeneratedImage {
                source_prompt: GeneratedPrompt::new(format!("prompt {}", i)),
                url: format!("https://images.test/{}.png", i),
            })
            .collect()
    }

    fn interpretation() -> DreamInterpretation {
        DreamInterpretation {
            symbolic_meaning: "calm".to_string(),
            psychological_interpretation: "stability".to_string(),
            key_symbols: vec!["lake".to_string()],
            emotional_analysis: "tension".to_string(),
            future_advice: "rest".to_string(),
            positive_aspects: "openness".to_string(),
            points_to_consider: "fatigue".to_string(),
        }
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.history().is_empty());
        assert!(session.current_images().is_empty());
        assert!(session.current_submission().is_none());
        assert!(session.selected_image().is_none());
    }

    #[test]
    fn test_select_without_images_reports_no_images() {
        let mut session = Session::new();
        let err = session.select_image(0).unwrap_err();
        assert!(matches!(err, Error::NoImages));
    }

    #[test]
    fn test_select_out_of_bounds_is_rejected() {
        let mut session = Session::new();
        session.begin_generation(submission(), images(3)).unwrap();

        let err = session.select_image(3).unwrap_err();
        assert!(matches!(err, Error::InvalidSelection { index: 3, len: 3 }));
        assert!(session.selected_image().is_none());
    }

    #[test]
    fn test_record_requires_selection() {
        let mut session = Session::new();
        assert!(matches!(
            session.record_interpretation(&interpretation()),
            Err(Error::NoSelection)
        ));

        session.begin_generation(submission(), images(3)).unwrap();
        assert!(matches!(
            session.record_interpretation(&interpretation()),
            Err(Error::NoSelection)
        ));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_record_appends_selected_image() {
        let mut session = Session::new();
        session.begin_generation(submission(), images(3)).unwrap();
        session.select_image(1).unwrap();

        let entry = session.record_interpretation(&interpretation()).unwrap();
        assert_eq!(entry.image.url, "https://images.test/1.png");
        assert_eq!(entry.summary, interpretation().summary());
        assert_eq!(entry.submission.narrative(), "曇り空、湖、木の橋");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_new_generation_clears_selection_but_keeps_history() {
        let mut session = Session::new();
        session.begin_generation(submission(), images(3)).unwrap();
        session.select_image(0).unwrap();
        session.record_interpretation(&interpretation()).unwrap();

        session.begin_generation(submission(), images(2)).unwrap();
        assert!(session.selected_image().is_none());
        assert_eq!(session.current_images().len(), 2);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_more_than_three_images_is_rejected() {
        let mut session = Session::new();
        let err = session.begin_generation(submission(), images(4)).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
        assert!(session.current_images().is_empty());
    }

    #[test]
    fn test_empty_image_set_is_allowed() {
        let mut session = Session::new();
        session.begin_generation(submission(), images(0)).unwrap();
        assert!(session.select_image(0).is_err());
    }
}
