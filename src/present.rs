//! Plain-text rendering of images, readings and history for the terminal.

use crate::models::{DreamInterpretation, DreamSubmission, GeneratedImage, HistoryEntry};
use crate::share::ShareLinks;

const RULE: &str = "────────────────────────────────────────";

pub fn render_images(images: &[GeneratedImage]) -> String {
    if images.is_empty() {
        return "No images were generated.\n".to_string();
    }

    let mut out = String::from("Generated images - pick the one closest to your dream:\n");
    for (i, image) in images.iter().enumerate() {
        out.push_str(&format!("\n  #{}  {}\n", i + 1, image.url));
        out.push_str(&format!("      {}\n", image.source_prompt));
    }
    out
}

pub fn render_interpretation(
    submission: &DreamSubmission,
    image: &GeneratedImage,
    interpretation: &DreamInterpretation,
) -> String {
    let mut out = format!("Your dream image\n  {}\n\n", image.url);

    section(&mut out, "Symbolism & Interpretation");
    labelled(&mut out, "Symbolic meaning", &interpretation.symbolic_meaning);
    labelled(
        &mut out,
        "Psychological interpretation",
        &interpretation.psychological_interpretation,
    );

    section(&mut out, "Emotional Analysis");
    out.push_str(&format!("  {}\n", interpretation.emotional_analysis));
    if let Some(emotions) = submission.emotions_csv() {
        let intensity = submission.emotion_intensity().value();
        out.push_str(&format!("Primary emotions: {}\n", emotions));
        out.push_str(&format!(
            "Intensity: {} {}/10\n",
            intensity_bar(intensity),
            intensity
        ));
    }
    if !submission.additional_emotion_notes().is_empty() {
        out.push_str(&format!(
            "Notes: {}\n",
            submission.additional_emotion_notes()
        ));
    }

    section(&mut out, "Key Symbols");
    for (i, symbol) in interpretation.key_symbols.iter().enumerate() {
        out.push_str(&format!("  [Symbol {}] {}\n", i + 1, symbol));
    }

    section(&mut out, "Advice");
    labelled(&mut out, "Positive aspects", &interpretation.positive_aspects);
    labelled(&mut out, "Concrete advice", &interpretation.future_advice);
    labelled(&mut out, "Points to consider", &interpretation.points_to_consider);

    out
}

pub fn render_share_links(links: &ShareLinks) -> String {
    let mut out = String::new();
    section(&mut out, "Share");
    labelled(&mut out, "Image", &links.image);
    labelled(&mut out, "Reading", &links.interpretation);
    labelled(&mut out, "Image and reading", &links.combined);
    out
}

pub fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "No readings yet in this session.\n".to_string();
    }

    let mut out = String::new();
    for (i, entry) in history.iter().enumerate() {
        out.push_str(&format!(
            "Reading {} - {}\n",
            i + 1,
            entry.timestamp.format("%Y-%m-%d %H:%M")
        ));
        out.push_str(&format!("  Dream: {}\n", entry.submission.narrative()));
        if let Some(emotions) = entry.submission.emotions_csv() {
            out.push_str(&format!(
                "  Emotions: {} ({}/10)\n",
                emotions,
                entry.submission.emotion_intensity().value()
            ));
        }
        out.push_str(&format!("  Image: {}\n", entry.image.url));
        for line in entry.summary.lines() {
            out.push_str(&format!("  {}\n", line));
        }
        out.push('\n');
    }
    out
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n{}\n{}\n", RULE, title, RULE));
}

fn labelled(out: &mut String, label: &str, text: &str) {
    out.push_str(&format!("{}:\n  {}\n", label, text));
}

fn intensity_bar(value: u8) -> String {
    let filled = usize::from(value.min(10));
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Emotion, EmotionIntensity, GeneratedPrompt, InterpretationStyle};

    fn image() -> GeneratedImage {
        GeneratedImage {
            source_prompt: GeneratedPrompt::new("A lake at dawn, photorealistic"),
            url: "https://images.test/1.png".to_string(),
        }
    }

    fn interpretation() -> DreamInterpretation {
        DreamInterpretation {
            symbolic_meaning: "The lake mirrors your mind".to_string(),
            psychological_interpretation: "A need for stability".to_string(),
            key_symbols: vec!["lake: depth".to_string(), "bridge: change".to_string()],
            emotional_analysis: "Muted anxiety".to_string(),
            future_advice: "Take small steps".to_string(),
            positive_aspects: "Readiness".to_string(),
            points_to_consider: "Rest".to_string(),
        }
    }

    #[test]
    fn test_render_images_numbers_from_one() {
        let out = render_images(&[image(), image()]);
        assert!(out.contains("#1  https://images.test/1.png"));
        assert!(out.contains("#2"));
        assert!(out.contains("A lake at dawn"));
        assert!(render_images(&[]).contains("No images"));
    }

    #[test]
    fn test_render_interpretation_has_four_sections() {
        let submission = DreamSubmission::new("a lake", InterpretationStyle::Spiritual).unwrap();
        let out = render_interpretation(&submission, &image(), &interpretation());

        for title in [
            "Symbolism & Interpretation",
            "Emotional Analysis",
            "Key Symbols",
            "Advice",
        ] {
            assert!(out.contains(title), "missing {}", title);
        }
        assert!(out.contains("[Symbol 2] bridge: change"));
        assert!(out.contains("Take small steps"));
        assert!(!out.contains("Primary emotions"));
    }

    #[test]
    fn test_render_interpretation_shows_emotion_data() {
        let submission = DreamSubmission::new("a lake", InterpretationStyle::Spiritual)
            .unwrap()
            .with_emotions([Emotion::Joy])
            .with_intensity(EmotionIntensity::new(3).unwrap())
            .with_notes("faded quickly");
        let out = render_interpretation(&submission, &image(), &interpretation());

        assert!(out.contains("Primary emotions: joy"));
        assert!(out.contains("███░░░░░░░ 3/10"));
        assert!(out.contains("Notes: faded quickly"));
    }

    #[test]
    fn test_render_history() {
        assert!(render_history(&[]).contains("No readings"));

        let submission = DreamSubmission::new("a lake", InterpretationStyle::Spiritual)
            .unwrap()
            .with_emotions([Emotion::Fear]);
        let entry = HistoryEntry::new(submission, image(), &interpretation());
        let out = render_history(&[entry]);

        assert!(out.contains("Reading 1 - "));
        assert!(out.contains("Dream: a lake"));
        assert!(out.contains("Emotions: fear (5/10)"));
        assert!(out.contains("Symbolic meaning: The lake mirrors your mind"));
    }

    #[test]
    fn test_render_share_links_layout() {
        let links = ShareLinks {
            image: "https://x.test/i".to_string(),
            interpretation: "https://x.test/r".to_string(),
            combined: "https://x.test/c".to_string(),
        };
        let expected = format!(
            "\n{rule}\nShare\n{rule}\n\
             Image:\n  https://x.test/i\n\
             Reading:\n  https://x.test/r\n\
             Image and reading:\n  https://x.test/c\n",
            rule = RULE
        );
        assert_eq!(render_share_links(&links), expected);
    }

    #[test]
    fn test_render_interpretation_opens_with_image() {
        let submission = DreamSubmission::new("a lake", InterpretationStyle::Spiritual).unwrap();
        let out = render_interpretation(&submission, &image(), &interpretation());
        assert!(out.starts_with("Your dream image\n  https://images.test/1.png\n\n"));
        assert!(out.contains("Symbolic meaning:\n  The lake mirrors your mind\n"));
        assert!(out.ends_with("Points to consider:\n  Rest\n"));
    }

    #[test]
    fn test_intensity_bar_width() {
        assert_eq!(intensity_bar(10).chars().count(), 10);
        assert_eq!(intensity_bar(1), "█░░░░░░░░░");
    }
}
