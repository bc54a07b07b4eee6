pub const KEYWORDS_SYSTEM: &str = include_str!("../data/prompts/keywords_system.txt");
pub const KEYWORDS_USER: &str = include_str!("../data/prompts/keywords_user.txt");
pub const IMAGE_PROMPT_SYSTEM: &str = include_str!("../data/prompts/image_prompt_system.txt");
pub const IMAGE_PROMPT_USER: &str = include_str!("../data/prompts/image_prompt_user.txt");
pub const DIVERSE_SYSTEM: &str = include_str!("../data/prompts/diverse_system.txt");
pub const DIVERSE_USER: &str = include_str!("../data/prompts/diverse_user.txt");
pub const INTERPRETATION_SYSTEM: &str = include_str!("../data/prompts/interpretation_system.txt");
pub const INTERPRETATION_USER: &str = include_str!("../data/prompts/interpretation_user.txt");

/// Phrases every diversified prompt must carry.
pub const PHOTOREALISM_QUALIFIERS: [&str; 4] = [
    "photorealistic",
    "highly detailed",
    "4k",
    "natural lighting",
];

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Qualifiers quoted and comma separated, as used in the diversified system prompt.
pub fn qualifier_list() -> String {
    PHOTOREALISM_QUALIFIERS
        .iter()
        .map(|q| format!("\"{}\"", q))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Dream: {{dream}}", &[("dream", "a lake")]),
            "Dream: a lake"
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(
            render("{{a}} and {{b}}", &[("a", "cats")]),
            "cats and {{b}}"
        );
    }

    #[test]
    fn test_prompts_are_non_empty() {
        for template in [
            KEYWORDS_SYSTEM,
            KEYWORDS_USER,
            IMAGE_PROMPT_SYSTEM,
            IMAGE_PROMPT_USER,
            DIVERSE_SYSTEM,
            DIVERSE_USER,
            INTERPRETATION_SYSTEM,
            INTERPRETATION_USER,
        ] {
            assert!(!template.trim().is_empty());
        }
    }

    #[test]
    fn test_user_templates_have_placeholders() {
        assert!(KEYWORDS_USER.contains("{{dream}}"));
        assert!(IMAGE_PROMPT_USER.contains("{{keywords}}"));
        assert!(DIVERSE_SYSTEM.contains("{{qualifiers}}"));
        assert!(DIVERSE_USER.contains("{{dream}}"));
        assert!(DIVERSE_USER.contains("{{variations}}"));
        for key in ["style", "dream", "emotions", "intensity", "notes"] {
            assert!(
                INTERPRETATION_USER.contains(&format!("{{{{{}}}}}", key)),
                "missing {}",
                key
            );
        }
    }

    #[test]
    fn test_interpretation_template_names_every_field() {
        for field in [
            "symbolic_meaning",
            "psychological_interpretation",
            "key_symbols",
            "emotional_analysis",
            "future_advice",
            "positive_aspects",
            "points_to_consider",
        ] {
            assert!(INTERPRETATION_USER.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_qualifier_list_quotes_each_phrase() {
        assert_eq!(
            qualifier_list(),
            "\"photorealistic\", \"highly detailed\", \"4k\", \"natural lighting\""
        );
    }
}
