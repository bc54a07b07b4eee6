//! Validation of raw chat-model replies.
//!
//! Model output is untrusted text. Everything here either returns a fully
//! populated value or `Error::MalformedResponse`; callers never see a
//! partially parsed reply.

use crate::models::{DreamInterpretation, GeneratedPrompt};
use crate::prompts::PHOTOREALISM_QUALIFIERS;
use crate::{Error, Result};

/// Number of prompts in a diversified set.
pub const PROMPT_SET_SIZE: usize = 3;

const MAX_LABEL_CHARS: usize = 40;
const MAX_LABEL_WORDS: usize = 6;
const MAX_ENUMERATOR_WORD_CHARS: usize = 12;

/// Split a diversified-prompt reply into exactly [`PROMPT_SET_SIZE`] prompts.
///
/// A blank line or an enumerated line (`1.`, `2)`, `Prompt 3:`) starts a new
/// prompt; any other line continues the one before it. When at least three
/// prompts are enumerated, unnumbered chatter around them is dropped.
pub fn parse_prompt_set(raw: &str) -> Result<Vec<GeneratedPrompt>> {
    let normalized = raw.replace("\r\n", "\n");

    let mut candidates = split_candidates(&normalized);
    let enumerated = candidates.iter().filter(|c| has_enumerator(c)).count();
    if enumerated >= PROMPT_SET_SIZE {
        candidates.retain(|c| has_enumerator(c));
    }

    let segments = usable_segments(candidates.iter().map(String::as_str));
    if segments.len() < PROMPT_SET_SIZE {
        return Err(Error::MalformedResponse(format!(
            "expected {} prompts, found {}",
            PROMPT_SET_SIZE,
            segments.len()
        )));
    }

    Ok(segments
        .into_iter()
        .take(PROMPT_SET_SIZE)
        .map(|s| GeneratedPrompt::new(ensure_qualifiers(&s)))
        .collect())
}

/// Validate a single free-text prompt reply.
pub fn parse_single_prompt(raw: &str) -> Result<GeneratedPrompt> {
    let prompt = strip_quotes(raw.trim());
    if prompt.is_empty() {
        return Err(Error::MalformedResponse(
            "image prompt reply was empty".to_string(),
        ));
    }
    Ok(GeneratedPrompt::new(prompt))
}

/// Parse the interpretation JSON object, rejecting missing or blank fields.
pub fn parse_interpretation(raw: &str) -> Result<DreamInterpretation> {
    let body = strip_code_fence(raw);

    let interpretation: DreamInterpretation = serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("interpretation is not valid: {}", e)))?;

    let text_fields = [
        ("symbolic_meaning", &interpretation.symbolic_meaning),
        (
            "psychological_interpretation",
            &interpretation.psychological_interpretation,
        ),
        ("emotional_analysis", &interpretation.emotional_analysis),
        ("future_advice", &interpretation.future_advice),
        ("positive_aspects", &interpretation.positive_aspects),
        ("points_to_consider", &interpretation.points_to_consider),
    ];
    if let Some((name, _)) = text_fields.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(Error::MalformedResponse(format!("{} is empty", name)));
    }

    if interpretation.key_symbols.iter().all(|s| s.trim().is_empty()) {
        return Err(Error::MalformedResponse("key_symbols is empty".to_string()));
    }

    Ok(interpretation)
}

/// Append any photorealism qualifier the prompt does not already mention.
pub fn ensure_qualifiers(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    let missing: Vec<&str> = PHOTOREALISM_QUALIFIERS
        .iter()
        .copied()
        .filter(|q| !lower.contains(q))
        .collect();

    if missing.is_empty() {
        return prompt.to_string();
    }

    let base = prompt.trim_end().trim_end_matches(['.', ',']);
    format!("{}, {}", base, missing.join(", "))
}

fn split_candidates(text: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let mut paragraph_open = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            paragraph_open = false;
            continue;
        }
        match candidates.last_mut() {
            Some(current) if paragraph_open && !has_enumerator(line) => {
                current.push(' ');
                current.push_str(line);
            }
            _ => candidates.push(line.to_string()),
        }
        paragraph_open = true;
    }
    candidates
}

fn usable_segments<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| !is_preamble(p))
        .map(|p| strip_quotes(&strip_label(p)).to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn is_preamble(segment: &str) -> bool {
    segment.ends_with(':') || segment.ends_with('：')
}

/// `1.`, `2)`, `**3.**`, `Prompt 1:` or `プロンプト1：` at the start of a line.
fn has_enumerator(line: &str) -> bool {
    let rest = line.trim_start_matches(['-', '*', '#', ' ']);

    let word_len: usize = rest
        .chars()
        .take_while(|c| c.is_alphabetic())
        .map(char::len_utf8)
        .sum();
    let rest = if rest[..word_len].chars().count() <= MAX_ENUMERATOR_WORD_CHARS {
        rest[word_len..].trim_start()
    } else {
        rest
    };

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    rest[digits..]
        .trim_start_matches('*')
        .starts_with(['.', ')', ':', '：'])
}

/// Drop enumerators, markdown emphasis and a short `Label:` prefix.
fn strip_label(segment: &str) -> String {
    let mut rest = segment.trim_start_matches(['-', '*', '#', ' ']);

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(stripped) = after.strip_prefix(['.', ')']) {
            rest = stripped.trim_start();
        }
    }

    if let Some((label, body)) = split_label(rest) {
        let label = label.trim_matches(['*', ' ']);
        if label.chars().count() <= MAX_LABEL_CHARS
            && label.split_whitespace().count() <= MAX_LABEL_WORDS
        {
            rest = body;
        }
    }

    rest.trim().trim_matches('*').trim().to_string()
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let first_line = text.lines().next()?;
    let (idx, colon_len) = first_line
        .char_indices()
        .find(|(_, c)| *c == ':' || *c == '：')
        .map(|(i, c)| (i, c.len_utf8()))?;
    Some((&text[..idx], &text[idx + colon_len..]))
}

fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('「', '」')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|t| t.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    trimmed
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the optional language tag on the fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
