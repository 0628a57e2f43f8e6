//! Maps a structured script request to a timed script. Pure and deterministic.

use crate::models::script::{GeneratedScript, ScriptInput, ScriptSection, ScriptTone};
use thiserror::Error;

const DEFAULT_CALL_TO_ACTION: &str = "Follow for more";
const DEFAULT_AUDIENCE: &str = "your audience";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("a topic is required to generate a script")]
    MissingTopic,
    #[error("duration must be greater than zero seconds")]
    InvalidDuration,
}

pub trait ScriptGenerator: Send + Sync {
    fn generate(&self, input: &ScriptInput) -> Result<GeneratedScript, GenerationError>;
}

/// Builds scripts from fixed templates: intro, one section per key point,
/// outro with the call to action.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateScriptGenerator;

impl ScriptGenerator for TemplateScriptGenerator {
    fn generate(&self, input: &ScriptInput) -> Result<GeneratedScript, GenerationError> {
        generate_script(input)
    }
}

pub fn generate_script(input: &ScriptInput) -> Result<GeneratedScript, GenerationError> {
    let topic = input.topic.trim();
    if topic.is_empty() {
        return Err(GenerationError::MissingTopic);
    }
    if input.duration_seconds == 0 {
        return Err(GenerationError::InvalidDuration);
    }

    let audience = match input.target_audience.trim() {
        "" => DEFAULT_AUDIENCE,
        a => a,
    };
    let call_to_action = input
        .call_to_action
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CALL_TO_ACTION)
        .to_string();

    let points: Vec<&str> = input
        .key_points
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    let hook = hook_line(input.tone, topic, audience);

    let mut blocks: Vec<(String, String)> = Vec::with_capacity(points.len() + 2);
    blocks.push(("Intro".to_string(), hook.clone()));
    if points.is_empty() {
        blocks.push((
            "Overview".to_string(),
            format!("Walk {} through what {} means for them and why it matters now.", audience, topic),
        ));
    } else {
        for (i, point) in points.iter().enumerate() {
            blocks.push((format!("Point {}", i + 1), point_line(input.tone, point)));
        }
    }
    blocks.push((
        "Outro".to_string(),
        format!("That's {} in a nutshell. {}!", topic, call_to_action),
    ));

    let durations = split_duration(input.duration_seconds, blocks.len());
    let sections = blocks
        .into_iter()
        .zip(durations)
        .map(|((heading, content), duration_seconds)| ScriptSection {
            heading,
            content,
            duration_seconds,
        })
        .collect();

    Ok(GeneratedScript {
        title: format!("{}: {} ({})", topic, headline(input.tone), input.tone),
        hook,
        sections,
        call_to_action,
        total_duration_seconds: input.duration_seconds,
    })
}

fn headline(tone: ScriptTone) -> &'static str {
    match tone {
        ScriptTone::Professional => "What You Need to Know",
        ScriptTone::Casual => "Let's Talk About It",
        ScriptTone::Energetic => "Don't Miss This",
        ScriptTone::Educational => "A Quick Lesson",
    }
}

fn hook_line(tone: ScriptTone, topic: &str, audience: &str) -> String {
    match tone {
        ScriptTone::Professional => {
            format!("Here is what {} should know about {}.", audience, topic)
        }
        ScriptTone::Casual => format!("Hey {}, let's chat about {} for a minute.", audience, topic),
        ScriptTone::Energetic => format!("Stop scrolling! {} is about to change everything for {}.", topic, audience),
        ScriptTone::Educational => format!("Today {} will learn the essentials of {}.", audience, topic),
    }
}

fn point_line(tone: ScriptTone, point: &str) -> String {
    match tone {
        ScriptTone::Professional => format!("{}.", point.trim_end_matches('.')),
        ScriptTone::Casual => format!("So here's the thing: {}.", point.trim_end_matches('.')),
        ScriptTone::Energetic => format!("{}!", point.trim_end_matches(['.', '!'])),
        ScriptTone::Educational => format!("Key idea: {}.", point.trim_end_matches('.')),
    }
}

/// Split `total` seconds across `parts` sections; the last section takes the remainder.
fn split_duration(total: u32, parts: usize) -> Vec<u32> {
    let parts = parts.max(1) as u32;
    let base = total / parts;
    let mut out = vec![base; parts as usize];
    if let Some(last) = out.last_mut() {
        *last += total - base * parts;
    }
    out
}
