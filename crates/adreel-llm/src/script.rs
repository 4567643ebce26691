//! Campaign idea to ad script.

use std::sync::Arc;

use adreel_models::{Scene, Script};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{LlmError, LlmResult};
use crate::parse::{extract_delimited, strip_code_fences};
use crate::traits::{GenerationRequest, TextGenerator};

const SYSTEM_PROMPT: &str = "You are an expert ad scriptwriter.";

/// Generates scene-by-scene ad scripts from a campaign idea.
#[derive(Clone)]
pub struct ScriptGenerator {
    generator: Arc<dyn TextGenerator>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptPayload {
    Scenes(Vec<Scene>),
    Wrapped { scenes: Vec<Scene> },
}

impl ScriptPayload {
    fn into_scenes(self) -> Vec<Scene> {
        match self {
            ScriptPayload::Scenes(scenes) | ScriptPayload::Wrapped { scenes } => scenes,
        }
    }
}

impl ScriptGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate and validate a script for the idea.
    pub async fn generate(&self, campaign_idea: &str) -> LlmResult<Script> {
        let idea = campaign_idea.trim();
        if idea.is_empty() {
            return Err(LlmError::InvalidInput("campaign idea is empty".to_string()));
        }

        let request = GenerationRequest::new(build_prompt(idea))
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.7)
            .with_max_tokens(800);

        let text = self.generator.generate(&request).await?;
        debug!(chars = text.len(), "Received script text");

        let script = parse_script(&text)?;
        info!(
            scenes = script.len(),
            total_secs = script.total_duration_secs(),
            "Generated ad script"
        );
        Ok(script)
    }
}

/// Parse model output into a validated script.
///
/// Accepts a bare JSON array, an object with a `scenes` array, fenced JSON,
/// or an array embedded in surrounding prose.
pub fn parse_script(text: &str) -> LlmResult<Script> {
    let text = strip_code_fences(text);

    let scenes = match serde_json::from_str::<ScriptPayload>(text) {
        Ok(payload) => payload.into_scenes(),
        Err(first_err) => {
            let slice = extract_delimited(text, '[', ']').ok_or_else(|| {
                LlmError::invalid_response(format!("script is not JSON: {}", first_err))
            })?;
            serde_json::from_str::<Vec<Scene>>(slice).map_err(|e| {
                LlmError::invalid_response(format!("failed to parse script scenes: {}", e))
            })?
        }
    };

    if scenes.is_empty() {
        return Err(LlmError::invalid_response("script has no scenes"));
    }

    Script::new(scenes).map_err(|e| LlmError::invalid_response(e.to_string()))
}

fn build_prompt(idea: &str) -> String {
    format!(
        r#"You are a world-class creative ad scriptwriter with a talent for storytelling, visual poetry and bold branding.
Turn the client's campaign idea into an imaginative video script of about 15 seconds, unless the idea asks for another length.

Use bold visuals and a compelling story arc, and work the brand into the narrative organically rather than as a hard sell.

Return ONLY a JSON array with 2 to 4 scenes, following this structure:

[
  {{
    "scene": 1,
    "duration": "5s",
    "visual_description": "What the viewer sees: setting, mood, movement and atmosphere.",
    "dialogue": "Voice-over or character dialogue.",
    "on_screen_text": "Taglines, punchlines or product names shown on screen."
  }}
]

Client's campaign idea: "{idea}"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: LlmResult<String>,
        prompts: Mutex<Vec<GenerationRequest>>,
    }

    impl CannedGenerator {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
            self.prompts.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(LlmError::RequestFailed(e.to_string())),
            }
        }
    }

    const TWO_SCENES: &str = r#"[
        {"scene": 1, "duration": "5s", "visual_description": "Sunrise over a quiet city",
         "dialogue": "Every day starts somewhere.", "on_screen_text": "WAKE UP"},
        {"scene": 2, "duration": "10s", "visual_description": "Steaming coffee cup on a desk",
         "dialogue": "Make it count.", "on_screen_text": "BrewCo"}
    ]"#;

    #[test]
    fn test_parse_plain_array() {
        let script = parse_script(TWO_SCENES).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.total_duration_secs(), 15.0);
    }

    #[test]
    fn test_parse_array_inside_prose() {
        let text = format!("Here is your script:\n{}\nHope you like it!", TWO_SCENES);
        assert_eq!(parse_script(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_wrapped_and_fenced() {
        let text = format!("```json\n{{\"scenes\": {}}}\n```", TWO_SCENES);
        assert_eq!(parse_script(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage_and_empty() {
        assert!(matches!(parse_script("no script today"), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(parse_script("[]"), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_rejects_duplicate_scene_ids() {
        let text = r#"[
            {"scene": 1, "duration": "5s", "visual_description": "a"},
            {"scene": 1, "duration": "5s", "visual_description": "b"}
        ]"#;
        assert!(matches!(parse_script(text), Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_generate_sends_idea_in_prompt() {
        let canned = CannedGenerator::ok(TWO_SCENES);
        let generator = ScriptGenerator::new(canned.clone());

        let script = generator.generate("  coffee for night owls ").await.unwrap();
        assert_eq!(script.scene(2).unwrap().on_screen_text.as_deref(), Some("BrewCo"));

        let prompts = canned.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].prompt.contains("\"coffee for night owls\""));
        assert_eq!(prompts[0].system.as_deref(), Some(SYSTEM_PROMPT));
    }

    #[test]
    fn test_blank_idea_is_rejected_without_calling_model() {
        let canned = CannedGenerator::ok(TWO_SCENES);
        let generator = ScriptGenerator::new(canned.clone());

        let result = tokio_test::block_on(generator.generate("   "));
        assert!(matches!(result, Err(LlmError::InvalidInput(_))));
        assert!(canned.prompts.lock().unwrap().is_empty());
    }
}
