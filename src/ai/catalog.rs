//! The catalog of model presets a user can pick from. Each preset
//! carries the response template the simulated provider renders, so
//! swapping the catalog swaps the canned responses without code changes.
use std::fmt;
use std::fs;

use anyhow::{Context, Error, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Category {
    #[serde(rename = "Chat/QA")]
    ChatQa,
    Coding,
    Multilingual,
    Experimental,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Category::ChatQa => "Chat/QA",
            Category::Coding => "Coding",
            Category::Multilingual => "Multilingual",
            Category::Experimental => "Experimental",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ModelPreset {
    pub id: String,
    pub name: String,
    pub category: Category,
    /// Handlebars template with `{{prompt}}` and `{{model}}` available.
    pub template: String,
}

impl ModelPreset {
    fn new(id: &str, name: &str, category: Category, template: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            template: template.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Catalog(Vec<ModelPreset>);

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn new(presets: Vec<ModelPreset>) -> Result<Self, Error> {
        for (i, preset) in presets.iter().enumerate() {
            if preset.id.trim().is_empty() {
                bail!("Model preset at position {} has an empty id", i);
            }
            if presets[..i].iter().any(|p| p.id == preset.id) {
                bail!("Duplicate model preset id: {}", preset.id);
            }
        }
        Ok(Self(presets))
    }

    /// Load a catalog from a JSON array of presets.
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model catalog {}", path))?;
        let presets: Vec<ModelPreset> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model catalog {}", path))?;
        Self::new(presets)
    }

    pub fn builtin() -> Self {
        use Category::*;

        Self(vec![
            // Chat / QA
            ModelPreset::new(
                "mistral-7b-instruct",
                "Mistral 7B Instruct",
                ChatQa,
                r#"Mistral 7B Instruct Response: I understand you're asking about "{{prompt}}". This is a fast and efficient response from Mistral's instruction-tuned model with clear explanations..."#,
            ),
            ModelPreset::new(
                "kimi-72b",
                "Kimi 72B",
                ChatQa,
                r#"Kimi 72B Response: Thank you for your question about "{{prompt}}". As a large-scale model, I can provide comprehensive analysis with deep understanding..."#,
            ),
            ModelPreset::new(
                "cypher-alpha",
                "Cypher Alpha",
                ChatQa,
                r#"Cypher Alpha Response: Analyzing your query "{{prompt}}" with advanced reasoning capabilities and sophisticated problem-solving approaches..."#,
            ),
            ModelPreset::new(
                "qwen3-14b",
                "Qwen3 14B",
                ChatQa,
                r#"Qwen3 14B Response: Processing your request about "{{prompt}}" with balanced performance and reliable insights..."#,
            ),
            ModelPreset::new(
                "qwen3-30b-a3b",
                "Qwen3 30B A3B",
                ChatQa,
                r#"Qwen3 30B A3B Response: As a high-capacity model, I can provide detailed analysis of "{{prompt}}" with extensive knowledge and nuanced understanding..."#,
            ),
            // Coding
            ModelPreset::new(
                "deepseek-chat",
                "DeepSeek Chat",
                Coding,
                r#"DeepSeek Chat Response: For your coding-related question "{{prompt}}", I can provide specialized assistance with code generation, debugging, and best practices..."#,
            ),
            ModelPreset::new(
                "dolphin3.0-r1",
                "Dolphin 3.0 R1",
                Coding,
                r#"Dolphin 3.0 R1 Response: As a code generation expert, I can help you with "{{prompt}}" by providing efficient, well-structured code solutions..."#,
            ),
            ModelPreset::new(
                "chimera",
                "Chimera",
                Coding,
                r#"Chimera Response: With multi-modal coding capabilities, I can assist with "{{prompt}}" through various programming paradigms and approaches..."#,
            ),
            ModelPreset::new(
                "qwen3-8b",
                "Qwen3 8B",
                Coding,
                r#"Qwen3 8B Response: For your coding query "{{prompt}}", I can provide efficient solutions with optimized performance..."#,
            ),
            // Multilingual
            ModelPreset::new(
                "sarvam-m",
                "Sarvam M",
                Multilingual,
                r#"Sarvam M Response: For your question "{{prompt}}", I can provide support in Indian languages with cultural context and local understanding..."#,
            ),
            ModelPreset::new(
                "glm-z1",
                "GLM Z1",
                Multilingual,
                r#"GLM Z1 Response: Processing your multilingual query "{{prompt}}" with cross-language understanding and translation capabilities..."#,
            ),
            // Experimental
            ModelPreset::new(
                "llama-4-maverick",
                "Llama 4 Maverick",
                Experimental,
                r#"Llama 4 Maverick Response: As an experimental model, I can explore "{{prompt}}" with cutting-edge features and innovative approaches..."#,
            ),
            ModelPreset::new(
                "mai-ds-r1",
                "MAI DS R1",
                Experimental,
                r#"MAI DS R1 Response: For your research question "{{prompt}}", I can provide experimental insights and novel perspectives..."#,
            ),
        ])
    }

    pub fn presets(&self) -> &[ModelPreset] {
        &self.0
    }

    pub fn find(&self, id: &str) -> Option<&ModelPreset> {
        self.0.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}
