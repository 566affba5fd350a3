use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::interpret::InterpretationContext;

mod gemini;
pub mod prompt;

pub use gemini::GeminiNarrator;

/// Shown for any failed narrator call.
pub const NARRATION_FAILURE: &str = "Erro de conexão com o Mentor.";
/// Shown when no API key is configured.
pub const NARRATOR_UNCONFIGURED: &str = "Configuração de API pendente.";
pub const EMPTY_SELECTION: &str = "Selecione uma casa ocupada para análise.";
/// The model answered with no text.
pub const EMPTY_SYNTHESIS: &str = "Erro na síntese.";

/// Remote prose generator for a resolved interpretation context.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, context: &InterpretationContext) -> Result<String>;
}

/// Stand-in used when no API key is set.
pub struct Unconfigured;

#[async_trait]
impl Narrator for Unconfigured {
    async fn narrate(&self, _context: &InterpretationContext) -> Result<String> {
        Ok(NARRATOR_UNCONFIGURED.to_string())
    }
}

pub fn from_config(cfg: &Config) -> Box<dyn Narrator> {
    match &cfg.narrator_api_key {
        Some(key) => Box::new(GeminiNarrator::new(key.clone(), &cfg.narrator_model, &cfg.narrator_base)),
        None => Box::new(Unconfigured),
    }
}

/// Run the narrator and collapse every failure into the fixed user-facing
/// strings. Returns the text and whether the call succeeded.
pub async fn narrate_or_fallback(narrator: &dyn Narrator, context: &InterpretationContext) -> (String, bool) {
    match narrator.narrate(context).await {
        Ok(text) if text.trim().is_empty() => (EMPTY_SYNTHESIS.to_string(), false),
        Ok(text) => (text, true),
        Err(_) => (NARRATION_FAILURE.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, CardId, Layout};
    use crate::interpret::{build_context, ReadingTheme, StudyLevel};
    use anyhow::anyhow;

    struct Failing;

    #[async_trait]
    impl Narrator for Failing {
        async fn narrate(&self, _context: &InterpretationContext) -> Result<String> {
            Err(anyhow!("connection reset"))
        }
    }

    struct Blank;

    #[async_trait]
    impl Narrator for Blank {
        async fn narrate(&self, _context: &InterpretationContext) -> Result<String> {
            Ok("  ".to_string())
        }
    }

    fn context() -> InterpretationContext {
        let board = Board::from_cards(CardId::all());
        build_context(&board, 0, Layout::Grid, ReadingTheme::General, StudyLevel::Beginner).unwrap()
    }

    #[tokio::test]
    async fn test_failure_collapses_to_fixed_string() {
        let (text, ok) = narrate_or_fallback(&Failing, &context()).await;
        assert_eq!(text, NARRATION_FAILURE);
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_blank_answer() {
        let (text, ok) = narrate_or_fallback(&Blank, &context()).await;
        assert_eq!(text, EMPTY_SYNTHESIS);
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let (text, ok) = narrate_or_fallback(&Unconfigured, &context()).await;
        assert_eq!(text, NARRATOR_UNCONFIGURED);
        assert!(ok);
    }
}
