//! System prompts for LLM-backed chunk translation.
//!
//! Callers can override the default via
//! [`crate::config::PipelineConfig::system_prompt`]; the template here is
//! used only when no override is provided. Both templates support the
//! `{target}` and `{source}` placeholders.

/// Default system prompt for translating one chunk of extracted PDF text.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a professional translation engine. Translate the text supplied by the user into the language with code "{target}".

Follow these rules precisely:

1. SOURCE LANGUAGE
   - The source language is "{source}". If it is "auto", detect it yourself.
   - If the text is already in the target language, return it unchanged.

2. FIDELITY
   - Translate ALL of the text; do not summarise or omit anything
   - Preserve line breaks, numbering, and spacing where possible
   - The text is a fragment of a longer document and may start or end
     mid-sentence or mid-word; translate it as it stands

3. OUTPUT FORMAT
   - Output ONLY the translated text
   - Do NOT wrap the output in ``` fences
   - Do NOT add commentary, notes, or a preamble"#;

/// Render a prompt template for the given language pair.
pub fn render_system_prompt(template: &str, source: &str, target: &str) -> String {
    template
        .replace("{target}", target)
        .replace("{source}", source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_substitutes_languages() {
        let p = render_system_prompt(DEFAULT_SYSTEM_PROMPT, "auto", "es");
        assert!(p.contains("\"es\""));
        assert!(p.contains("\"auto\""));
        assert!(!p.contains("{target}"));
        assert!(!p.contains("{source}"));
    }

    #[test]
    fn custom_template_without_placeholders_is_untouched() {
        let p = render_system_prompt("Translate politely.", "auto", "fr");
        assert_eq!(p, "Translate politely.");
    }
}
