use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

pub const SYSTEM_PROMPT: &str = include_str!("prompts/system.md");
pub const EXTRACT_TEMPLATE: &str = include_str!("prompts/extract.md");
pub const VERIFY_TEMPLATE: &str = include_str!("prompts/verify.md");
pub const CONFIRM_TEMPLATE: &str = include_str!("prompts/confirm.md");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_prompt() {
        let template = "Text:\n{{ text }}";
        let mut context = HashMap::new();
        context.insert("text".to_string(), "Paris is the capital of France.".to_string());

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(result, "Text:\nParis is the capital of France.");
    }

    #[test]
    fn test_load_prompt_missing_variable() {
        let mut context = HashMap::new();
        context.insert("text".to_string(), "only text".to_string());
        // 'triples' is missing from context
        let result = load_prompt(VERIFY_TEMPLATE, &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_text_is_not_escaped_or_interpreted() {
        let mut context = HashMap::new();
        context.insert(
            "text".to_string(),
            "<b>A & B</b> \"quoted\" {{ not_a_variable }}".to_string(),
        );

        let result = load_prompt(EXTRACT_TEMPLATE, &context).unwrap();
        assert!(result.contains("<b>A & B</b> \"quoted\" {{ not_a_variable }}"));
    }
}
