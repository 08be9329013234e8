//! Prompt construction helpers shared by the planners.

use std::fmt::Write;

use planwright_core::FunctionRegistry;

/// Render the function catalog section of a planner prompt.
///
/// Functions appear in registration order, so identical registries
/// always produce identical prompts.
pub fn render_catalog(registry: &FunctionRegistry) -> String {
    let mut catalog = String::new();
    for descriptor in registry.iter() {
        let _ = writeln!(
            catalog,
            "- {}: {}",
            descriptor.qualified_name(),
            descriptor.description
        );
        for parameter in &descriptor.parameters {
            match &parameter.default {
                Some(default) => {
                    let _ = writeln!(
                        catalog,
                        "    {}: {} (default: {})",
                        parameter.name, parameter.description, default
                    );
                }
                None => {
                    let _ = writeln!(
                        catalog,
                        "    {}: {}",
                        parameter.name, parameter.description
                    );
                }
            }
        }
    }
    catalog
}

/// Extract the first top-level JSON object from a completion.
///
/// Providers often wrap JSON in prose or code fences; take everything
/// between the first `{` and the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use planwright_core::{FunctionDescriptor, ParameterSpec};

    #[test]
    fn test_catalog_lists_functions_in_registration_order() {
        let mut registry = FunctionRegistry::new();
        for (collection, name) in [("text", "concat"), ("email", "send")] {
            registry
                .register(
                    FunctionDescriptor::builder()
                        .collection(collection)
                        .name(name)
                        .description("does a thing")
                        .parameter(
                            ParameterSpec::new("input", "the input").with_default("none"),
                        )
                        .invoke(|_| Box::pin(async { Ok(String::new()) }))
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }

        let catalog = render_catalog(&registry);
        let concat_at = catalog.find("text.concat").unwrap();
        let send_at = catalog.find("email.send").unwrap();
        assert!(concat_at < send_at);
        assert!(catalog.contains("input: the input (default: none)"));
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(
            extract_json("Sure! ```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(extract_json("no braces here"), None);
        assert_eq!(extract_json("} reversed {"), None);
    }
}
