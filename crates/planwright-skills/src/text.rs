//! Pure text manipulation functions.

use planwright_core::{FunctionDescriptor, FunctionRegistry, ParameterSpec, Result};

use crate::SkillProvider;

/// String operations under the `text` collection.
#[derive(Debug, Default)]
pub struct TextSkill;

impl TextSkill {
    pub fn new() -> Self {
        Self
    }
}

impl SkillProvider for TextSkill {
    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<()> {
        registry.register(
            FunctionDescriptor::builder()
                .collection("text")
                .name("concat")
                .description("Concatenates two strings into one.")
                .parameter(ParameterSpec::new(
                    "first",
                    "First input to concatenate with.",
                ))
                .parameter(ParameterSpec::new(
                    "second",
                    "Second input to concatenate with.",
                ))
                .invoke(|args| {
                    Box::pin(async move {
                        Ok(format!("{}{}", args.require("first")?, args.require("second")?))
                    })
                })
                .build()?,
        )?;

        registry.register(
            FunctionDescriptor::builder()
                .collection("text")
                .name("uppercase")
                .description("Converts a string to upper case.")
                .parameter(ParameterSpec::new("input", "The text to convert."))
                .invoke(|args| {
                    Box::pin(async move { Ok(args.require("input")?.to_uppercase()) })
                })
                .build()?,
        )?;

        registry.register(
            FunctionDescriptor::builder()
                .collection("text")
                .name("lowercase")
                .description("Converts a string to lower case.")
                .parameter(ParameterSpec::new("input", "The text to convert."))
                .invoke(|args| {
                    Box::pin(async move { Ok(args.require("input")?.to_lowercase()) })
                })
                .build()?,
        )?;

        registry.register(
            FunctionDescriptor::builder()
                .collection("text")
                .name("trim")
                .description("Trims whitespace from both ends of a string.")
                .parameter(ParameterSpec::new("input", "The text to trim."))
                .invoke(|args| {
                    Box::pin(async move { Ok(args.require("input")?.trim().to_string()) })
                })
                .build()?,
        )?;

        Ok(())
    }
}
