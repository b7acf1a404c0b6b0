//! Bundled prompt templates

use crate::mcp::{PromptArgument, PromptDefinition};

/// Argument spec: (name, description, required)
type ArgSpec = (&'static str, &'static str, bool);

/// All bundled prompts: (name, title, description, arguments, template)
pub const PROMPT_DEFINITIONS: &[(&str, &str, &str, &[ArgSpec], &str)] = &[
    (
        "image_prompt",
        "Image generation prompt",
        "Write a detailed image generation prompt for a subject, with optional style and mood.",
        &[
            ("subject", "What the image should show", true),
            ("style", "Art style, e.g. watercolor or isometric 3D", false),
            ("mood", "Overall mood or lighting", false),
        ],
        "Write a single, vivid prompt for an image generation model.\n\
         Subject: {{subject}}\n\
         Style: {{style}}\n\
         Mood: {{mood}}\n\
         Leave out any field above that is empty. Describe composition, lighting and color.",
    ),
    (
        "describe_tool",
        "Explain a tool",
        "Ask for a plain-language explanation of one of the server's tools and how to call it.",
        &[
            ("tool", "Name of the tool to explain", true),
            ("goal", "What the user is trying to achieve", false),
        ],
        "Call tools/list, find the tool named `{{tool}}` and explain what it does, \
         which arguments it needs and show one example call.{{goal}}",
    ),
];

/// Get all bundled prompts as PromptDefinition structs
pub fn get_prompt_definitions() -> Vec<PromptDefinition> {
    PROMPT_DEFINITIONS
        .iter()
        .map(|(name, title, description, arguments, template)| {
            arguments.iter().fold(
                PromptDefinition::new(*name, *title, *description, *template),
                |prompt, (arg, arg_description, required)| {
                    prompt.with_argument(if *required {
                        PromptArgument::required(*arg, *arg_description)
                    } else {
                        PromptArgument::optional(*arg, *arg_description)
                    })
                },
            )
        })
        .collect()
}
