//! Prompt construction and response clean-up.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::JSON_FORMAT;

// both patterns are literals, compiled once
#[allow(clippy::unwrap_used)]
static ESCAPED_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\n").unwrap());

#[allow(clippy::unwrap_used)]
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Flattens model output onto one line.
///
/// Literal `\n` escape sequences become spaces, any run of whitespace
/// collapses to a single space, and the ends are trimmed.
pub fn clean_text(text: &str) -> String {
    let text = ESCAPED_NEWLINE.replace_all(text, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

/// Prompt sent alongside the screenshots.
pub fn generation_prompt(context: &str) -> String {
    format!(
        r#"
        You are a product manager and a tester. You help testers in testing the product with the help of images.
        Analyze the following screenshots of a digital product and provide detailed testing instructions.
        Consider the following context: {context}
        The tech stack is React and TailwindCSS for the frontend, and Flask for the backend.
        For each feature visible in the screenshots, Output should describe a detailed, step-by-step guide on how to test each functionality. Each test case should include:
        Description: What the test case is about.
        Pre-conditions: What needs to be set up or ensured before testing.
        Testing Steps: Clear, step-by-step instructions on how to perform the test.
        Expected Result: What should happen if the feature works correctly.

        Present the information in a clear, structured format.
        This is the structure of JSON format you should return:
        {JSON_FORMAT}
        To explain this structure:

        The root object contains a single key "features".
        The value of "features" is an array of objects.
        Each object in the "features" array represents a feature and has four keys:

        "description": A string describing the feature.
        "pre_conditions": A string describing the conditions before the feature is tested.
        "steps": An array of strings, where each string describes a step in testing the feature.
        "expected_results": An array of strings, where each string describes an expected result of the feature.
        Remember, it should be valid JSON only.
        "#
    )
}

/// Prompt asking the model to revise an existing strategy.
///
/// Only two of the four keys are explained here; the model has always been
/// given this shorter version and the results depend on it.
pub fn improvement_prompt(current_strategy: &str, context: &str) -> String {
    format!(
        r#"
        You are a product manager and a tester. You help testers in testing the product with the help of images.
        Review the following testing strategy and suggest improvements or modifications:
        based on the following context: {context}
        {current_strategy}
        The result should be in the same structure as before.
        This is the JSON format you should return:
        {JSON_FORMAT}
        To explain this structure:

        The root object contains a single key "features".
        The value of "features" is an array of objects.
        Each object in the "features" array represents a feature and has four keys:

        "description": A string describing the feature.
        "pre_conditions": A string describing the conditions before the feature is tested.
        "#
    )
}
