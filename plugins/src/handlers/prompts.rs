//! System and task prompts used by the built-in document kinds.

use docstream_core::api::DocumentKind;

/// Title fragments that mark a college-essay workspace document.
pub const ESSAY_KEYWORDS: &[&str] = &[
    "essay workspace",
    "essay review",
    "essay blueprint",
    "essay development",
    "essay brainstorm",
    "essay outline",
    "essay draft",
    "essay feedback",
    "college essay",
    "personal statement",
    "supplemental essay",
    "application essay",
    "uc piq",
    "common app",
    "why us",
    "why you",
    "academic interest",
];

pub const ESSAY_WORKSPACE_PROMPT: &str = "Create a clean, minimal document workspace for college essay development. Start with basic structure: a main content section for the developing essay outline/ideas, and a notes section at the bottom if needed. Do not write an essay or provide advice - just create the workspace structure.";

pub const TOPIC_PROMPT: &str =
    "Write about the given topic. Markdown is supported. Use headings wherever appropriate.";

pub const CODE_PROMPT: &str = r#"
You are a Python code generator that creates self-contained, executable code snippets. When writing code:

1. Each snippet should be complete and runnable on its own
2. Prefer using print() statements to display outputs
3. Include helpful comments explaining the code
4. Keep snippets concise (generally under 15 lines)
5. Avoid external dependencies - use Python standard library
6. Handle potential errors gracefully
7. Return meaningful output that demonstrates the code's functionality
8. Don't use input() or other interactive functions
9. Don't access files or network resources
10. Don't use infinite loops

Examples of good snippets:

# Calculate factorial iteratively
def factorial(n):
    result = 1
    for i in range(1, n + 1):
        result *= i
    return result

print(f"Factorial of 5 is: {factorial(5)}")
"#;

pub const SHEET_PROMPT: &str = r#"
You are a spreadsheet creation assistant. Create a spreadsheet in csv format based on the given prompt. The spreadsheet should contain meaningful column headers and data.
"#;

pub fn is_essay_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    ESSAY_KEYWORDS.iter().any(|k| lower.contains(k))
}

pub fn essay_structure_task(title: &str) -> String {
    format!(
        "Create a document structure titled \"{title}\" with sections for essay development content and notes."
    )
}

/// System prompt for revising an existing body of the given kind.
pub fn update_document_prompt(existing: &str, kind: DocumentKind) -> String {
    let lead = match kind {
        DocumentKind::Text => "Improve the following contents of the document based on the given prompt.",
        DocumentKind::Code => "Improve the following code snippet based on the given prompt.",
        DocumentKind::Sheet => "Improve the following spreadsheet based on the given prompt.",
        DocumentKind::Image => return String::new(),
    };
    format!("{lead}\n\n{existing}\n")
}
