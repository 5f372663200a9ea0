//! Prompt construction
//!
//! Every attempt restates the fixed constraints. Retries append the previous
//! diagnostic verbatim so the model sees exactly what the validator saw.

use crate::types::GenerationRequest;
use std::fmt::Write;

/// Lead-in for the corrective feedback block
pub const FEEDBACK_PREFIX: &str = "The previous attempt had this syntax error; fix it:";

/// Build the prompt for one attempt
#[must_use]
pub fn build_prompt(
    request: &GenerationRequest,
    entry_symbol: &str,
    last_diagnostic: Option<&str>,
) -> String {
    let mut prompt = String::with_capacity(1024);
    let _ = write!(
        prompt,
        "You are an expert React developer. Write one self-contained React component \
         for this micro-SaaS app.\n\n\
         Description: {description}\n\
         Category: {category}\n\
         Price: ${price:.2}\n\n\
         Rules:\n\
         1. Do not write import or export statements. React and ReactDOM are globals; \
         call hooks as React.useState, React.useEffect and so on.\n\
         2. Plain JavaScript with JSX only. No TypeScript syntax: no type annotations, \
         interfaces, enums or generics.\n\
         3. Style with Tailwind CSS utility classes and nothing else.\n\
         4. Declare the top-level component as `function {entry_symbol}() {{ ... }}`; \
         the host mounts it by that name.\n\
         5. Add data-testid attributes to every interactive element.\n\
         6. Keep all state inside the component.\n\n\
         Return only the component code, no explanations.",
        description = request.description.trim(),
        category = request.category.trim(),
        price = request.price,
    );

    if let Some(diagnostic) = last_diagnostic {
        let _ = write!(prompt, "\n\n{FEEDBACK_PREFIX}\n{diagnostic}");
    }
    prompt
}
