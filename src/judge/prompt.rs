const STRICT_SUFFIX: &str = "Respond with EXACTLY one word, no other output: yes or no";

pub fn build_prompt(question: &str, expected: &str, candidate: &str) -> String {
    format!(
        "Question: {question}\n\
         Correct Answer: {expected}\n\
         LLM Answer: {candidate}\n\
         Does the LLM answer convey the same meaning as the correct answer? (yes or no)"
    )
}

/// Same question, constrained to a bare `yes`/`no` answer for exact parsing.
pub fn build_prompt_strict(question: &str, expected: &str, candidate: &str) -> String {
    let mut prompt = build_prompt(question, expected, candidate);
    prompt.push('\n');
    prompt.push_str(STRICT_SUFFIX);
    prompt
}
