//! Prompt assembly. The only decision made here is which template to use.

use crate::registry::AgentSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    /// The description is sent as-is.
    Standard,
    /// The description wrapped in scale and architecture qualifiers.
    Massive,
}

impl PromptTemplate {
    pub fn for_agent(spec: &AgentSpec) -> Self {
        if spec.is_massive() {
            PromptTemplate::Massive
        } else {
            PromptTemplate::Standard
        }
    }

    pub fn render(self, description: &str) -> String {
        match self {
            PromptTemplate::Standard => description.to_string(),
            PromptTemplate::Massive => format!(
                "Create a massive, production-ready {description}. \
                 The implementation should span tens of thousands of lines of code \
                 organised as multiple interconnected modules with clear interfaces \
                 between them. Use an enterprise-grade architecture with comprehensive \
                 error handling, logging, configuration, tests and documentation for \
                 every module."
            ),
        }
    }
}

/// Render the prompt for `spec`, or `None` when the agent takes no description.
pub fn assemble(spec: &AgentSpec, description: Option<&str>) -> Option<String> {
    description.map(|d| PromptTemplate::for_agent(spec).render(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::lookup;

    #[test]
    fn standard_passes_description_through() {
        let spec = lookup("generate").unwrap();
        assert_eq!(
            assemble(spec, Some("a todo app")).as_deref(),
            Some("a todo app")
        );
    }

    #[test]
    fn massive_wraps_description() {
        let spec = lookup("chunked-generation").unwrap();
        let prompt = assemble(spec, Some("enterprise e-commerce platform")).unwrap();
        assert!(prompt.contains("enterprise e-commerce platform"));
        assert!(prompt.contains("tens of thousands of lines"));
        assert!(prompt.contains("multiple interconnected modules"));
        assert!(prompt.contains("production-ready"));
    }

    #[test]
    fn no_description_no_prompt() {
        let spec = lookup("code-review").unwrap();
        assert_eq!(assemble(spec, None), None);
    }
}
