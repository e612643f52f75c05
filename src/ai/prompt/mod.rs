//! Prompt Builder System
//!
//! Standardized prompt construction for chunk generation.
//! Output is fully determined by the builder calls; context items keep
//! their insertion order.
//!
//! ## Layout
//!
//! 1. **Role**: who the model writes as
//! 2. **Context**: section and branding facts
//! 3. **Instructions**: the section's template
//! 4. **Focus**: which chunk of the section to write
//! 5. **Guidelines**: fixed formatting and quality rules

use crate::catalog::Section;
use crate::config::Branding;

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Role definition with expertise area
    Role { expertise: String, task: String },
    /// Ordered key-value facts
    Context(Vec<(String, String)>),
    /// Raw text section with optional header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Focus enforcement with restrictions
    Focus {
        target: String,
        restrictions: Vec<String>,
    },
    /// Numbered rules
    Guidelines(Vec<String>),
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role definition section
    pub fn role(mut self, expertise: &str, task: &str) -> Self {
        self.sections.push(PromptSection::Role {
            expertise: expertise.to_string(),
            task: task.to_string(),
        });
        self
    }

    /// Add a context item, merging into the existing context section
    pub fn context_item(mut self, key: &str, value: &str) -> Self {
        let existing = self.sections.iter_mut().find_map(|section| match section {
            PromptSection::Context(items) => Some(items),
            _ => None,
        });
        match existing {
            Some(items) => items.push((key.to_string(), value.to_string())),
            None => self.sections.push(PromptSection::Context(vec![(
                key.to_string(),
                value.to_string(),
            )])),
        }
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add focus enforcement section
    pub fn focus(mut self, target: &str, restrictions: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Focus {
            target: target.to_string(),
            restrictions: restrictions.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Add numbered guidelines
    pub fn guidelines(mut self, rules: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Guidelines(
            rules.into_iter().map(String::from).collect(),
        ));
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Role { expertise, task } => {
                    prompt.push_str("<ROLE>\n");
                    prompt.push_str(&format!(
                        "You are an expert {} specializing in {}.\n",
                        expertise, task
                    ));
                    prompt.push_str("</ROLE>\n\n");
                }
                PromptSection::Context(items) => {
                    prompt.push_str("# Context\n\n");
                    for (key, value) in items {
                        prompt.push_str(&format!("**{}**: {}\n", key, value));
                    }
                    prompt.push('\n');
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("# {}\n\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Focus {
                    target,
                    restrictions,
                } => {
                    prompt.push_str("<FOCUS>\n");
                    prompt.push_str(&format!("IMPORTANT: Focus EXCLUSIVELY on: {}\n", target));
                    for restriction in restrictions {
                        prompt.push_str(&format!("- {}\n", restriction));
                    }
                    prompt.push_str("</FOCUS>\n\n");
                }
                PromptSection::Guidelines(rules) => {
                    prompt.push_str("<GUIDELINES>\n");
                    for (i, rule) in rules.iter().enumerate() {
                        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
                    }
                    prompt.push_str("</GUIDELINES>\n\n");
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Preset prompts
pub struct PromptTemplates;

impl PromptTemplates {
    pub const SYSTEM: &'static str = "You are a professional content writer creating \
        high-quality digital products. Write polished, publication-ready Markdown.";

    /// Prompt for one chunk of a section
    ///
    /// `chunk_index` is 0-based; the prompt states the 1-based position.
    pub fn chunk(
        section: &Section,
        chunk_index: u32,
        total_chunks: u32,
        branding: &Branding,
    ) -> String {
        let position = format!("part {} of {}", chunk_index + 1, total_chunks);

        let mut builder = PromptBuilder::new()
            .role("content writer", "digital product content")
            .context_item("Section ID", &section.id)
            .context_item("Section", &section.label)
            .context_item("Description", &section.description)
            .context_item("Part", &position);

        if !branding.company_name.is_empty() {
            builder = builder.context_item("Brand", &branding.company_name);
        }
        builder = builder
            .context_item("Primary color", &branding.primary_color)
            .context_item("Secondary color", &branding.secondary_color);
        if !branding.footer_text.is_empty() {
            builder = builder.context_item("Footer", &branding.footer_text);
        }

        builder
            .section("Instructions", section.instructions())
            .focus(
                &format!("{} ({})", section.label, position),
                vec![
                    "Write only this part; do not summarize earlier or later parts",
                    "Do NOT repeat the section title in every part",
                    "Do NOT add meta commentary about being an AI",
                ],
            )
            .guidelines(vec![
                "Use Markdown headings, short paragraphs and lists",
                "Be specific and actionable; prefer concrete examples over generalities",
                "Keep the tone professional and consistent with the brand",
                "End with a complete sentence",
            ])
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> Section {
        Section::new("ebook", "eBook", "A practical guide", 3)
            .with_template("Write a chapter about productivity")
    }

    #[test]
    fn test_basic_prompt() {
        let prompt = PromptBuilder::new()
            .role("content writer", "eBooks")
            .guidelines(vec!["Be clear", "Be brief"])
            .build();

        assert!(prompt.contains("<ROLE>"));
        assert!(prompt.contains("content writer"));
        assert!(prompt.contains("1. Be clear"));
        assert!(prompt.contains("2. Be brief"));
    }

    #[test]
    fn test_context_items_keep_order() {
        let prompt = PromptBuilder::new()
            .context_item("Zeta", "1")
            .context_item("Alpha", "2")
            .build();

        let zeta = prompt.find("**Zeta**: 1").unwrap();
        let alpha = prompt.find("**Alpha**: 2").unwrap();
        assert!(zeta < alpha);
        assert_eq!(prompt.matches("# Context").count(), 1);
    }

    #[test]
    fn test_chunk_prompt_contents() {
        let branding = Branding {
            company_name: "Acme".to_string(),
            footer_text: "© Acme".to_string(),
            ..Default::default()
        };
        let prompt = PromptTemplates::chunk(&section(), 1, 3, &branding);

        assert!(prompt.contains("**Section ID**: ebook"));
        assert!(prompt.contains("**Section**: eBook"));
        assert!(prompt.contains("A practical guide"));
        assert!(prompt.contains("Write a chapter about productivity"));
        assert!(prompt.contains("part 2 of 3"));
        assert!(prompt.contains("**Brand**: Acme"));
        assert!(prompt.contains(&branding.primary_color));
    }

    #[test]
    fn test_chunk_prompt_template_falls_back_to_description() {
        let plain = Section::new("faq", "FAQ", "Frequently asked questions", 1);
        let prompt = PromptTemplates::chunk(&plain, 0, 1, &Branding::default());
        assert!(prompt.contains("# Instructions\n\nFrequently asked questions"));
        assert!(prompt.contains("part 1 of 1"));
    }

    #[test]
    fn test_chunk_prompt_is_deterministic() {
        let branding = Branding::default();
        assert_eq!(
            PromptTemplates::chunk(&section(), 0, 3, &branding),
            PromptTemplates::chunk(&section(), 0, 3, &branding)
        );
    }
}
