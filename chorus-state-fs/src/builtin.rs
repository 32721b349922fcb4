//! Records seeded into a fresh store.

use chorus_types::{Profile, Template};
use chrono::Utc;

fn profile(id: &str, name: &str, description: &str, system_prompt: &str) -> Profile {
    Profile {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        system_prompt: system_prompt.into(),
        created_at: Utc::now(),
        is_built_in: true,
    }
}

fn template(id: &str, name: &str, description: &str, models: &[&str]) -> Template {
    Template {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        model_names: models.iter().map(|m| (*m).to_string()).collect(),
        created_at: Utc::now(),
        is_built_in: true,
    }
}

pub(crate) fn profiles() -> Vec<Profile> {
    vec![
        profile(
            "architect",
            "Senior Solutions Architect",
            "System design and architecture",
            "You are a senior solutions architect. Design scalable, maintainable systems \
             and explain technical trade-offs clearly, weighing performance, security and \
             operability in every recommendation.",
        ),
        profile(
            "developer",
            "Full-Stack Developer",
            "Practical help across the stack",
            "You are an experienced full-stack developer. Write clean, efficient code, \
             follow established conventions and explain the reasoning behind your solutions.",
        ),
        profile(
            "reviewer",
            "Code Reviewer",
            "Code quality and correctness",
            "You are an expert code reviewer. Point out bugs, security issues and \
             maintainability problems, and suggest concrete improvements with reasons.",
        ),
        profile(
            "teacher",
            "Technical Teacher",
            "Clear explanations for learning",
            "You are a patient technical teacher. Break complex topics into small steps \
             and use examples and analogies to make them stick.",
        ),
    ]
}

pub(crate) fn templates() -> Vec<Template> {
    vec![
        template(
            "general",
            "General Purpose",
            "Balanced set of models for everyday questions",
            &["llama3.2:3b", "phi3:mini", "qwen2.5:7b"],
        ),
        template(
            "coding",
            "Code Assistant",
            "Models tuned for programming",
            &["deepseek-coder:6.7b", "codellama:7b", "starcoder2:3b"],
        ),
        template(
            "creative",
            "Creative Writing",
            "Models for stories and prose",
            &["llama3.2:3b", "mistral:7b", "gemma2:9b"],
        ),
        template(
            "analysis",
            "Data Analysis",
            "Models for analytical and research work",
            &["qwen2.5:7b", "llama3.1:8b", "phi3:medium"],
        ),
    ]
}
