use chorus::prelude::*;
use chorus_types::{ProfileDraft, TemplateDraft};

use crate::cli::{ExportAction, ProfileAction, TemplateAction};

fn marker(built_in: bool) -> &'static str {
    if built_in { " (built-in)" } else { "" }
}

pub async fn profiles(store: &FsStore, action: ProfileAction) -> anyhow::Result<()> {
    let profiles = store.profiles();
    match action {
        ProfileAction::List => {
            for p in profiles.list().await? {
                println!("{:<38} {}{}", p.id, p.name, marker(p.is_built_in));
                if !p.description.is_empty() {
                    println!("{:<38} {}", "", p.description);
                }
            }
        }
        ProfileAction::Add {
            name,
            description,
            prompt,
        } => {
            let created = profiles
                .create(ProfileDraft {
                    name,
                    description,
                    system_prompt: prompt,
                })
                .await?;
            println!("Created profile {}", created.id);
        }
        ProfileAction::Delete { id } => {
            if profiles.delete(&id).await? {
                println!("Deleted profile {id}");
            } else {
                anyhow::bail!("no custom profile with id '{id}' (built-in profiles cannot be deleted)");
            }
        }
    }
    Ok(())
}

pub async fn templates(store: &FsStore, action: TemplateAction) -> anyhow::Result<()> {
    let templates = store.templates();
    match action {
        TemplateAction::List => {
            for t in templates.list().await? {
                println!("{:<38} {}{}", t.id, t.name, marker(t.is_built_in));
                println!("{:<38} {}", "", t.model_names.join(", "));
            }
        }
        TemplateAction::Add {
            name,
            description,
            models,
        } => {
            let created = templates
                .create(TemplateDraft {
                    name,
                    description,
                    model_names: models,
                })
                .await?;
            println!("Created template {}", created.id);
        }
        TemplateAction::Delete { id } => {
            if templates.delete(&id).await? {
                println!("Deleted template {id}");
            } else {
                anyhow::bail!("no custom template with id '{id}' (built-in templates cannot be deleted)");
            }
        }
    }
    Ok(())
}

pub async fn exports(store: &FsStore, action: ExportAction) -> anyhow::Result<()> {
    match action {
        ExportAction::List => {
            let paths = store.exported_chats().await?;
            if paths.is_empty() {
                println!("No saved chats. Use /export <name> during a chat.");
            }
            for path in paths {
                match store.import_chat(&path).await {
                    Ok(export) => {
                        println!(
                            "{}  {}  [{}]",
                            export.timestamp.format("%Y-%m-%d %H:%M"),
                            export.name,
                            export.models.join(", ")
                        );
                        println!("    {}", path.display());
                    }
                    Err(err) => println!("(unreadable: {err}) {}", path.display()),
                }
            }
        }
    }
    Ok(())
}
