use chorus::prelude::*;

use crate::view::format_size;

pub async fn run(host: &str) -> anyhow::Result<()> {
    let client = super::connect(host).await?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models installed. Try `chorus pull llama3.2:3b`.");
        return Ok(());
    }

    println!("{:<32} {:>9} {:>8}  QUANT", "NAME", "SIZE", "PARAMS");
    for model in &models {
        let details = model.details.as_ref();
        println!(
            "{:<32} {:>9} {:>8}  {}",
            model.name,
            format_size(model.size),
            details
                .and_then(|d| d.parameter_size.as_deref())
                .unwrap_or("-"),
            details
                .and_then(|d| d.quantization_level.as_deref())
                .unwrap_or("-"),
        );
    }
    Ok(())
}
