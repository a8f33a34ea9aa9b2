use crate::{
    CommandContext, ExtractArgs,
    output::{OutputStyle, format_success},
};
use anyhow::{Context, anyhow};
use sqpack_storage::ArchivePath;
use std::fs;
use tracing::info;

pub fn handle(args: ExtractArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let path = ArchivePath::parse(&args.path)?;
    let repo = super::open_repository(ctx, args.game)?;

    let data = repo
        .read(&path)?
        .ok_or_else(|| anyhow!("Can not find file \"{}\".", args.path))?;

    let output_path = path.output_path(&args.output);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output_path, &data)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    info!("Extracted {} ({} bytes)", path, data.len());

    if ctx.format.is_json() {
        let result = serde_json::json!({
            "path": path.to_string(),
            "output": output_path.display().to_string(),
            "size": data.len(),
        });
        println!("{}", ctx.format.to_json(&result)?);
    } else {
        let style = OutputStyle::new();
        println!(
            "{}",
            format_success(&output_path.display().to_string(), style)
        );
    }

    Ok(())
}
