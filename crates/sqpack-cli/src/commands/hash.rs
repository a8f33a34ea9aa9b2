use crate::{
    CommandContext, HashArgs,
    output::{OutputStyle, format_key_value},
};
use sqpack_storage::ArchivePath;

pub fn handle(args: HashArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let path = ArchivePath::parse(&args.path)?;
    let hashes = path.hashes();

    if ctx.format.is_json() {
        let result = serde_json::json!({
            "path": path.relative().to_lowercase(),
            "folder": hashes.folder.to_string(),
            "file": hashes.file.to_string(),
        });
        println!("{}", ctx.format.to_json(&result)?);
    } else {
        let style = OutputStyle::new();
        println!("{}", format_key_value("folder", &hashes.folder.to_string(), style));
        println!("{}", format_key_value("file", &hashes.file.to_string(), style));
    }

    Ok(())
}
