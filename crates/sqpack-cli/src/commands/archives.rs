use crate::{
    ArchivesArgs, CommandContext,
    output::{OutputStyle, create_table, header_cell, numeric_cell, regular_cell},
};
use serde::Serialize;
use sqpack_storage::archive_name;

#[derive(Debug, Serialize)]
struct ArchiveSummary {
    archive: String,
    index: String,
    folders: usize,
    files: usize,
}

pub fn handle(args: ArchivesArgs, ctx: &CommandContext) -> anyhow::Result<()> {
    let repo = super::open_repository(ctx, args.game)?;

    let mut summaries = Vec::new();
    for index_path in repo.index_files(args.archive.as_deref())? {
        let snapshot = repo.load_index(&index_path)?;
        let relative = index_path
            .strip_prefix(repo.root())
            .unwrap_or(&index_path)
            .display()
            .to_string();
        summaries.push(ArchiveSummary {
            archive: archive_name(&index_path).unwrap_or_default().to_string(),
            index: relative.replace('\\', "/"),
            folders: snapshot.folder_count(),
            files: snapshot.file_count(),
        });
    }

    if ctx.format.is_json() {
        println!("{}", ctx.format.to_json(&summaries)?);
        return Ok(());
    }

    let style = OutputStyle::new();
    let mut table = create_table(style);
    table.set_header(vec![
        header_cell("Archive", style),
        header_cell("Index", style),
        header_cell("Folders", style),
        header_cell("Files", style),
    ]);
    for summary in &summaries {
        table.add_row(vec![
            regular_cell(&summary.archive),
            regular_cell(&summary.index),
            numeric_cell(summary.folders),
            numeric_cell(summary.files),
        ]);
    }
    println!("{table}");

    Ok(())
}
