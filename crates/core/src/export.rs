use crate::model::*;

pub fn to_csv(root: &TreeNode, mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record(["path", "name", "kind", "size", "files"])?;
    for n in root.walk() {
        let kind = match n.kind {
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
        };
        writer.write_record([
            n.path.as_str(),
            n.name.as_str(),
            kind,
            n.size.to_string().as_str(),
            n.file_count.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// The nested tree; files carry no `children` key.
pub fn to_json(root: &TreeNode) -> serde_json::Value {
    serde_json::json!(root)
}
