// src/output.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::types::Post;

const CSV_HEADER: [&str; 8] = [
    "id",
    "source",
    "topic",
    "text",
    "url",
    "author",
    "created_at",
    "metadata",
];

/// Write posts as a JSON array of objects. `created_at` serializes as an
/// RFC 3339 string or null; `metadata` stays a nested object.
pub fn write_json(posts: &[Post], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let body = serde_json::to_string_pretty(posts).context("serializing posts to json")?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

/// Write posts as CSV, one row per post in the JSON field order. Absent
/// optional fields become empty cells; `metadata` flattens to its JSON
/// string representation.
pub fn write_csv(posts: &[Post], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(CSV_HEADER).context("writing csv header")?;
    for post in posts {
        writer
            .write_record(csv_record(post)?)
            .context("writing csv row")?;
    }
    writer.flush().context("flushing csv output")?;
    Ok(())
}

fn csv_record(post: &Post) -> Result<[String; 8]> {
    let metadata = serde_json::to_string(&post.metadata).context("flattening metadata")?;
    Ok([
        post.id.clone(),
        post.source.clone(),
        post.topic.clone(),
        post.text.clone(),
        post.url.clone().unwrap_or_default(),
        post.author.clone().unwrap_or_default(),
        post.created_at
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            .unwrap_or_default(),
        metadata,
    ])
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    Ok(())
}
