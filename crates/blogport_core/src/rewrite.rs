use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Datelike;

use crate::publish::PublishResult;

const BLOCK_OPEN: &str = "location / {";
const BLOCK_CLOSE: &str = "}";

/// Render the rewrite-rule block mapping old `/year/month/day/slug`
/// paths to their new home. Date components are taken from the stored
/// publication date and left unpadded, matching the old URL scheme.
pub fn render_rewrite_rules(
    results: &[PublishResult],
    new_base_url: &str,
    match_trailing: bool,
) -> String {
    let trailing = if match_trailing { "(/.*)?" } else { "" };
    let mut output = String::new();
    output.push_str(BLOCK_OPEN);
    output.push('\n');
    for result in results {
        let date = result.published_at.date();
        output.push_str(&format!(
            "    rewrite ^/{}/{}/{}/{}{}$ {}/{}/{} permanent;\n",
            date.year(),
            date.month(),
            date.day(),
            result.slug,
            trailing,
            new_base_url,
            result.remote_id,
            result.slug,
        ));
    }
    output.push_str(BLOCK_CLOSE);
    output.push('\n');
    output
}

/// Write the rendered block to `output_path`, replacing any previous
/// contents.
pub fn write_rewrite_rules(
    results: &[PublishResult],
    new_base_url: &str,
    match_trailing: bool,
    output_path: &Path,
) -> Result<()> {
    let rendered = render_rewrite_rules(results, new_base_url, match_trailing);
    fs::write(output_path, rendered)
        .with_context(|| format!("failed to write {}", output_path.display()))
}
