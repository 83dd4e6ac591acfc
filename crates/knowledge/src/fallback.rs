//! Whole-directory knowledge-base loading.
//!
//! Used when the retrieval service is unavailable or disabled. Every
//! `*.md` file directly inside the directory is read in file-name order.
//! Any I/O failure aborts the load: a partial knowledge base is never
//! returned.

use pestkb_core::{AppError, AppResult};
use std::path::Path;
use walkdir::WalkDir;

/// A markdown file read from the knowledge-base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeFile {
    pub filename: String,
    pub content: String,
}

/// Read every markdown file in `dir`, sorted by file name.
pub fn load_markdown_files(dir: &Path) -> AppResult<Vec<KnowledgeFile>> {
    tracing::debug!("Loading markdown files from {:?}", dir);

    let metadata = std::fs::metadata(dir).map_err(|e| {
        AppError::Knowledge(format!(
            "Failed to read knowledge base directory {:?}: {}",
            dir, e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Knowledge base path is not a directory: {:?}",
            dir
        )));
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            AppError::Knowledge(format!(
                "Failed to read knowledge base directory {:?}: {}",
                dir, e
            ))
        })?;

        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.ends_with(".md") || entry.file_type().is_dir() {
            continue;
        }

        let content = std::fs::read_to_string(entry.path()).map_err(|e| {
            AppError::Knowledge(format!("Failed to read {:?}: {}", entry.path(), e))
        })?;

        files.push(KnowledgeFile { filename, content });
    }

    tracing::debug!("Loaded {} markdown files", files.len());
    Ok(files)
}

/// Concatenate files with a plain `--- FILE: name ---` separator.
pub fn format_knowledge_files(files: &[KnowledgeFile]) -> String {
    let mut content = String::new();
    for file in files {
        content.push_str("\n\n--- FILE: ");
        content.push_str(&file.filename);
        content.push_str(" ---\n\n");
        content.push_str(&file.content);
    }
    content
}
