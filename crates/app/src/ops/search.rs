use std::collections::BTreeMap;

use clap::Args;
use common::file_manager::{FileManagerError, SearchCriteria};

use crate::op::{parse_key_val, SessionError};

#[derive(Args, Debug, Clone)]
pub struct Search {
    /// Substring of the file name
    #[arg(long)]
    pub name: Option<String>,

    /// Substring of the directory path
    #[arg(long)]
    pub dir: Option<String>,

    /// Exact metadata value, repeatable (key=value)
    #[arg(long = "meta", value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,

    /// Minimum size in bytes (inclusive)
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Maximum size in bytes (inclusive)
    #[arg(long)]
    pub max_size: Option<u64>,

    /// Exact file extension
    #[arg(long)]
    pub ext: Option<String>,

    /// Print matches with their metadata as JSON
    #[arg(long)]
    pub with_metadata: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("search failed: {0}")]
    FileManager(#[from] FileManagerError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Search {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            file_name: self.name.clone(),
            directory: self.dir.clone(),
            metadata: self.metadata.iter().cloned().collect::<BTreeMap<_, _>>(),
            min_size: self.min_size,
            max_size: self.max_size,
            extension: self.ext.clone(),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Search {
    type Error = SearchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let session = ctx.session().await?;
        let manager = &session.manager;

        let mut matches =
            manager.search_files(manager.trie(), &self.criteria(), self.with_metadata)?;
        matches.sort_by(|a, b| a.path.cmp(&b.path));

        if self.with_metadata {
            return Ok(serde_json::to_string_pretty(&matches)?);
        }
        if matches.is_empty() {
            return Ok("No matching files".to_string());
        }
        Ok(matches
            .into_iter()
            .map(|file| file.path)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
