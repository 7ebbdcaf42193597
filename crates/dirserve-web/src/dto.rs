use dirserve_core::{Entry, EntryKind, Listing, SearchResult, Upload};
use serde::{Deserialize, Serialize};

/// One entry as the browser client expects it (PascalCase keys).
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryDto {
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: EntryKind,
    pub size: u64,
    pub path: String,
}

impl From<Entry> for EntryDto {
    fn from(entry: Entry) -> Self {
        Self {
            name: entry.name().to_string(),
            kind: entry.kind(),
            size: entry.size(),
            path: entry.rel_path().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub path: String,
    pub file_count: usize,
    pub folder_count: usize,
    pub total_size: u64,
    pub contents: Vec<EntryDto>,
}

impl From<Listing> for BrowseResponse {
    fn from(listing: Listing) -> Self {
        Self {
            path: listing.path,
            file_count: listing.file_count,
            folder_count: listing.folder_count,
            total_size: listing.total_size,
            contents: listing.entries.into_iter().map(EntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub path: String,
    pub query: String,
    pub matches: Vec<EntryDto>,
}

impl From<SearchResult> for SearchResponse {
    fn from(result: SearchResult) -> Self {
        Self {
            path: result.path,
            query: result.query,
            matches: result.matches.into_iter().map(EntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub size: u64,
}

impl From<Upload> for UploadResponse {
    fn from(upload: Upload) -> Self {
        Self {
            message: "File uploaded successfully.".to_string(),
            file_name: upload.file_name,
            size: upload.size,
        }
    }
}
