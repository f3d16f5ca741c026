//! Persistence for documents and company settings.
//!
//! [`DocumentStore`] is the seam between the pure numbering/calculation code and wherever
//! documents actually live. [`MemoryStore`] keeps everything in process; [`JsonFileStore`] keeps a
//! `documents.json` and a `settings.json` in a data directory.
//!
//! Stores do not serialize "compute next number, then save" against other writers. Callers that
//! share a data directory between processes must coordinate themselves.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    Error,
    document::{Document, DocumentPatch},
    error::AddContext,
    settings::CompanySettings,
};

pub trait DocumentStore {
    /// Every stored document, in insertion order.
    fn list_documents(&self) -> Result<Vec<Document>, Error>;

    /// Persist a new document. Fails if a document with the same id is already stored.
    fn save_document(&mut self, document: Document) -> Result<(), Error>;

    /// Apply `patch` to the stored document with `id` and return the updated document.
    fn update_document(&mut self, id: i64, patch: DocumentPatch) -> Result<Document, Error>;

    /// Permanently remove the document with `id`.
    fn delete_document(&mut self, id: i64) -> Result<(), Error>;

    fn load_settings(&self) -> Result<Option<CompanySettings>, Error>;

    fn save_settings(&mut self, settings: CompanySettings) -> Result<(), Error>;

    /// Look up one document by id.
    fn find_document(&self, id: i64) -> Result<Document, Error> {
        self.list_documents()?
            .into_iter()
            .find(|d| d.id() == id)
            .ok_or_else(|| Error::not_found(id))
    }

    /// Stored settings, or the placeholder defaults when none have been saved yet.
    fn settings_or_default(&self) -> Result<CompanySettings, Error> {
        Ok(self.load_settings()?.unwrap_or_default())
    }
}

fn insert(documents: &mut Vec<Document>, document: Document) -> Result<(), Error> {
    if documents.iter().any(|d| d.id() == document.id()) {
        return Err(Error::from(format!(
            "document {} already exists",
            document.id()
        )));
    }
    info!(
        id = document.id(),
        number = document.document_number(),
        "document saved"
    );
    documents.push(document);
    Ok(())
}

fn apply_patch(documents: &mut [Document], id: i64, patch: DocumentPatch) -> Result<Document, Error> {
    let document = documents
        .iter_mut()
        .find(|d| d.id() == id)
        .ok_or_else(|| Error::not_found(id))?;
    document.apply(patch)?;
    info!(
        id,
        number = document.document_number(),
        status = %document.status(),
        "document updated"
    );
    Ok(document.clone())
}

fn remove(documents: &mut Vec<Document>, id: i64) -> Result<(), Error> {
    let position = documents
        .iter()
        .position(|d| d.id() == id)
        .ok_or_else(|| Error::not_found(id))?;
    let removed = documents.remove(position);
    info!(
        id,
        number = removed.document_number(),
        "document deleted"
    );
    Ok(())
}

/// A store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Document>,
    settings: Option<CompanySettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn list_documents(&self) -> Result<Vec<Document>, Error> {
        Ok(self.documents.clone())
    }

    fn save_document(&mut self, document: Document) -> Result<(), Error> {
        insert(&mut self.documents, document)
    }

    fn update_document(&mut self, id: i64, patch: DocumentPatch) -> Result<Document, Error> {
        apply_patch(&mut self.documents, id, patch)
    }

    fn delete_document(&mut self, id: i64) -> Result<(), Error> {
        remove(&mut self.documents, id)
    }

    fn load_settings(&self) -> Result<Option<CompanySettings>, Error> {
        Ok(self.settings.clone())
    }

    fn save_settings(&mut self, settings: CompanySettings) -> Result<(), Error> {
        self.settings = Some(settings);
        Ok(())
    }
}

/// A store backed by JSON files in a directory.
///
/// Every operation reads or rewrites the whole file. Writes go to a temporary file that is then
/// renamed over the original, so a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub const DOCUMENTS_FILE: &'static str = "documents.json";
    pub const SETTINGS_FILE: &'static str = "settings.json";

    /// Open a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn documents_path(&self) -> PathBuf {
        self.dir.join(Self::DOCUMENTS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.dir.join(Self::SETTINGS_FILE)
    }

    fn read_documents(&self) -> Result<Vec<Document>, Error> {
        let path = self.documents_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)
            .map_err(Error::from)
            .add_context(&format!("reading '{}'", path.to_string_lossy()))?;
        serde_json::from_str(&raw)
            .map_err(Error::from)
            .add_context(&format!("parsing '{}'", path.to_string_lossy()))
    }

    fn write_documents(&self, documents: &[Document]) -> Result<(), Error> {
        let raw = serde_json::to_string_pretty(documents)
            .map_err(Error::from)
            .add_context("serializing documents")?;
        write_atomically(&self.documents_path(), &raw)
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), Error> {
    let context = format!("writing '{}'", path.to_string_lossy());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(Error::from)
            .add_context(&context)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .map_err(Error::from)
        .add_context(&context)?;
    fs::rename(&tmp, path)
        .map_err(Error::from)
        .add_context(&context)
}

impl DocumentStore for JsonFileStore {
    fn list_documents(&self) -> Result<Vec<Document>, Error> {
        self.read_documents().add_context("listing documents")
    }

    fn save_document(&mut self, document: Document) -> Result<(), Error> {
        let mut documents = self.read_documents().add_context("saving document")?;
        insert(&mut documents, document).add_context("saving document")?;
        self.write_documents(&documents)
            .add_context("saving document")
    }

    fn update_document(&mut self, id: i64, patch: DocumentPatch) -> Result<Document, Error> {
        let mut documents = self.read_documents().add_context("updating document")?;
        let updated = apply_patch(&mut documents, id, patch).add_context("updating document")?;
        self.write_documents(&documents)
            .add_context("updating document")?;
        Ok(updated)
    }

    fn delete_document(&mut self, id: i64) -> Result<(), Error> {
        let mut documents = self.read_documents().add_context("deleting document")?;
        remove(&mut documents, id).add_context("deleting document")?;
        self.write_documents(&documents)
            .add_context("deleting document")
    }

    fn load_settings(&self) -> Result<Option<CompanySettings>, Error> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .map_err(Error::from)
            .add_context("loading settings")?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(Error::from)
            .add_context("parsing settings")
    }

    fn save_settings(&mut self, settings: CompanySettings) -> Result<(), Error> {
        let raw = serde_json::to_string_pretty(&settings)
            .map_err(Error::from)
            .add_context("serializing settings")?;
        write_atomically(&self.settings_path(), &raw).add_context("saving settings")?;
        info!(company = %settings.company_name, "settings saved");
        Ok(())
    }
}
