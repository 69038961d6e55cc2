//! In-memory document set: a project is an ordered list of pages, each page
//! owning one [`Document`].

use crate::format::Metadata;
use crate::import::{ConflictResolution, ImportMode, ImportResult, unique_name_and_path};
use pb_core::{Document, generate_page_id};

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    pub name: String,
    /// Route path, unique within a project (e.g. `/about`).
    pub path: String,
    pub document: Document,
    pub metadata: Option<Metadata>,
}

impl Page {
    /// A fresh, empty page.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: generate_page_id(),
            name: name.into(),
            path: path.into(),
            document: Document::new(),
            metadata: None,
        }
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub pages: Vec<Page>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_mut(&mut self, id: &str) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    pub fn page_by_path(&self, path: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.path == path)
    }

    pub fn remove_page(&mut self, id: &str) -> Option<Page> {
        let index = self.pages.iter().position(|p| p.id == id)?;
        Some(self.pages.remove(index))
    }

    pub fn component_count(&self) -> usize {
        self.pages.iter().map(|p| p.document.len()).sum()
    }

    /// Install the pages of a successful import.
    ///
    /// `Replace` mode empties the project first. Otherwise every conflict
    /// resolved as replaced removes the page it supersedes before the new
    /// pages are appended, each moved to a suffixed path if its own is
    /// still taken. A failed import changes nothing. Returns the number of
    /// pages installed.
    pub fn apply_import(&mut self, import: ImportResult) -> usize {
        if !import.success {
            return 0;
        }
        if import.mode == ImportMode::Replace {
            self.pages.clear();
        } else {
            for conflict in &import.conflicts {
                if conflict.resolution == ConflictResolution::Replaced
                    && self.remove_page(&conflict.existing_id).is_some()
                {
                    log::debug!("import: replaced page `{}`", conflict.existing_id);
                }
            }
        }
        let installed = import.pages.len();
        for mut page in import.pages {
            if self.page_by_path(&page.path).is_some() {
                let (name, path) = unique_name_and_path(&page.name, &page.path, |p| {
                    self.page_by_path(p).is_some()
                });
                log::warn!("import: path `{}` already installed, using `{path}`", page.path);
                page.name = name;
                page.path = path;
            }
            self.pages.push(page);
        }
        installed
    }
}
