use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const DEFAULT_GALLERY_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<PathBuf>,
    #[serde(default)]
    pub dna: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub modified: u64,
}

impl Character {
    pub fn new(id: String, name: String) -> Self {
        let now = unix_now();
        Self {
            id,
            name,
            image: None,
            dna: String::new(),
            created: now,
            modified: now,
        }
    }

    pub fn touch(&mut self) {
        self.modified = unix_now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gallery {
    pub name: String,
    #[serde(default)]
    pub characters: Vec<Character>,
}

impl Gallery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            characters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub galleries: Vec<Gallery>,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            galleries: vec![Gallery::new(DEFAULT_GALLERY_NAME)],
        }
    }
}

/// On-disk shapes accepted when loading; older files hold a bare character array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LibraryFile {
    Current(Library),
    Legacy(Vec<Character>),
}

impl From<LibraryFile> for Library {
    fn from(file: LibraryFile) -> Self {
        let mut library = match file {
            LibraryFile::Current(library) => library,
            LibraryFile::Legacy(characters) => Self {
                galleries: vec![Gallery {
                    name: DEFAULT_GALLERY_NAME.to_string(),
                    characters,
                }],
            },
        };
        library.normalize();
        library
    }
}

impl Library {
    pub fn gallery_index(&self, name: &str) -> Option<usize> {
        self.galleries.iter().position(|gallery| gallery.name == name)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.characters().any(|character| character.id == id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.galleries
            .iter()
            .flat_map(|gallery| gallery.characters.iter())
    }

    /// Returns an id no character in the library uses yet.
    pub fn allocate_id(&self) -> String {
        let mut stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        loop {
            let id = format!("char-{stamp:x}");
            if !self.contains_id(&id) {
                return id;
            }
            stamp = stamp.wrapping_add(1);
        }
    }

    /// Repairs records loaded from disk: at least one gallery, unique gallery
    /// names, and every character with a unique id and a display name.
    pub fn normalize(&mut self) {
        if self.galleries.is_empty() {
            self.galleries.push(Gallery::new(DEFAULT_GALLERY_NAME));
        }

        let mut gallery_names = HashSet::new();
        for index in 0..self.galleries.len() {
            let base = match self.galleries[index].name.trim() {
                "" => DEFAULT_GALLERY_NAME.to_string(),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut suffix = 2;
            while !gallery_names.insert(name.clone()) {
                name = format!("{base} ({suffix})");
                suffix += 1;
            }
            self.galleries[index].name = name;
        }

        let mut seen_ids = HashSet::new();
        for gallery_index in 0..self.galleries.len() {
            for character_index in 0..self.galleries[gallery_index].characters.len() {
                let id = self.galleries[gallery_index].characters[character_index]
                    .id
                    .clone();
                if !is_file_safe_id(&id) || !seen_ids.insert(id.clone()) {
                    let fresh = self.allocate_id();
                    tracing::warn!(old = %id, new = %fresh, "reassigning unusable character id");
                    seen_ids.insert(fresh.clone());
                    self.galleries[gallery_index].characters[character_index].id = fresh;
                }

                let character = &mut self.galleries[gallery_index].characters[character_index];
                if character.name.trim().is_empty() {
                    character.name = format!("Character {}", character_index + 1);
                }
            }
        }
    }
}

/// True when `id` can name a file directly inside the images directory.
pub fn is_file_safe_id(id: &str) -> bool {
    if id.trim().is_empty() || id.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(id).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_character_array_loads_into_default_gallery() {
        let json = r#"[
            {"id": "a1", "name": "Aldric", "image": "images/a1.png", "dna": "abc"},
            {"id": "b2", "image": null, "dna": ""}
        ]"#;
        let file: LibraryFile = serde_json::from_str(json).expect("legacy json");
        let library = Library::from(file);

        assert_eq!(library.galleries.len(), 1);
        let gallery = &library.galleries[0];
        assert_eq!(gallery.name, DEFAULT_GALLERY_NAME);
        assert_eq!(gallery.characters[0].image, Some(PathBuf::from("images/a1.png")));
        assert_eq!(gallery.characters[1].name, "Character 2");
        assert_eq!(gallery.characters[1].created, 0);
    }

    #[test]
    fn current_format_round_trips_through_json() {
        let mut library = Library::default();
        library.galleries[0]
            .characters
            .push(Character::new("x".into(), "Xena".into()));
        let json = serde_json::to_string_pretty(&library).expect("serialize");
        let file: LibraryFile = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(Library::from(file), library);
    }

    #[test]
    fn empty_library_file_gets_default_gallery() {
        let file: LibraryFile = serde_json::from_str(r#"{"galleries": []}"#).expect("json");
        let library = Library::from(file);
        assert_eq!(library.galleries, vec![Gallery::new(DEFAULT_GALLERY_NAME)]);
    }

    #[test]
    fn normalize_repairs_duplicate_ids_and_gallery_names() {
        let mut library = Library {
            galleries: vec![Gallery::new("Kin"), Gallery::new("Kin"), Gallery::new(" ")],
        };
        library.galleries[0]
            .characters
            .push(Character::new("same".into(), "One".into()));
        library.galleries[1]
            .characters
            .push(Character::new("same".into(), "Two".into()));
        library.galleries[1]
            .characters
            .push(Character::new(String::new(), "Three".into()));
        library.normalize();

        let names: Vec<_> = library.galleries.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Kin", "Kin (2)", DEFAULT_GALLERY_NAME]);

        let ids: HashSet<_> = library.characters().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("same"));
        assert!(!ids.contains(""));
    }

    #[test]
    fn legacy_ids_that_escape_the_images_directory_are_reassigned() {
        let json = r#"[
            {"id": "../../escaped", "name": "Intruder"},
            {"id": "nested/dir", "name": "Nested"},
            {"id": "..", "name": "Parent"},
            {"id": "kept-1", "name": "Kept"}
        ]"#;
        let file: LibraryFile = serde_json::from_str(json).expect("legacy json");
        let library = Library::from(file);

        let ids: Vec<_> = library.characters().map(|c| c.id.as_str()).collect();
        assert!(ids[..3].iter().all(|id| id.starts_with("char-")));
        assert_eq!(ids[3], "kept-1");
        assert!(ids.iter().all(|id| is_file_safe_id(id)));
    }

    #[test]
    fn file_safe_ids_are_single_plain_components() {
        assert!(is_file_safe_id("char-18f2a"));
        assert!(is_file_safe_id("a..b"));
        for id in ["", "  ", ".", "..", "../x", "a/b", "a\\b", "/abs"] {
            assert!(!is_file_safe_id(id), "{id:?} should be rejected");
        }
    }

    #[test]
    fn allocate_id_avoids_existing_ids() {
        let mut library = Library::default();
        let first = library.allocate_id();
        library.galleries[0]
            .characters
            .push(Character::new(first.clone(), "A".into()));
        let second = library.allocate_id();
        assert_ne!(first, second);
        assert!(second.starts_with("char-"));
    }
}
