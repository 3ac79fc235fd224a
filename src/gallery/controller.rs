use std::path::Path;

use image::DynamicImage;

use super::model::{Character, Gallery, Library};
use super::{GalleryError, GalleryResult};
use crate::crop::{CropSession, CropSettings};
use crate::geometry::CropRect;
use crate::state::{AppEvent, AppState, StateMachine};
use crate::storage::GalleryStorage;

/// Application state for one gallery window: the loaded library, what is
/// selected, whether unsaved edits exist, and the open crop session if any.
///
/// Front ends call the transition methods here instead of mutating fields.
#[derive(Debug)]
pub struct GalleryController<S: GalleryStorage> {
    storage: S,
    library: Library,
    current_gallery: usize,
    current_character: Option<usize>,
    dirty: bool,
    machine: StateMachine,
    crop_session: Option<CropSession>,
    crop_settings: CropSettings,
}

impl<S: GalleryStorage> GalleryController<S> {
    pub fn load(storage: S, crop_settings: CropSettings) -> GalleryResult<Self> {
        let mut library = storage.load_library()?;
        library.normalize();
        let mut machine = StateMachine::new();
        machine.transition(AppEvent::Start)?;

        let mut controller = Self {
            storage,
            library,
            current_gallery: 0,
            current_character: None,
            dirty: false,
            machine,
            crop_session: None,
            crop_settings,
        };
        controller.reset_character_selection();
        tracing::info!(
            galleries = controller.library.galleries.len(),
            characters = controller.library.characters().count(),
            "gallery loaded"
        );
        Ok(controller)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn state(&self) -> AppState {
        self.machine.state()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn crop_settings(&self) -> CropSettings {
        self.crop_settings
    }

    pub fn current_gallery(&self) -> &Gallery {
        &self.library.galleries[self.current_gallery]
    }

    pub fn characters(&self) -> &[Character] {
        &self.current_gallery().characters
    }

    pub fn current_character_index(&self) -> Option<usize> {
        self.current_character
    }

    pub fn current_character(&self) -> Option<&Character> {
        self.current_character
            .and_then(|index| self.characters().get(index))
    }

    pub fn save(&mut self) -> GalleryResult<()> {
        self.storage.save_library(&self.library)?;
        self.dirty = false;
        Ok(())
    }

    /// Records an in-memory edit, then persists it. A failed save leaves the
    /// library dirty.
    fn commit(&mut self) -> GalleryResult<()> {
        self.dirty = true;
        self.save()
    }

    fn require_browsing(&self) -> GalleryResult<()> {
        if self.crop_session.is_some() || self.state() == AppState::Cropping {
            return Err(GalleryError::CropSessionOpen);
        }
        Ok(())
    }

    fn require_selection(&self) -> GalleryResult<usize> {
        self.current_character.ok_or(GalleryError::NoSelection)
    }

    fn gallery_mut(&mut self) -> &mut Gallery {
        &mut self.library.galleries[self.current_gallery]
    }

    fn reset_character_selection(&mut self) {
        self.current_character = if self.characters().is_empty() {
            None
        } else {
            Some(0)
        };
    }

    fn remove_portrait_file(&self, character: &Character) {
        if let Some(path) = character.image.as_deref() {
            if let Err(err) = self.storage.remove_portrait(path) {
                tracing::warn!(?err, path = %path.display(), "failed to remove portrait");
            }
        }
    }

    pub fn select_gallery(&mut self, name: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let index = self
            .library
            .gallery_index(name)
            .ok_or_else(|| GalleryError::UnknownGallery {
                name: name.to_string(),
            })?;
        self.current_gallery = index;
        self.reset_character_selection();
        tracing::debug!(gallery = name, "gallery selected");
        Ok(())
    }

    fn validate_new_gallery_name(&self, name: &str) -> GalleryResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GalleryError::EmptyGalleryName);
        }
        if self.library.gallery_index(name).is_some() {
            return Err(GalleryError::DuplicateGallery {
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Adds an empty gallery and makes it current.
    pub fn create_gallery(&mut self, name: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let name = self.validate_new_gallery_name(name)?;
        self.library.galleries.push(Gallery::new(name.clone()));
        self.current_gallery = self.library.galleries.len() - 1;
        self.current_character = None;
        self.commit()?;
        tracing::info!(gallery = %name, "gallery created");
        Ok(())
    }

    pub fn rename_gallery(&mut self, old: &str, new: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let index = self
            .library
            .gallery_index(old)
            .ok_or_else(|| GalleryError::UnknownGallery {
                name: old.to_string(),
            })?;
        if old == new.trim() {
            return Ok(());
        }
        let new = self.validate_new_gallery_name(new)?;
        self.library.galleries[index].name = new;
        self.commit()
    }

    /// Removes a gallery together with its characters' portrait files.
    pub fn delete_gallery(&mut self, name: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let index = self
            .library
            .gallery_index(name)
            .ok_or_else(|| GalleryError::UnknownGallery {
                name: name.to_string(),
            })?;
        if self.library.galleries.len() == 1 {
            return Err(GalleryError::LastGallery);
        }

        let removed = self.library.galleries.remove(index);
        for character in &removed.characters {
            self.remove_portrait_file(character);
        }

        if self.current_gallery == index {
            self.current_gallery = index.min(self.library.galleries.len() - 1);
            self.reset_character_selection();
        } else if self.current_gallery > index {
            self.current_gallery -= 1;
        }
        self.commit()?;
        tracing::info!(gallery = name, characters = removed.characters.len(), "gallery deleted");
        Ok(())
    }

    /// Appends a character to the current gallery, saves, and selects it.
    pub fn new_character(&mut self, name: Option<&str>) -> GalleryResult<&Character> {
        self.require_browsing()?;
        let id = self.library.allocate_id();
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Character {}", self.characters().len() + 1),
        };
        self.gallery_mut().characters.push(Character::new(id, name));
        let index = self.characters().len() - 1;
        self.current_character = Some(index);
        self.commit()?;
        Ok(&self.characters()[index])
    }

    pub fn select_character(&mut self, index: usize) -> GalleryResult<&Character> {
        self.require_browsing()?;
        let len = self.characters().len();
        if index >= len {
            return Err(GalleryError::CharacterIndexOutOfRange { index, len });
        }
        self.current_character = Some(index);
        Ok(&self.characters()[index])
    }

    /// Finds a character in the current gallery by id, or by name ignoring case.
    pub fn find_character(&self, query: &str) -> Option<usize> {
        let query = query.trim();
        let characters = self.characters();
        characters
            .iter()
            .position(|character| character.id == query)
            .or_else(|| {
                characters
                    .iter()
                    .position(|character| character.name.eq_ignore_ascii_case(query))
            })
    }

    pub fn select_by_query(&mut self, query: &str) -> GalleryResult<&Character> {
        let index = self
            .find_character(query)
            .ok_or_else(|| GalleryError::UnknownCharacter {
                query: query.to_string(),
            })?;
        self.select_character(index)
    }

    pub fn rename_character(&mut self, name: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let index = self.require_selection()?;
        let name = name.trim();
        let character = &mut self.gallery_mut().characters[index];
        if name.is_empty() || character.name == name {
            return Ok(());
        }
        character.name = name.to_string();
        character.touch();
        self.commit()
    }

    /// Replaces the selected character's DNA text. Only marks the library
    /// dirty; callers decide when to [`save`](Self::save).
    pub fn set_dna(&mut self, text: &str) -> GalleryResult<()> {
        self.require_browsing()?;
        let index = self.require_selection()?;
        let text = text.trim();
        let character = &mut self.gallery_mut().characters[index];
        if character.dna == text {
            return Ok(());
        }
        character.dna = text.to_string();
        character.touch();
        self.dirty = true;
        Ok(())
    }

    /// Removes the selected character and its portrait file. The selection
    /// moves to the character now at the same position, or the new last one.
    pub fn delete_character(&mut self) -> GalleryResult<Character> {
        self.require_browsing()?;
        let index = self.require_selection()?;
        let removed = self.gallery_mut().characters.remove(index);
        self.remove_portrait_file(&removed);

        let len = self.characters().len();
        self.current_character = if len == 0 {
            None
        } else {
            Some(index.min(len - 1))
        };
        self.commit()?;
        tracing::info!(id = %removed.id, name = %removed.name, "character deleted");
        Ok(removed)
    }

    /// Opens the crop session for the selected character's new portrait.
    pub fn begin_portrait(&mut self, source: DynamicImage) -> GalleryResult<&mut CropSession> {
        self.require_browsing()?;
        self.require_selection()?;
        let session = CropSession::open(source, self.crop_settings)?;
        self.machine.transition(AppEvent::OpenCropper)?;
        Ok(self.crop_session.insert(session))
    }

    pub fn begin_portrait_from_path(&mut self, path: &Path) -> GalleryResult<&mut CropSession> {
        self.require_browsing()?;
        self.require_selection()?;
        let session = CropSession::open_path(path, self.crop_settings)?;
        self.machine.transition(AppEvent::OpenCropper)?;
        Ok(self.crop_session.insert(session))
    }

    pub fn crop_session(&self) -> Option<&CropSession> {
        self.crop_session.as_ref()
    }

    pub fn crop_session_mut(&mut self) -> Option<&mut CropSession> {
        self.crop_session.as_mut()
    }

    /// Crops, writes `<id>.png` for the selected character and saves the library.
    ///
    /// The session stays open until the portrait file is written, so a failed
    /// write can be retried or cancelled.
    pub fn confirm_portrait(&mut self) -> GalleryResult<CropRect> {
        let index = self.require_selection()?;
        let session = self.crop_session.as_ref().ok_or(GalleryError::NoCropSession)?;
        let outcome = session.render_outcome();

        let id = self.characters()[index].id.clone();
        let path = self.storage.write_portrait(&id, &outcome.portrait)?;
        self.machine.transition(AppEvent::ConfirmCrop)?;
        self.crop_session = None;
        tracing::info!(%id, rect = %outcome.rect, "portrait confirmed");

        let previous = self.characters()[index].image.clone();
        if let Some(previous) = previous.filter(|previous| previous != &path) {
            if let Err(err) = self.storage.remove_portrait(&previous) {
                tracing::warn!(?err, path = %previous.display(), "failed to remove replaced portrait");
            }
        }

        let character = &mut self.gallery_mut().characters[index];
        character.image = Some(path);
        character.touch();
        self.commit()?;
        Ok(outcome.rect)
    }

    pub fn cancel_portrait(&mut self) -> GalleryResult<()> {
        let session = self.crop_session.take().ok_or(GalleryError::NoCropSession)?;
        self.machine.transition(AppEvent::CancelCrop)?;
        session.cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageResult};
    use image::RgbaImage;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::path::PathBuf;

    #[derive(Debug, Default)]
    struct MemoryStorage {
        library: RefCell<Option<Library>>,
        saves: RefCell<usize>,
        portraits: RefCell<Vec<PathBuf>>,
        fail_saves: Cell<bool>,
        fail_writes: Cell<bool>,
    }

    fn denied(path: PathBuf) -> StorageError {
        StorageError::Io {
            path,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        }
    }

    impl GalleryStorage for MemoryStorage {
        fn load_library(&self) -> StorageResult<Library> {
            Ok(self.library.borrow().clone().unwrap_or_default())
        }

        fn save_library(&self, library: &Library) -> StorageResult<()> {
            if self.fail_saves.get() {
                return Err(denied(PathBuf::from("/characters.json")));
            }
            *self.library.borrow_mut() = Some(library.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }

        fn portrait_path(&self, character_id: &str) -> StorageResult<PathBuf> {
            if character_id.is_empty() {
                return Err(StorageError::MissingCharacterId);
            }
            Ok(PathBuf::from(format!("/portraits/{character_id}.png")))
        }

        fn write_portrait(&self, character_id: &str, _portrait: &RgbaImage) -> StorageResult<PathBuf> {
            let path = self.portrait_path(character_id)?;
            if self.fail_writes.get() {
                return Err(denied(path));
            }
            self.portraits.borrow_mut().push(path.clone());
            Ok(path)
        }

        fn remove_portrait(&self, path: &Path) -> StorageResult<()> {
            self.portraits.borrow_mut().retain(|existing| existing != path);
            Ok(())
        }
    }

    fn controller() -> GalleryController<MemoryStorage> {
        GalleryController::load(MemoryStorage::default(), CropSettings::default())
            .expect("load controller")
    }

    fn source_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(1000, 2000))
    }

    #[test]
    fn empty_library_starts_without_selection() {
        let controller = controller();
        assert_eq!(controller.current_gallery().name, "Default");
        assert!(controller.current_character().is_none());
        assert_eq!(controller.state(), AppState::Browsing);
    }

    #[test]
    fn new_character_uses_default_name_saves_and_selects() {
        let mut controller = controller();
        controller.new_character(None).expect("first");
        let second = controller.new_character(Some("  Matilda ")).expect("second").clone();

        assert_eq!(controller.characters()[0].name, "Character 1");
        assert_eq!(second.name, "Matilda");
        assert_eq!(controller.current_character_index(), Some(1));
        assert_eq!(*controller.storage().saves.borrow(), 2);
        assert_ne!(controller.characters()[0].id, second.id);
    }

    #[test]
    fn set_dna_marks_dirty_until_saved() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        controller.set_dna("  genes: 1 2 3 \n").expect("dna");

        assert!(controller.is_dirty());
        assert_eq!(
            controller.current_character().map(|c| c.dna.as_str()),
            Some("genes: 1 2 3")
        );
        controller.save().expect("save");
        assert!(!controller.is_dirty());
    }

    #[test]
    fn set_dna_requires_selection() {
        let mut controller = controller();
        assert!(matches!(
            controller.set_dna("x"),
            Err(GalleryError::NoSelection)
        ));
    }

    #[test]
    fn failed_save_keeps_edit_and_dirty_flag() {
        let mut controller = controller();
        controller.new_character(Some("Saved")).expect("new");
        assert!(!controller.is_dirty());

        controller.storage().fail_saves.set(true);
        assert!(matches!(
            controller.create_gallery("Norse"),
            Err(GalleryError::Storage(StorageError::Io { .. }))
        ));
        assert_eq!(controller.library().galleries.len(), 2);
        assert!(controller.is_dirty());

        controller.storage().fail_saves.set(false);
        controller.save().expect("retry save");
        assert!(!controller.is_dirty());
        let stored = controller.storage().library.borrow().clone().expect("stored");
        assert_eq!(stored.galleries.len(), 2);
    }

    #[test]
    fn failed_rename_save_leaves_library_dirty() {
        let mut controller = controller();
        controller.new_character(Some("Before")).expect("new");
        controller.storage().fail_saves.set(true);

        assert!(controller.rename_character("After").is_err());
        assert_eq!(controller.current_character().map(|c| c.name.as_str()), Some("After"));
        assert!(controller.is_dirty());
    }

    #[test]
    fn delete_character_moves_selection_to_same_slot_or_previous() {
        let mut controller = controller();
        for name in ["A", "B", "C"] {
            controller.new_character(Some(name)).expect("new");
        }

        controller.select_character(1).expect("select");
        assert_eq!(controller.delete_character().expect("delete").name, "B");
        assert_eq!(controller.current_character().map(|c| c.name.as_str()), Some("C"));

        assert_eq!(controller.delete_character().expect("delete").name, "C");
        assert_eq!(controller.current_character().map(|c| c.name.as_str()), Some("A"));

        controller.delete_character().expect("delete");
        assert!(controller.current_character().is_none());
        assert!(matches!(
            controller.delete_character(),
            Err(GalleryError::NoSelection)
        ));
    }

    #[test]
    fn select_character_rejects_out_of_range_index() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        assert!(matches!(
            controller.select_character(4),
            Err(GalleryError::CharacterIndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn find_character_matches_id_or_case_insensitive_name() {
        let mut controller = controller();
        let id = controller.new_character(Some("Ragnar")).expect("new").id.clone();
        controller.new_character(Some("Lagertha")).expect("new");

        assert_eq!(controller.find_character(&id), Some(0));
        assert_eq!(controller.find_character("lagertha"), Some(1));
        assert_eq!(controller.find_character("Bjorn"), None);
        assert!(matches!(
            controller.select_by_query("Bjorn"),
            Err(GalleryError::UnknownCharacter { .. })
        ));
    }

    #[test]
    fn galleries_can_be_created_renamed_selected_and_deleted() {
        let mut controller = controller();
        controller.new_character(Some("Default member")).expect("new");
        controller.create_gallery("Norse").expect("create");
        assert_eq!(controller.current_gallery().name, "Norse");
        assert!(controller.current_character().is_none());

        assert!(matches!(
            controller.create_gallery(" Norse "),
            Err(GalleryError::DuplicateGallery { .. })
        ));
        assert!(matches!(
            controller.create_gallery("  "),
            Err(GalleryError::EmptyGalleryName)
        ));

        controller.rename_gallery("Norse", "Vikings").expect("rename");
        controller.select_gallery("Default").expect("select");
        assert_eq!(controller.current_character_index(), Some(0));

        controller.delete_gallery("Default").expect("delete");
        assert_eq!(controller.current_gallery().name, "Vikings");
        assert!(matches!(
            controller.delete_gallery("Vikings"),
            Err(GalleryError::LastGallery)
        ));
        assert!(matches!(
            controller.select_gallery("Default"),
            Err(GalleryError::UnknownGallery { .. })
        ));
    }

    #[test]
    fn delete_gallery_before_current_keeps_current_gallery() {
        let mut controller = controller();
        controller.create_gallery("Second").expect("create");
        controller.delete_gallery("Default").expect("delete");
        assert_eq!(controller.current_gallery().name, "Second");
    }

    #[test]
    fn confirm_portrait_writes_image_and_returns_rect() {
        let mut controller = controller();
        let id = controller.new_character(None).expect("new").id.clone();
        {
            let session = controller.begin_portrait(source_image()).expect("begin");
            session.apply("pan:50,0".parse().expect("gesture"));
        }
        assert_eq!(controller.state(), AppState::Cropping);

        let rect = controller.confirm_portrait().expect("confirm");
        assert_eq!(rect, CropRect::new(0, 400, 900, 1600));
        assert_eq!(controller.state(), AppState::Browsing);

        let expected = PathBuf::from(format!("/portraits/{id}.png"));
        assert_eq!(
            controller.current_character().and_then(|c| c.image.clone()),
            Some(expected.clone())
        );
        assert_eq!(*controller.storage().portraits.borrow(), vec![expected]);
    }

    #[test]
    fn failed_portrait_write_keeps_crop_session_open() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        controller
            .begin_portrait(source_image())
            .expect("begin")
            .apply("pan:50,0".parse().expect("gesture"));

        controller.storage().fail_writes.set(true);
        assert!(matches!(
            controller.confirm_portrait(),
            Err(GalleryError::Storage(StorageError::Io { .. }))
        ));
        assert_eq!(controller.state(), AppState::Cropping);
        assert_eq!(
            controller.crop_session().map(CropSession::current_rect),
            Some(CropRect::new(0, 400, 900, 1600))
        );
        assert!(controller.current_character().and_then(|c| c.image.clone()).is_none());

        controller.storage().fail_writes.set(false);
        let rect = controller.confirm_portrait().expect("retry confirm");
        assert_eq!(rect, CropRect::new(0, 400, 900, 1600));
        assert_eq!(controller.state(), AppState::Browsing);
        assert!(controller.crop_session().is_none());
    }

    #[test]
    fn cancel_portrait_leaves_character_unchanged() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        let before = controller.current_character().cloned();
        let saves = *controller.storage().saves.borrow();

        controller.begin_portrait(source_image()).expect("begin");
        controller.cancel_portrait().expect("cancel");

        assert_eq!(controller.current_character().cloned(), before);
        assert_eq!(*controller.storage().saves.borrow(), saves);
        assert!(controller.storage().portraits.borrow().is_empty());
        assert!(controller.crop_session().is_none());
    }

    #[test]
    fn gallery_edits_are_blocked_while_cropping() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        controller.begin_portrait(source_image()).expect("begin");

        assert!(matches!(
            controller.new_character(None),
            Err(GalleryError::CropSessionOpen)
        ));
        assert!(matches!(
            controller.begin_portrait(source_image()),
            Err(GalleryError::CropSessionOpen)
        ));
        assert!(matches!(
            controller.delete_character(),
            Err(GalleryError::CropSessionOpen)
        ));
    }

    #[test]
    fn portrait_requires_selection_and_open_session() {
        let mut controller = controller();
        assert!(matches!(
            controller.begin_portrait(source_image()),
            Err(GalleryError::NoSelection)
        ));
        controller.new_character(None).expect("new");
        assert!(matches!(
            controller.confirm_portrait(),
            Err(GalleryError::NoCropSession)
        ));
        assert!(matches!(
            controller.cancel_portrait(),
            Err(GalleryError::NoCropSession)
        ));
    }

    #[test]
    fn begin_portrait_with_empty_image_stays_browsing() {
        let mut controller = controller();
        controller.new_character(None).expect("new");
        assert!(matches!(
            controller.begin_portrait(DynamicImage::new_rgba8(0, 0)),
            Err(GalleryError::Crop(_))
        ));
        assert_eq!(controller.state(), AppState::Browsing);
    }
}
