//! Selection overlay on top of classification flags.
//!
//! At most one object is selected. Selecting caches the object's classified
//! flag and paints a selection marker over it; unselecting restores the cached
//! flag. The table is never touched by selection alone.

use crate::codec::{ClassificationCodec, Flag};
use crate::constants::BACKGROUND_FLAG;
use crate::error::{EngineError, Result};
use crate::image::ImageState;
use crate::manual_log::ManualLog;
use crate::model::{Axis, ManualClass, ObjectNumber, Voxel};

/// How the selection marker is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    /// Marker reflects the object's manual class
    #[default]
    RespectClass,
    /// Uniform marker regardless of class
    Highlight,
}

/// The currently selected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedObject {
    pub object: ObjectNumber,
    pub first_voxel: Voxel,
    /// Marker currently painted over the object
    pub selected_flag: Flag,
    /// Classified flag restored on unselect
    pub unselected_flag: Flag,
    pub mode: SelectMode,
}

/// Result of a manual reclassification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclassifyOutcome {
    /// No object was selected; nothing changed
    NothingSelected,
    /// The object already had this class; only the marker was refreshed
    Unchanged(ManualClass),
    /// The object's manual class changed
    Reclassified {
        object: ObjectNumber,
        from: ManualClass,
        to: ManualClass,
    },
}

/// Owner of the single selected object.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    current: Option<SelectedObject>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the selected object, if any.
    pub fn selected(&self) -> Option<&SelectedObject> {
        self.current.as_ref()
    }

    /// Check if a specific object is selected.
    pub fn is_selected(&self, object: ObjectNumber) -> bool {
        self.current.is_some_and(|s| s.object == object)
    }

    fn marker(codec: &ClassificationCodec, manual: ManualClass, mode: SelectMode) -> Result<Flag> {
        match mode {
            SelectMode::RespectClass => codec.selected_flag(manual.index()),
            SelectMode::Highlight => Ok(codec.highlight_flag()),
        }
    }

    fn restore(image: &mut ImageState, selected: &SelectedObject) -> Result<()> {
        image.write_flag(selected.first_voxel, selected.unselected_flag)?;
        log::debug!(
            "Unselected object {} (restored flag {})",
            selected.object,
            selected.unselected_flag
        );
        Ok(())
    }

    /// Click on background: restore the selected object, if any.
    pub fn select_background_click(&mut self, image: &mut ImageState) -> Result<Option<ObjectNumber>> {
        let Some(selected) = self.current.take() else {
            return Ok(None);
        };
        Self::restore(image, &selected)?;
        image.repaint();
        Ok(Some(selected.object))
    }

    /// Unselect `object` if it is the selected one, without repainting.
    /// Used before an axis update so the update sees the classified flag.
    pub fn release(&mut self, image: &mut ImageState, object: ObjectNumber) -> Result<bool> {
        if !self.is_selected(object) {
            return Ok(false);
        }
        if let Some(selected) = self.current.take() {
            Self::restore(image, &selected)?;
        }
        Ok(true)
    }

    /// Select the object covering `voxel`.
    ///
    /// A click on background behaves like [`Self::select_background_click`] and
    /// returns None.
    pub fn select_object(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        voxel: Voxel,
        mode: SelectMode,
    ) -> Result<Option<ObjectNumber>> {
        let flag = image
            .voxels()
            .read_flag(voxel)
            .ok_or(EngineError::NoObjectAtVoxel(voxel))?;
        if flag == BACKGROUND_FLAG {
            self.select_background_click(image)?;
            return Ok(None);
        }

        let (object, first_voxel) = image.object_at(voxel)?;
        let classes = image.classes(object)?;

        let unselected_flag = if codec.is_selected_flag(flag) {
            // Already showing a marker: the cache may hold the marker itself,
            // so rebuild the classified flag from the record.
            if !self.is_selected(object) {
                if let Some(previous) = self.current.take() {
                    Self::restore(image, &previous)?;
                }
            }
            codec.encode_triple(&classes)?
        } else {
            if let Some(previous) = self.current.take() {
                Self::restore(image, &previous)?;
            }
            match codec.decode_triple(flag) {
                Ok(decoded) if decoded == classes => flag,
                _ => return Err(EngineError::Desynchronized { object, flag }),
            }
        };

        let selected_flag = Self::marker(codec, classes.manual, mode)?;
        image.write_flag(first_voxel, selected_flag)?;
        image.repaint();

        self.current = Some(SelectedObject {
            object,
            first_voxel,
            selected_flag,
            unselected_flag,
            mode,
        });
        log::debug!("Selected object {} ({:?}, flag {})", object, mode, unselected_flag);
        Ok(Some(object))
    }

    /// Change the manual class of the selected object.
    ///
    /// Statistics, voxel flags, the table record and the manual log are all
    /// updated. The object stays selected with a marker for its new class.
    /// If the record cannot be written, the marker is restored and statistics
    /// and the log are left alone.
    pub fn reclassify(
        &mut self,
        image: &mut ImageState,
        codec: &ClassificationCodec,
        manual_log: &mut dyn ManualLog,
        new: ManualClass,
    ) -> Result<ReclassifyOutcome> {
        let Some(mut selected) = self.current else {
            log::debug!("Reclassify ignored: nothing selected");
            return Ok(ReclassifyOutcome::NothingSelected);
        };

        let classes = image.classes(selected.object)?;
        let old = classes.manual;
        let classified = codec.encode_triple(&classes)?;

        if old == new {
            selected.unselected_flag = classified;
            selected.mode = SelectMode::RespectClass;
            selected.selected_flag = codec.selected_flag(new.index())?;
            image.write_flag(selected.first_voxel, selected.selected_flag)?;
            image.repaint();
            self.current = Some(selected);
            return Ok(ReclassifyOutcome::Unchanged(old));
        }

        let unselected_flag = codec.with_axis(classified, Axis::Manual, new.index())?;
        let selected_flag = codec.selected_flag(new.index())?;

        image.write_flag(selected.first_voxel, selected_flag)?;
        if let Err(e) = image.set_record_axis(selected.object, Axis::Manual, new.index()) {
            image.write_flag(selected.first_voxel, selected.selected_flag)?;
            return Err(e);
        }
        image.stats_mut().adjust(old, new);
        selected.unselected_flag = unselected_flag;
        selected.selected_flag = selected_flag;
        selected.mode = SelectMode::RespectClass;

        if new == ManualClass::Unclassified {
            manual_log.remove(image.key(), selected.object);
        } else {
            manual_log.upsert(image.key(), selected.object, new);
        }

        image.repaint();
        self.current = Some(selected);
        log::debug!("Reclassified object {}: {} -> {}", selected.object, old, new);
        Ok(ReclassifyOutcome::Reclassified {
            object: selected.object,
            from: old,
            to: new,
        })
    }
}
