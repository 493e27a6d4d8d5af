//! Scoped recording.
//!
//! [`UndoBlock`] and [`UndoMultiBlock`] open a recording session when built
//! and close it when dropped, so an early return, a `?` or a panic inside the
//! editing scope still ends the session. While the block is alive the world
//! is reached through it (`Deref`/`DerefMut`).

use std::ops::{Deref, DerefMut};

use super::action::UndoWorld;
use super::engine::Undo;
use super::error::UndoResult;

/// Records edits to one object for the lifetime of the block.
///
/// ```ignore
/// {
///     let mut scene = UndoBlock::begin(&mut undo, &mut scene, actor, "Move actor")?;
///     scene.actor_mut(actor).transform.translation[0] += 1.0;
/// } // recorded here
/// ```
pub struct UndoBlock<'a, W: UndoWorld> {
    undo: &'a mut Undo<W>,
    world: &'a mut W,
    key: W::Key,
    open: bool,
}

impl<'a, W: UndoWorld> UndoBlock<'a, W> {
    /// Opens a session for `key`.
    ///
    /// If the engine is disabled the block is inert and records nothing.
    pub fn begin(
        undo: &'a mut Undo<W>,
        world: &'a mut W,
        key: W::Key,
        label: impl Into<String>,
    ) -> UndoResult<Self> {
        let open = undo.record_begin(world, key.clone(), label)?;
        Ok(Self {
            undo,
            world,
            key,
            open,
        })
    }

    /// Ends the session now and returns whether an action was committed.
    pub fn finish(mut self) -> UndoResult<bool> {
        self.close()
    }

    /// Drops the session without recording anything.
    ///
    /// Edits already made to the world stay in place.
    pub fn cancel(mut self) {
        if std::mem::take(&mut self.open) {
            self.undo.cancel_recording(Some(&self.key));
        }
    }

    fn close(&mut self) -> UndoResult<bool> {
        if !std::mem::take(&mut self.open) {
            return Ok(false);
        }
        self.undo.record_end(&mut *self.world, Some(&self.key))
    }
}

impl<W: UndoWorld> Deref for UndoBlock<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        &*self.world
    }
}

impl<W: UndoWorld> DerefMut for UndoBlock<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut *self.world
    }
}

impl<W: UndoWorld> Drop for UndoBlock<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("failed to close undo block for {:?}: {e}", self.key);
        }
    }
}

/// Records edits to several objects for the lifetime of the block.
pub struct UndoMultiBlock<'a, W: UndoWorld> {
    undo: &'a mut Undo<W>,
    world: &'a mut W,
    keys: Vec<W::Key>,
    open: bool,
}

impl<'a, W: UndoWorld> UndoMultiBlock<'a, W> {
    /// Opens a session covering `keys`.
    pub fn begin(
        undo: &'a mut Undo<W>,
        world: &'a mut W,
        keys: Vec<W::Key>,
        label: impl Into<String>,
    ) -> UndoResult<Self> {
        let open = undo.record_multi_begin(world, keys.clone(), label)?;
        Ok(Self {
            undo,
            world,
            keys,
            open,
        })
    }

    pub fn finish(mut self) -> UndoResult<bool> {
        self.close()
    }

    pub fn cancel(mut self) {
        if std::mem::take(&mut self.open) {
            self.undo.cancel_multi_recording(Some(self.keys.as_slice()));
        }
    }

    fn close(&mut self) -> UndoResult<bool> {
        if !std::mem::take(&mut self.open) {
            return Ok(false);
        }
        self.undo.record_multi_end(&mut *self.world, Some(self.keys.as_slice()))
    }
}

impl<W: UndoWorld> Deref for UndoMultiBlock<'_, W> {
    type Target = W;

    fn deref(&self) -> &W {
        &*self.world
    }
}

impl<W: UndoWorld> DerefMut for UndoMultiBlock<'_, W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut *self.world
    }
}

impl<W: UndoWorld> Drop for UndoMultiBlock<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("failed to close undo block for {:?}: {e}", self.keys);
        }
    }
}
