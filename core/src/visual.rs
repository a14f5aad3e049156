//! Sprite and animation records handed to the external renderer.
//!
//! Nothing here draws; buildings only choose which sheet region and
//! frame sequence represent their current state.

use serde::{Deserialize, Serialize};

use crate::types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGroup {
    Land2a,
    Sprites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub group:  ResourceGroup,
    pub index:  u32,
    pub offset: (i32, i32),
}

impl Picture {
    pub fn new(group: ResourceGroup, index: u32) -> Self {
        Self { group, index, offset: (0, 0) }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }
}

/// A frame sequence cut from one resource group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    frames:     Vec<Picture>,
    offset:     (i32, i32),
    delay:      Tick,
    looped:     bool,
    index:      usize,
    last_tick:  Tick,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            frames:    Vec::new(),
            offset:    (0, 0),
            delay:     1,
            looped:    true,
            index:     0,
            last_tick: 0,
        }
    }
}

impl Animation {
    /// Append `count` consecutive frames starting at `start`.
    pub fn load(&mut self, group: ResourceGroup, start: u32, count: u32) {
        self.frames
            .extend((start..start + count).map(|index| Picture::new(group, index)));
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.index = 0;
    }

    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.offset = (x, y);
    }

    /// Ticks between frame advances. Zero is treated as one.
    pub fn set_delay(&mut self, delay: Tick) {
        self.delay = delay.max(1);
    }

    pub fn set_loop(&mut self, looped: bool) {
        self.looped = looped;
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn first_index(&self) -> Option<u32> {
        self.frames.first().map(|p| p.index)
    }

    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Advance to the frame for `tick`. Non-looping animations stop on
    /// their last frame.
    pub fn update(&mut self, tick: Tick) {
        if self.frames.is_empty() || tick < self.last_tick + self.delay {
            return;
        }
        self.last_tick = tick;
        let next = self.index + 1;
        if next < self.frames.len() {
            self.index = next;
        } else if self.looped {
            self.index = 0;
        }
    }

    /// Current frame with the animation offset applied.
    pub fn frame(&self) -> Option<Picture> {
        self.frames
            .get(self.index)
            .map(|p| p.with_offset(self.offset.0, self.offset.1))
    }
}

/// Everything the renderer needs for one building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub picture:     Option<Picture>,
    pub animation:   Animation,
    pub fg_pictures: Vec<Option<Picture>>,
}

impl VisualState {
    pub fn set_picture(&mut self, group: ResourceGroup, index: u32) {
        self.picture = Some(Picture::new(group, index));
    }

    /// Replace the running animation with a fresh sequence.
    pub fn reload_animation(&mut self, group: ResourceGroup, start: u32, count: u32, offset: (i32, i32)) {
        self.animation.clear();
        self.animation.load(group, start, count);
        self.animation.set_offset(offset.0, offset.1);
    }

    /// Drop the animation and every foreground layer.
    pub fn clear_overlays(&mut self) {
        self.animation.clear();
        self.fg_pictures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looping_animation_wraps() {
        let mut anim = Animation::default();
        anim.load(ResourceGroup::Land2a, 188, 3);
        let seen: Vec<u32> = (1..=4)
            .map(|t| {
                anim.update(t);
                anim.frame().unwrap().index
            })
            .collect();
        assert_eq!(seen, vec![189, 190, 188, 189]);
    }

    #[test]
    fn one_shot_animation_holds_last_frame() {
        let mut anim = Animation::default();
        anim.load(ResourceGroup::Sprites, 1, 2);
        anim.set_loop(false);
        anim.set_delay(4);
        for t in 1..=40 {
            anim.update(t);
        }
        assert_eq!(anim.frame().unwrap().index, 2);
    }

    #[test]
    fn frame_carries_offset() {
        let mut anim = Animation::default();
        anim.load(ResourceGroup::Land2a, 215, 8);
        anim.set_offset(14, 26);
        assert_eq!(anim.frame().unwrap().offset, (14, 26));
        anim.clear();
        assert!(anim.frame().is_none());
    }
}
