//! Static table of demo clips.
//!
//! Streamed clips are addressable by asset name for stop requests; the
//! one-shot slot is fire-and-play with no stop handle.

/// One entry in the demo clip table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipDescriptor {
    /// Position in the clip table, matching the button that triggers it
    pub index: usize,
    /// Logical asset name resolved through the asset provider
    pub asset_name: &'static str,
    /// One-shot effects play non-addressably and cannot be stopped
    pub one_shot: bool,
}

/// Slot reserved for the one-shot sound effect.
pub const SOUND_EFFECT_SLOT: usize = 3;

/// Demo clip table. Slots 0-2 are streamed songs, slot 3 is a sound effect.
pub const CLIPS: [ClipDescriptor; 4] = [
    ClipDescriptor {
        index: 0,
        asset_name: "swansong.ogg",
        one_shot: false,
    },
    ClipDescriptor {
        index: 1,
        asset_name: "bm.xm",
        one_shot: false,
    },
    ClipDescriptor {
        index: 2,
        asset_name: "fables.spx",
        one_shot: false,
    },
    ClipDescriptor {
        index: 3,
        asset_name: "gamestart.ogg",
        one_shot: true,
    },
];

/// Look up a clip by table index.
pub fn clip(index: usize) -> Option<&'static ClipDescriptor> {
    CLIPS.get(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_lookup() {
        let first = clip(0).unwrap();
        assert_eq!(first.asset_name, "swansong.ogg");
        assert!(!first.one_shot);

        assert!(clip(CLIPS.len()).is_none());
    }

    #[test]
    fn test_sound_effect_slot_is_one_shot() {
        let effect = clip(SOUND_EFFECT_SLOT).unwrap();
        assert!(effect.one_shot);
        assert_eq!(effect.asset_name, "gamestart.ogg");
    }

    #[test]
    fn test_indices_match_positions() {
        for (position, descriptor) in CLIPS.iter().enumerate() {
            assert_eq!(descriptor.index, position);
        }
    }
}
