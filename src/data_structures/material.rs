//! Surface materials and the opacity bookkeeping used by crossfades.
//!
//! A material's authored `transparent`/`opacity` pair is recorded in an
//! [`OpacityRecord`] the first time a fade touches it. Every later fade is
//! applied relative to that record, so a half-transparent pond stays half as
//! visible as the rest of the site while fading and returns to exactly its
//! authored values once fully visible.

/// The authored transparency of a material before any fade touched it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpacityRecord {
    pub transparent: bool,
    pub opacity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSlot {
    BaseColor,
    Normal,
    Occlusion,
    Emissive,
    MetallicRoughness,
}

/// A texture referenced by a material. Decoding and upload belong to the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRef {
    pub slot: TextureSlot,
    pub source: String,
    disposed: bool,
}

impl TextureRef {
    pub fn new(slot: TextureSlot, source: impl Into<String>) -> Self {
        Self {
            slot,
            source: source.into(),
            disposed: false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: [f32; 3],
    pub transparent: bool,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub wireframe: bool,
    pub textures: Vec<TextureRef>,
    original: Option<OpacityRecord>,
    disposed: bool,
}

impl Material {
    /// An opaque material with the given `0xRRGGBB` colour.
    pub fn standard(name: impl Into<String>, hex: u32) -> Self {
        Self {
            name: name.into(),
            color: rgb_from_hex(hex),
            transparent: false,
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            wireframe: false,
            textures: Vec::new(),
            original: None,
            disposed: false,
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_surface(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness = roughness;
        self.metalness = metalness;
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.textures.push(texture);
        self
    }

    /// Records the authored opacity if no fade has done so yet and returns the record.
    pub fn capture_original(&mut self) -> OpacityRecord {
        *self.original.get_or_insert(OpacityRecord {
            transparent: self.transparent,
            opacity: self.opacity,
        })
    }

    pub fn original(&self) -> Option<OpacityRecord> {
        self.original
    }

    /**
     * Applies a fade `factor` relative to the recorded original opacity.
     *
     * Below 1 the material is forced transparent with `factor * original.opacity`;
     * at or above 1 both fields are restored to the record.
     */
    pub fn apply_fade(&mut self, factor: f32) {
        let original = self.capture_original();
        if factor < 1.0 {
            self.transparent = true;
            self.opacity = factor.max(0.0) * original.opacity;
        } else {
            self.transparent = original.transparent;
            self.opacity = original.opacity;
        }
    }

    /**
     * Releases the material and every texture it references.
     * Returns the number of textures released by this call.
     */
    pub fn dispose(&mut self) -> usize {
        if self.disposed {
            return 0;
        }
        let mut released = 0;
        for texture in self.textures.iter_mut().filter(|t| !t.disposed) {
            texture.disposed = true;
            released += 1;
        }
        self.disposed = true;
        released
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}
