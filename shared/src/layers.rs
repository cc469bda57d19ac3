use num_traits::{One, PrimInt};

/// The default primitive storage for layer masks (one bit per collision layer).
///
/// Matches the width of Rapier collision group memberships.
pub type LayerBits = u32;

/// Trait implemented by user-defined layer enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
pub trait Layer {
    type Storage: PrimInt;

    fn layer_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `layer_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.layer_index() as usize)
    }
}

/// A set of collision layers used to filter ray probes and to tag surfaces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LayerMask<T: PrimInt = LayerBits> {
    pub bits: T,
}

impl<T: PrimInt> Default for LayerMask<T> {
    /// Everything, the same as an unset probe mask.
    fn default() -> Self {
        Self::all()
    }
}

impl<T: PrimInt> LayerMask<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    pub fn none() -> Self {
        Self { bits: T::zero() }
    }

    pub fn with<U: Layer<Storage = T>>(mut self, layer: U) -> Self {
        self.bits = self.bits | layer.mask();
        self
    }

    pub fn from_layers<U: Layer<Storage = T> + Copy>(layers: &[U]) -> Self {
        let bits = layers.iter().fold(T::zero(), |acc, l| acc | l.mask());
        Self { bits }
    }

    pub fn contains<U: Layer<Storage = T>>(&self, layer: U) -> bool {
        (self.bits & layer.mask()) != T::zero()
    }

    /// Does any bit of `other` fall inside this mask?
    pub fn intersects(&self, other: T) -> bool {
        (self.bits & other) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Layer membership of a touched surface, as reported by the host engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceTag {
    pub layers: LayerBits,
}

impl SurfaceTag {
    pub fn new(layers: LayerBits) -> Self {
        Self { layers }
    }

    pub fn of<U: Layer<Storage = LayerBits>>(layer: U) -> Self {
        Self {
            layers: layer.mask(),
        }
    }

    /// Is this surface on any of the layers in `mask`?
    pub fn is_in(&self, mask: LayerMask) -> bool {
        mask.intersects(self.layers)
    }
}

/// Declare a layer enum and implement `Layer` for it.
///
/// Example:
/// ```rust
/// gravity_walker::define_layers!(SceneLayer, u32, {
///     Default,
///     Stairs,
///     Character,
/// });
/// ```
#[macro_export]
macro_rules! define_layers {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::layers::Layer for $name {
            type Storage = $storage;

            fn layer_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_layers!(TestLayer, u32, { Ground, Stairs, Water });

    #[test]
    fn mask_membership_follows_layer_bits() {
        let mask = LayerMask::from_layers(&[TestLayer::Stairs]);
        assert!(mask.contains(TestLayer::Stairs));
        assert!(!mask.contains(TestLayer::Ground));
        assert_eq!(mask.bits, 0b10);
    }

    #[test]
    fn default_mask_accepts_everything() {
        let mask: LayerMask = LayerMask::default();
        assert!(mask.contains(TestLayer::Water));
        assert!(SurfaceTag::of(TestLayer::Ground).is_in(mask));
    }

    #[test]
    fn empty_mask_rejects_every_surface() {
        let mask: LayerMask = LayerMask::none();
        assert!(mask.is_empty());
        assert!(!SurfaceTag::new(u32::MAX).is_in(mask));
    }

    #[test]
    fn surface_on_several_layers_matches_any_of_them() {
        let surface = SurfaceTag::new(TestLayer::Ground.mask() | TestLayer::Stairs.mask());
        assert!(surface.is_in(LayerMask::none().with(TestLayer::Stairs)));
        assert!(!surface.is_in(LayerMask::none().with(TestLayer::Water)));
    }
}
