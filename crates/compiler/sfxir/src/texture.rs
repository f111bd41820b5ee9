use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampler state and stage visibility of a texture, packed into a stable bitmask.
///
/// The bit layout is part of the binding table format:
///
/// - bits 0-2: [AddressMode]
/// - bits 3-4: [Filter]
/// - bit 5: [MipMaps]
/// - bits 6-7: [Visibility]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureBindingOptions(u32);

impl TextureBindingOptions {
    pub const ADDRESS_MASK: u32 = 0b111;
    pub const FILTER_MASK: u32 = 0b11 << 3;
    pub const MIP_MAPS_MASK: u32 = 1 << 5;
    pub const VISIBILITY_MASK: u32 = 0b11 << 6;

    pub fn new(
        address: AddressMode,
        filter: Filter,
        mip_maps: MipMaps,
        visibility: Visibility,
    ) -> Self {
        TextureBindingOptions(
            address as u32 | (filter as u32) << 3 | (mip_maps as u32) << 5 | (visibility as u32) << 6,
        )
    }

    pub fn from_bits(bits: u32) -> Self {
        TextureBindingOptions(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn address(&self) -> AddressMode {
        match self.0 & Self::ADDRESS_MASK {
            1 => AddressMode::Mirror,
            2 => AddressMode::Clamp,
            3 => AddressMode::BorderBlack,
            4 => AddressMode::BorderWhite,
            5 => AddressMode::BorderTransparent,
            _ => AddressMode::Wrap,
        }
    }

    pub fn filter(&self) -> Filter {
        match (self.0 & Self::FILTER_MASK) >> 3 {
            1 => Filter::NoFilter,
            2 => Filter::Anisotropic,
            _ => Filter::Linear,
        }
    }

    pub fn mip_maps(&self) -> MipMaps {
        if self.0 & Self::MIP_MAPS_MASK != 0 {
            MipMaps::NoMipMaps
        } else {
            MipMaps::MipMaps
        }
    }

    pub fn visibility(&self) -> Visibility {
        match (self.0 & Self::VISIBILITY_MASK) >> 6 {
            2 => Visibility::AlwaysVisible,
            3 => Visibility::GeometryOnly,
            _ => Visibility::ShadingOnly,
        }
    }

    /// Whether the texture must be reachable from the geometry (vertex) stage.
    pub fn is_geometry_visible(&self) -> bool {
        matches!(
            self.visibility(),
            Visibility::AlwaysVisible | Visibility::GeometryOnly
        )
    }

    /// Combines option names as they appear in a texture declaration, e.g. `["Clamp", "NoMipMaps"]`.
    pub fn from_option_names<'a, I>(names: I) -> Result<Self, UnknownTextureOption>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| name.parse::<TextureOption>())
            .try_fold(TextureBindingOptions::default(), |options, option| {
                Ok(options | option?)
            })
    }
}

impl fmt::Debug for TextureBindingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureBindingOptions")
            .field("address", &self.address())
            .field("filter", &self.filter())
            .field("mip_maps", &self.mip_maps())
            .field("visibility", &self.visibility())
            .finish()
    }
}

impl BitOr<TextureOption> for TextureBindingOptions {
    type Output = TextureBindingOptions;

    fn bitor(self, rhs: TextureOption) -> Self::Output {
        TextureBindingOptions(self.0 | rhs.bits())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub enum AddressMode {
    #[default]
    Wrap = 0,
    Mirror = 1,
    Clamp = 2,
    BorderBlack = 3,
    BorderWhite = 4,
    BorderTransparent = 5,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub enum Filter {
    #[default]
    Linear = 0,
    NoFilter = 1,
    Anisotropic = 2,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub enum MipMaps {
    #[default]
    MipMaps = 0,
    NoMipMaps = 1,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Debug)]
pub enum Visibility {
    #[default]
    ShadingOnly = 0,
    AlwaysVisible = 2,
    GeometryOnly = 3,
}

/// A single named option of a texture declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TextureOption {
    Address(AddressMode),
    Filter(Filter),
    MipMaps(MipMaps),
    Visibility(Visibility),
}

impl TextureOption {
    pub fn bits(&self) -> u32 {
        match *self {
            TextureOption::Address(mode) => mode as u32,
            TextureOption::Filter(filter) => (filter as u32) << 3,
            TextureOption::MipMaps(mip_maps) => (mip_maps as u32) << 5,
            TextureOption::Visibility(visibility) => (visibility as u32) << 6,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("unknown texture option `{0}`")]
pub struct UnknownTextureOption(pub String);

impl FromStr for TextureOption {
    type Err = UnknownTextureOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let option = match s {
            "Wrap" => TextureOption::Address(AddressMode::Wrap),
            "Mirror" => TextureOption::Address(AddressMode::Mirror),
            "Clamp" => TextureOption::Address(AddressMode::Clamp),
            "BorderBlack" => TextureOption::Address(AddressMode::BorderBlack),
            "BorderWhite" => TextureOption::Address(AddressMode::BorderWhite),
            "BorderTransparent" => TextureOption::Address(AddressMode::BorderTransparent),
            "Linear" => TextureOption::Filter(Filter::Linear),
            "NoFilter" => TextureOption::Filter(Filter::NoFilter),
            "Anisotropic" => TextureOption::Filter(Filter::Anisotropic),
            "MipMaps" => TextureOption::MipMaps(MipMaps::MipMaps),
            "NoMipMaps" => TextureOption::MipMaps(MipMaps::NoMipMaps),
            "ShadingOnly" => TextureOption::Visibility(Visibility::ShadingOnly),
            "AlwaysVisible" => TextureOption::Visibility(Visibility::AlwaysVisible),
            "GeometryOnly" => TextureOption::Visibility(Visibility::GeometryOnly),
            _ => return Err(UnknownTextureOption(s.to_string())),
        };

        Ok(option)
    }
}
