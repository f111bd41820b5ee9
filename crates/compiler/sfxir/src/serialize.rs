//! The binary form of a [BindingTable].
//!
//! The stream starts with an identifier and a version string, followed by the input binding
//! map, the axis map, the effect map and the program map, each in insertion order. Every input
//! binding is written as a [BindingKind] tag followed by its encoded payload, so that a
//! [BindingDecoder] can reconstruct the kind-specific data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binding::{BindingKind, ConstantBinding, EffectBinding, InputBinding, TextureBinding};
use crate::table::{BindingTable, EffectRecord, ModuleRecord};
use crate::variant::VariantId;

pub const IDENTIFIER: &str = "SFX binding table";
pub const VERSION: &str = "1.0";

#[derive(Debug, Error)]
#[error("failed to encode binding table: {0}")]
pub struct EncodeError(#[from] bincode::error::EncodeError);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed binding table: {0}")]
    Malformed(#[from] bincode::error::DecodeError),
    #[error("not a binding table (found identifier `{0}`)")]
    Identifier(String),
    #[error("unsupported binding table version `{found}`")]
    Version { found: String },
    #[error("cannot decode {kind:?} binding: {reason}")]
    Binding { kind: BindingKind, reason: String },
}

/// Reconstructs input bindings from their tagged payloads.
pub trait BindingDecoder {
    fn decode_binding(
        &self,
        kind: BindingKind,
        payload: &[u8],
    ) -> Result<InputBinding, DecodeError> {
        decode_standard_binding(kind, payload)
    }
}

/// Decodes the payloads written by [BindingTable::to_bytes].
pub struct StandardDecoder;

impl BindingDecoder for StandardDecoder {}

pub fn decode_standard_binding(
    kind: BindingKind,
    payload: &[u8],
) -> Result<InputBinding, DecodeError> {
    let err = |e: bincode::error::DecodeError| DecodeError::Binding {
        kind,
        reason: e.to_string(),
    };

    let binding = match kind {
        BindingKind::Constant => {
            InputBinding::Constant(decode::<ConstantBinding>(payload).map_err(err)?)
        }
        BindingKind::Texture => {
            InputBinding::Texture(decode::<TextureBinding>(payload).map_err(err)?)
        }
    };

    Ok(binding)
}

pub fn encode_binding(binding: &InputBinding) -> Result<Vec<u8>, EncodeError> {
    let payload = match binding {
        InputBinding::Constant(binding) => encode(binding)?,
        InputBinding::Texture(binding) => encode(binding)?,
    };

    Ok(payload)
}

#[derive(Serialize, Deserialize)]
struct Header {
    identifier: String,
    version: String,
}

#[derive(Serialize, Deserialize)]
struct Body {
    inputs: Vec<ModuleEntry>,
    axes: Vec<(String, Vec<String>)>,
    effects: Vec<EffectEntry>,
    programs: Vec<(String, Vec<u8>)>,
}

#[derive(Serialize, Deserialize)]
struct ModuleEntry {
    module: String,
    bindings: Vec<TaggedBinding>,
    axes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct TaggedBinding {
    kind: BindingKind,
    payload: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct EffectEntry {
    effect: String,
    module: String,
    default_template: String,
    templates: Vec<(String, Vec<(u32, EffectBinding)>)>,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, bincode::error::EncodeError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, bincode::error::DecodeError> {
    decode_prefix(bytes).map(|(value, _)| value)
}

fn decode_prefix<T: for<'de> Deserialize<'de>>(
    bytes: &[u8],
) -> Result<(T, usize), bincode::error::DecodeError> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
}

impl BindingTable {
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let header = Header {
            identifier: IDENTIFIER.to_string(),
            version: VERSION.to_string(),
        };

        let mut inputs = Vec::with_capacity(self.inputs.len());

        for (module, record) in &self.inputs {
            let bindings = record
                .bindings
                .values()
                .map(|binding| {
                    Ok(TaggedBinding {
                        kind: binding.kind(),
                        payload: encode_binding(binding)?,
                    })
                })
                .collect::<Result<Vec<_>, EncodeError>>()?;

            inputs.push(ModuleEntry {
                module: module.clone(),
                bindings,
                axes: record.axes.iter().cloned().collect(),
            });
        }

        let effects = self
            .effects
            .iter()
            .map(|(effect, record)| EffectEntry {
                effect: effect.clone(),
                module: record.module.clone(),
                default_template: record.default_template.clone(),
                templates: record
                    .templates
                    .iter()
                    .map(|(template, variants)| {
                        let variants = variants
                            .iter()
                            .map(|(id, binding)| (id.to_u32(), binding.clone()))
                            .collect();

                        (template.clone(), variants)
                    })
                    .collect(),
            })
            .collect();

        let body = Body {
            inputs,
            axes: self
                .axes
                .iter()
                .map(|(axis, values)| (axis.clone(), values.clone()))
                .collect(),
            effects,
            programs: self
                .programs
                .iter()
                .map(|(name, code)| (name.clone(), code.clone()))
                .collect(),
        };

        let mut bytes = encode(&header)?;

        bytes.extend(encode(&body)?);

        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        BindingTable::from_bytes_with(bytes, &StandardDecoder)
    }

    /// Decodes a table, reconstructing input bindings with `decoder`.
    pub fn from_bytes_with<D>(bytes: &[u8], decoder: &D) -> Result<Self, DecodeError>
    where
        D: BindingDecoder + ?Sized,
    {
        let (header, read): (Header, usize) = decode_prefix(bytes)?;

        if header.identifier != IDENTIFIER {
            return Err(DecodeError::Identifier(header.identifier));
        }

        if header.version != VERSION {
            return Err(DecodeError::Version {
                found: header.version,
            });
        }

        let body: Body = decode(&bytes[read..])?;

        let mut inputs = IndexMap::with_capacity(body.inputs.len());

        for entry in body.inputs {
            let mut record = ModuleRecord::default();

            for tagged in entry.bindings {
                let binding = decoder.decode_binding(tagged.kind, &tagged.payload)?;

                record.bindings.insert(binding.name().to_string(), binding);
            }

            record.axes = entry.axes.into_iter().collect();
            inputs.insert(entry.module, record);
        }

        let effects = body
            .effects
            .into_iter()
            .map(|entry| {
                let templates = entry
                    .templates
                    .into_iter()
                    .map(|(template, variants)| {
                        let variants = variants
                            .into_iter()
                            .map(|(id, binding)| (VariantId::from_u32(id), binding))
                            .collect();

                        (template, variants)
                    })
                    .collect();

                let record = EffectRecord {
                    module: entry.module,
                    default_template: entry.default_template,
                    templates,
                };

                (entry.effect, record)
            })
            .collect();

        Ok(BindingTable {
            inputs,
            axes: body.axes.into_iter().collect(),
            effects,
            programs: body.programs.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingHeader;
    use crate::layout::{SurfaceFormat, VertexElement};
    use crate::texture::{AddressMode, Filter, MipMaps, TextureBindingOptions, Visibility};
    use crate::ty::TY_FLOAT4X4;
    use crate::variant::{VariantAxis, VariantValues};

    fn sample_table() -> BindingTable {
        let mut table = BindingTable::new();

        table.bind_input(ConstantBinding {
            header: BindingHeader {
                name: "World".to_string(),
                module: "$globals".to_string(),
                address: 0,
            },
            ty: TY_FLOAT4X4,
            array_size: 1,
        });
        table.bind_input(TextureBinding {
            header: BindingHeader {
                name: "Albedo".to_string(),
                module: "Main".to_string(),
                address: 0,
            },
            options: TextureBindingOptions::new(
                AddressMode::BorderWhite,
                Filter::Anisotropic,
                MipMaps::MipMaps,
                Visibility::AlwaysVisible,
            ),
            border_color: [0.25, 0.5, 1.0],
            global: false,
        });
        table.bind_axes("Main", &[VariantAxis::new("Quality", &["Low", "High"])]);

        let variant: VariantValues = [("Quality", "High")].into_iter().collect();

        table.bind_effect(EffectBinding {
            effect: "Lit".to_string(),
            module: "Main".to_string(),
            template: String::new(),
            vertex_program: format!("text_Main.vsLit-{}", variant.id()),
            pixel_program: format!("text_Main.psLit-{}", variant.id()),
            input_layout: vec![VertexElement::Position3, VertexElement::Float2],
            target_formats: vec![SurfaceFormat::Color],
            instancing: true,
            variant,
        });
        table.bind_program("text_Main.vsLit-0", vec![1, 2, 3]);

        table
    }

    #[test]
    fn test_round_trip() {
        let table = sample_table();
        let bytes = table.to_bytes().unwrap();

        assert_eq!(BindingTable::from_bytes(&bytes).unwrap(), table);
    }

    #[test]
    fn test_round_trip_empty() {
        let table = BindingTable::new();
        let bytes = table.to_bytes().unwrap();

        assert_eq!(BindingTable::from_bytes(&bytes).unwrap(), table);
    }

    #[test]
    fn test_rejects_foreign_identifier() {
        let bytes = encode(&Header {
            identifier: "something else".to_string(),
            version: VERSION.to_string(),
        })
        .unwrap();

        assert!(matches!(
            BindingTable::from_bytes(&bytes),
            Err(DecodeError::Identifier(id)) if id == "something else"
        ));
    }

    #[test]
    fn test_rejects_other_version() {
        let bytes = encode(&Header {
            identifier: IDENTIFIER.to_string(),
            version: "0.3".to_string(),
        })
        .unwrap();

        assert!(matches!(
            BindingTable::from_bytes(&bytes),
            Err(DecodeError::Version { found }) if found == "0.3"
        ));
    }

    #[test]
    fn test_custom_decoder_is_used() {
        struct Relocating;

        impl BindingDecoder for Relocating {
            fn decode_binding(
                &self,
                kind: BindingKind,
                payload: &[u8],
            ) -> Result<InputBinding, DecodeError> {
                let mut binding = decode_standard_binding(kind, payload)?;

                if let InputBinding::Texture(texture) = &mut binding {
                    texture.header.address += 8;
                }

                Ok(binding)
            }
        }

        let bytes = sample_table().to_bytes().unwrap();
        let table = BindingTable::from_bytes_with(&bytes, &Relocating).unwrap();

        assert_eq!(table.input("Main", "Albedo").address(), 8);
        assert_eq!(table.input("$globals", "World").address(), 0);
    }
}
