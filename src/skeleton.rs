use serde::Deserialize;

use crate::animation::DUMP_VERSION;
use crate::error::DecodeError;
use crate::hierarchy::{global_transform, Overlay};
use crate::reader::Reader;
use crate::transform::{Transform, TRANSFORM_RECORD_SIZE};

/// How strictly the header fields of a skeleton dump are checked.
///
/// Skeleton dumps carry the same version tag and embedded counts as animation dumps, but known
/// good skeleton files have not been verified against them, so by default they are only logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    parents: Vec<i16>,
    bone_names: Vec<String>,
    transforms: Vec<Transform>,
    float_slot_values: Vec<f32>,
    float_slot_names: Vec<String>,
}

impl Skeleton {
    /// Builds a skeleton from already decoded parts, checking that the arrays line up and that the
    /// parent indices form a forest.
    pub fn from_hierarchy(name: String, parents: Vec<i16>, bone_names: Vec<String>, transforms: Vec<Transform>) -> Result<Self, DecodeError> {
        let bone_count = parents.len();
        if bone_names.len() != bone_count {
            return Err(DecodeError::CountMismatch {
                field: "bone name",
                expected: bone_count,
                found: bone_names.len(),
            });
        }
        if transforms.len() != bone_count {
            return Err(DecodeError::CountMismatch {
                field: "transform",
                expected: bone_count,
                found: transforms.len(),
            });
        }

        validate_hierarchy(&parents)?;

        Ok(Self {
            name,
            parents,
            bone_names,
            transforms,
            float_slot_values: Vec::new(),
            float_slot_names: Vec::new(),
        })
    }

    pub fn with_float_slots(mut self, values: Vec<f32>, names: Vec<String>) -> Result<Self, DecodeError> {
        if names.len() != values.len() {
            return Err(DecodeError::CountMismatch {
                field: "float slot name",
                expected: values.len(),
                found: names.len(),
            });
        }

        self.float_slot_values = values;
        self.float_slot_names = names;
        Ok(self)
    }

    pub fn from_bytes(data: &[u8], policy: HeaderPolicy) -> Result<Self, DecodeError> {
        Self::read(&mut Reader::new(data), policy)
    }

    pub fn read(reader: &mut Reader, policy: HeaderPolicy) -> Result<Self, DecodeError> {
        let header = reader.read_header_string()?;
        tracing::debug!("skeleton header: {}", header);

        let version = reader.read_u32()?;
        tracing::debug!("skeleton version: {:#010X}", version);
        if version != DUMP_VERSION {
            if policy == HeaderPolicy::Strict {
                return Err(DecodeError::VersionMismatch {
                    expected: DUMP_VERSION,
                    found: version,
                });
            }
            tracing::warn!("skeleton version tag {:#010X} differs from {:#010X}; continuing", version, DUMP_VERSION);
        }

        let num_skeletons = reader.read_i32()?;
        tracing::debug!("embedded skeleton count: {}", num_skeletons);
        if num_skeletons != 1 {
            if policy == HeaderPolicy::Strict {
                return Err(DecodeError::UnexpectedSkeleton(num_skeletons));
            }
            tracing::warn!("skeleton dump declares {} skeletons; reading the first", num_skeletons);
        }

        let name = reader.read_cstring()?;
        tracing::debug!("skeleton name: {}", name);

        let bone_count = reader.read_count("parent index", 2)?;
        let parents = reader.read_vec(bone_count, Reader::read_i16)?;

        // every array repeats its own count
        let name_count = reader.read_count("bone name", 1)?;
        if name_count != bone_count {
            return Err(DecodeError::CountMismatch {
                field: "bone name",
                expected: bone_count,
                found: name_count,
            });
        }
        let bone_names = reader.read_vec(name_count, Reader::read_cstring)?;

        let transform_count = reader.read_count("transform", TRANSFORM_RECORD_SIZE)?;
        if transform_count != bone_count {
            return Err(DecodeError::CountMismatch {
                field: "transform",
                expected: bone_count,
                found: transform_count,
            });
        }
        let transforms = reader.read_vec(transform_count, Transform::read)?;

        let slot_count = reader.read_count("float slot", 4)?;
        let float_slot_values = reader.read_vec(slot_count, Reader::read_f32)?;
        let slot_name_count = reader.read_count("float slot name", 1)?;
        if slot_name_count != slot_count {
            return Err(DecodeError::CountMismatch {
                field: "float slot name",
                expected: slot_count,
                found: slot_name_count,
            });
        }
        let float_slot_names = reader.read_vec(slot_name_count, Reader::read_cstring)?;

        match policy {
            HeaderPolicy::Strict => {
                let num_animations = reader.read_i32()?;
                if num_animations != 0 {
                    return Err(DecodeError::UnexpectedAnimationCount(num_animations));
                }
            }
            HeaderPolicy::Lenient if reader.remaining() >= 4 => {
                let num_animations = reader.read_i32()?;
                tracing::debug!("embedded animation count: {}", num_animations);
            }
            HeaderPolicy::Lenient => (),
        }

        tracing::debug!("skeleton has {} bones and {} float slots", bone_count, slot_count);

        Self::from_hierarchy(name, parents, bone_names, transforms)?.with_float_slots(float_slot_values, float_slot_names)
    }

    pub fn num_bones(&self) -> usize {
        self.parents.len()
    }

    pub fn parent(&self, bone: usize) -> Option<usize> {
        usize::try_from(self.parents[bone]).ok()
    }

    pub fn iter_hierarchy(&self) -> impl Iterator<Item = Option<usize>> + '_ {
        (0..self.num_bones()).map(|bone| self.parent(bone))
    }

    pub fn parents(&self) -> &[i16] {
        &self.parents
    }

    pub fn bone_name(&self, bone: usize) -> &str {
        &self.bone_names[bone]
    }

    pub fn bone_names(&self) -> &[String] {
        &self.bone_names
    }

    pub fn local_transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn float_slots(&self) -> impl Iterator<Item = (&str, f32)> + '_ {
        self.float_slot_names.iter().map(String::as_str).zip(self.float_slot_values.iter().copied())
    }

    pub fn num_float_slots(&self) -> usize {
        self.float_slot_values.len()
    }

    /// Overlay that resolves every bone to its bind pose.
    pub fn bind_pose(&self) -> Overlay<'_> {
        Overlay::new(&self.transforms, &[])
    }

    /// Overlay that substitutes one animation frame's transforms for the leading bones.
    pub fn overlay<'a>(&'a self, frame: &'a [Transform]) -> Overlay<'a> {
        Overlay::new(&self.transforms, frame)
    }

    /// Bind-pose transform of `bone` relative to the skeleton root.
    pub fn get_global_transform(&self, bone: usize) -> Transform {
        global_transform(&self.parents, &self.bind_pose(), bone)
    }

    pub fn get_posed_transform(&self, overlay: &Overlay, bone: usize) -> Transform {
        global_transform(&self.parents, overlay, bone)
    }
}

fn validate_hierarchy(parents: &[i16]) -> Result<(), DecodeError> {
    let bone_count = parents.len();
    for (bone, &parent) in parents.iter().enumerate() {
        if parent != -1 && !(0..bone_count as i64).contains(&(parent as i64)) {
            return Err(DecodeError::InvalidParent { bone, parent });
        }
    }

    // a chain longer than the bone count must revisit a bone
    for bone in 0..bone_count {
        let mut next = parents[bone];
        let mut steps = 0;
        while next != -1 {
            steps += 1;
            if steps > bone_count {
                return Err(DecodeError::CyclicHierarchy { bone });
            }
            next = parents[next as usize];
        }
    }

    Ok(())
}
