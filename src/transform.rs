use std::ops::Mul;

use binrw::binrw;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use crate::error::DecodeError;
use crate::reader::Reader;

pub type Vec3 = Vector3<f32>;
pub type Quat = UnitQuaternion<f32>;

/// Size of one transform record on the wire.
pub const TRANSFORM_RECORD_SIZE: usize = 48;

// the format stores three 4-float groups per transform. scale lives in the z slot of the third
// group; everything else in that group is ignored.
#[binrw]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TransformRecord {
    translation: [f32; 4],
    rotation: [f32; 4],
    scale: [f32; 4],
}

impl From<&TransformRecord> for Transform {
    fn from(value: &TransformRecord) -> Self {
        let [tx, ty, tz, _] = value.translation;
        let [qx, qy, qz, qw] = value.rotation;
        Self {
            translation: Vec3::new(tx, ty, tz),
            // on-disk components are carried through as-is; the format promises unit length
            rotation: Quat::new_unchecked(Quaternion::new(qw, qx, qy, qz)),
            scale: value.scale[2],
        }
    }
}

#[cfg(test)]
impl From<&Transform> for TransformRecord {
    fn from(value: &Transform) -> Self {
        let q = value.rotation.quaternion();
        Self {
            translation: [value.translation.x, value.translation.y, value.translation.z, 0.0],
            rotation: [q.i, q.j, q.k, q.w],
            scale: [0.0, 0.0, value.scale, 0.0],
        }
    }
}

/// Translation, rotation and uniform scale of one bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Transform {
    pub fn new(translation: Vec3, rotation: Quat, scale: f32) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity(), 1.0)
    }

    pub fn read(reader: &mut Reader) -> Result<Self, DecodeError> {
        let record: TransformRecord = reader.read_le()?;
        Ok(Self::from(&record))
    }

    /// Expresses `child`, given relative to `self`, in the space `self` is relative to.
    pub fn compose(&self, child: &Self) -> Self {
        Self {
            translation: self.translation + (self.rotation * child.translation) * self.scale,
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Rotation components in `w, x, y, z` order.
    pub fn rotation_wxyz(&self) -> [f32; 4] {
        let q = self.rotation.quaternion();
        [q.w, q.i, q.j, q.k]
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(self, child: Self) -> Self {
        self.compose(&child)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::test_utils::{assert_transform_eq, DumpWriter};

    #[test]
    fn record_is_48_bytes() {
        assert_eq!(std::mem::size_of::<TransformRecord>(), TRANSFORM_RECORD_SIZE);
    }

    #[test]
    fn decodes_observed_field_layout() {
        let floats: [f32; 12] = [
            1.0, 2.0, 3.0, 99.0, // translation, padding
            0.0, 0.0, 0.70710677, 0.70710677, // x y z w
            7.0, 8.0, 2.5, 9.0, // scale in z
        ];
        let bytes: Vec<u8> = floats.iter().flat_map(|f| f.to_le_bytes()).collect();

        let mut reader = Reader::new(&bytes);
        let transform = Transform::read(&mut reader).unwrap();
        assert_eq!(transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.rotation_wxyz(), [0.70710677, 0.0, 0.0, 0.70710677]);
        assert_eq!(transform.scale, 2.5);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn short_record_is_truncated() {
        let mut writer = DumpWriter::new();
        writer.transform(&Transform::identity());
        let bytes = writer.finish();

        let mut reader = Reader::new(&bytes[..40]);
        assert!(matches!(Transform::read(&mut reader), Err(DecodeError::Truncated { needed: 48, .. })));
    }

    #[test]
    fn compose_applies_parent_rotation_and_scale_to_child_translation() {
        let parent = Transform::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
            2.0,
        );
        let child = Transform::new(Vec3::new(1.0, 0.0, 0.0), Quat::identity(), 3.0);

        let composed = parent.compose(&child);
        assert_transform_eq(
            &composed,
            &Transform::new(
                Vec3::new(1.0, 2.0, 0.0),
                Quat::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
                6.0,
            ),
        );
        assert_eq!(parent * child, composed);
    }

    #[test]
    fn compose_is_associative() {
        let a = Transform::new(
            Vec3::new(0.5, -1.0, 2.0),
            Quat::from_euler_angles(0.3, -0.2, 1.1),
            1.5,
        );
        let b = Transform::new(
            Vec3::new(-2.0, 0.25, 1.0),
            Quat::from_euler_angles(-0.7, 0.4, 0.1),
            0.8,
        );
        let c = Transform::new(
            Vec3::new(1.0, 3.0, -0.5),
            Quat::from_euler_angles(0.0, 1.2, -0.6),
            2.0,
        );

        assert_transform_eq(&a.compose(&b).compose(&c), &a.compose(&b.compose(&c)));
    }

    #[test]
    fn identity_is_neutral() {
        let t = Transform::new(Vec3::new(4.0, 5.0, 6.0), Quat::from_euler_angles(0.1, 0.2, 0.3), 1.25);
        assert_transform_eq(&Transform::identity().compose(&t), &t);
        assert_transform_eq(&t.compose(&Transform::identity()), &t);
    }
}
