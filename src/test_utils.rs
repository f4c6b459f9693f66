use std::io::Cursor;

use binrw::{BinWrite, Endian};

use crate::animation::DUMP_VERSION;
use crate::transform::{Transform, TransformRecord};

const TOLERANCE: f32 = 1e-5;

pub(crate) fn assert_transform_eq(actual: &Transform, expected: &Transform) {
    let close = |a: f32, b: f32| (a - b).abs() <= TOLERANCE;
    let translation_ok = (0..3).all(|i| close(actual.translation[i], expected.translation[i]));
    let rotation_ok = actual
        .rotation_wxyz()
        .iter()
        .zip(expected.rotation_wxyz())
        .all(|(&a, b)| close(a, b));
    assert!(
        translation_ok && rotation_ok && close(actual.scale, expected.scale),
        "transforms differ:\n  actual:   {:?}\n  expected: {:?}",
        actual,
        expected
    );
}

/// Builds dump bytes in the on-disk layout.
pub(crate) struct DumpWriter {
    cursor: Cursor<Vec<u8>>,
}

impl DumpWriter {
    pub(crate) fn new() -> Self {
        Self {
            cursor: Cursor::new(Vec::new()),
        }
    }

    fn write<T>(&mut self, value: &T) -> &mut Self
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        value.write_options(&mut self.cursor, Endian::Little, ()).unwrap();
        self
    }

    pub(crate) fn header(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes()).bytes(b"\n")
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.write(byte);
        }
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.write(&value)
    }

    pub(crate) fn i32(&mut self, value: i32) -> &mut Self {
        self.write(&value)
    }

    pub(crate) fn i16(&mut self, value: i16) -> &mut Self {
        self.write(&value)
    }

    pub(crate) fn f32(&mut self, value: f32) -> &mut Self {
        self.write(&value)
    }

    pub(crate) fn cstring(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes()).bytes(&[0])
    }

    pub(crate) fn transform(&mut self, transform: &Transform) -> &mut Self {
        self.write(&TransformRecord::from(transform))
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        std::mem::take(self.cursor.get_mut())
    }
}

pub(crate) struct SkeletonFixture<'a> {
    pub name: &'a str,
    pub parents: &'a [i16],
    pub bone_names: &'a [&'a str],
    pub transforms: &'a [Transform],
    pub slot_values: &'a [f32],
    pub slot_names: &'a [&'a str],
}

impl SkeletonFixture<'_> {
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut writer = DumpWriter::new();
        writer.header("hkx skeleton dump").u32(DUMP_VERSION).i32(1).cstring(self.name);

        writer.i32(self.parents.len() as i32);
        for &parent in self.parents {
            writer.i16(parent);
        }
        writer.i32(self.bone_names.len() as i32);
        for name in self.bone_names {
            writer.cstring(name);
        }
        writer.i32(self.transforms.len() as i32);
        for transform in self.transforms {
            writer.transform(transform);
        }
        writer.i32(self.slot_values.len() as i32);
        for &value in self.slot_values {
            writer.f32(value);
        }
        writer.i32(self.slot_names.len() as i32);
        for name in self.slot_names {
            writer.cstring(name);
        }
        writer.i32(0);

        writer.finish()
    }
}

pub(crate) struct AnimationFixture<'a> {
    pub duration: f32,
    pub frames: &'a [(f32, Vec<Transform>, Vec<f32>)],
    pub annotations: &'a [(f32, &'a str)],
}

impl AnimationFixture<'_> {
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let transform_count = self.frames.first().map_or(0, |(_, transforms, _)| transforms.len());
        let float_count = self.frames.first().map_or(0, |(_, _, floats)| floats.len());

        let mut writer = DumpWriter::new();
        writer
            .header("hkx animation dump")
            .u32(DUMP_VERSION)
            .i32(0)
            .i32(1)
            .i32(self.frames.len() as i32)
            .f32(self.duration)
            .i32(transform_count as i32)
            .i32(float_count as i32);

        for (time, transforms, floats) in self.frames {
            writer.f32(*time);
            for transform in transforms {
                writer.transform(transform);
            }
            for &value in floats {
                writer.f32(value);
            }
        }

        writer.i32(1).i32(self.annotations.len() as i32);
        for &(time, text) in self.annotations {
            writer.f32(time).cstring(text);
        }

        writer.finish()
    }
}
