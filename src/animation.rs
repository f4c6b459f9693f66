use crate::error::DecodeError;
use crate::reader::Reader;
use crate::transform::{Transform, TRANSFORM_RECORD_SIZE};

/// Version tag required at the start of every animation dump.
pub const DUMP_VERSION: u32 = 0x01000200;

/// One sample of every animated transform and float channel.
#[derive(Debug, Clone)]
pub struct Pose {
    pub time: f32,
    pub transforms: Vec<Transform>,
    pub floats: Vec<f32>,
}

impl Pose {
    fn read(reader: &mut Reader, transform_count: usize, float_count: usize) -> Result<Self, DecodeError> {
        let time = reader.read_f32()?;
        let transforms = reader.read_vec(transform_count, Transform::read)?;
        let floats = reader.read_vec(float_count, Reader::read_f32)?;

        Ok(Self { time, transforms, floats })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub time: f32,
    pub text: String,
}

impl Annotation {
    fn read(reader: &mut Reader) -> Result<Self, DecodeError> {
        let time = reader.read_f32()?;
        let text = reader.read_cstring()?;
        Ok(Self { time, text })
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub duration: f32,
    transform_count: usize,
    float_count: usize,
    poses: Vec<Pose>,
    annotations: Vec<Annotation>,
}

fn pose_width(reader: &Reader, field: &'static str, count: i32) -> Result<usize, DecodeError> {
    usize::try_from(count).map_err(|_| DecodeError::UnexpectedCount {
        field,
        count: count.into(),
        remaining: reader.remaining(),
    })
}

impl Animation {
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        Self::read(&mut Reader::new(data))
    }

    pub fn read(reader: &mut Reader) -> Result<Self, DecodeError> {
        let header = reader.read_header_string()?;
        tracing::debug!("animation header: {}", header);

        let version = reader.read_u32()?;
        if version != DUMP_VERSION {
            return Err(DecodeError::VersionMismatch {
                expected: DUMP_VERSION,
                found: version,
            });
        }

        let num_skeletons = reader.read_i32()?;
        if num_skeletons != 0 {
            return Err(DecodeError::UnexpectedSkeleton(num_skeletons));
        }

        let num_animations = reader.read_i32()?;
        if num_animations != 1 {
            return Err(DecodeError::UnexpectedAnimationCount(num_animations));
        }

        let frame_count = reader.read_i32()?;
        let duration = reader.read_f32()?;
        let transform_count = reader.read_i32()?;
        let float_count = reader.read_i32()?;
        tracing::debug!(
            "{} frames over {} s, {} transforms and {} floats per frame",
            frame_count,
            duration,
            transform_count,
            float_count
        );

        // per-pose widths only have to fit once there is a frame to hold them
        let transform_count = pose_width(reader, "transform", transform_count)?;
        let float_count = pose_width(reader, "float", float_count)?;
        let pose_size = transform_count
            .checked_mul(TRANSFORM_RECORD_SIZE)
            .zip(float_count.checked_mul(4))
            .and_then(|(transforms, floats)| transforms.checked_add(floats))
            .and_then(|size| size.checked_add(4));
        let frame_count = match pose_size {
            Some(pose_size) => reader.check_count("frame", frame_count, pose_size)?,
            None if frame_count == 0 => 0,
            None => {
                return Err(DecodeError::UnexpectedCount {
                    field: "frame",
                    count: frame_count.into(),
                    remaining: reader.remaining(),
                })
            }
        };

        let poses = reader.read_vec(frame_count, |reader| Pose::read(reader, transform_count, float_count))?;

        let num_tracks = reader.read_i32()?;
        // smallest annotation is a time and an empty string
        let annotation_count = reader.read_count("annotation", 5)?;
        tracing::debug!("{} annotation tracks, {} annotations", num_tracks, annotation_count);
        let annotations = reader.read_vec(annotation_count, Annotation::read)?;

        Ok(Self {
            duration,
            transform_count,
            float_count,
            poses,
            annotations,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.poses.len()
    }

    pub const fn transform_count(&self) -> usize {
        self.transform_count
    }

    pub const fn float_count(&self) -> usize {
        self.float_count
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}
