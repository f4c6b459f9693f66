//! CSV tables consumed by the host-side importer.
//!
//! `skeleton.csv`: `name, parent_name, tx, ty, tz, qw, qx, qy, qz, scale`, one row per bone,
//! `NULL` as the parent of a root.
//!
//! Animation tables: `frame, name, tx, ty, tz, qw, qx, qy, qz, scale`, one row per bone per
//! frame in frame-major order.
//!
//! All transforms are global (relative to the skeleton root). There is no header row.

use std::io::Write;

use anyhow::Result;

use crate::animation::Animation;
use crate::skeleton::Skeleton;
use crate::transform::Transform;

pub const ROOT_PARENT_NAME: &str = "NULL";
pub const SKELETON_FILE_NAME: &str = "skeleton.csv";

fn write_field(mut f: impl Write, field: &str) -> std::io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        write!(f, "\"{}\"", field.replace('"', "\"\""))
    } else {
        f.write_all(field.as_bytes())
    }
}

fn write_transform_columns(mut f: impl Write, transform: &Transform) -> std::io::Result<()> {
    let t = &transform.translation;
    let [qw, qx, qy, qz] = transform.rotation_wxyz();
    writeln!(f, ",{},{},{},{},{},{},{},{}", t.x, t.y, t.z, qw, qx, qy, qz, transform.scale)
}

/// Writes one row per bone with its bind-pose global transform. Returns the number of rows.
pub fn write_skeleton_csv(skeleton: &Skeleton, mut f: impl Write) -> Result<usize> {
    let bind_pose = skeleton.bind_pose();
    if bind_pose.is_empty() {
        tracing::warn!("skeleton '{}' has no bones; writing an empty table", skeleton.name);
    }

    for bone in 0..bind_pose.len() {
        let parent_name = skeleton.parent(bone).map_or(ROOT_PARENT_NAME, |parent| skeleton.bone_name(parent));

        write_field(&mut f, skeleton.bone_name(bone))?;
        f.write_all(b",")?;
        write_field(&mut f, parent_name)?;
        write_transform_columns(&mut f, &skeleton.get_posed_transform(&bind_pose, bone))?;
    }

    f.flush()?;
    Ok(bind_pose.len())
}

/// Writes one row per frame and bone, resolving each frame through an overlay of the animation's
/// transforms on the skeleton's bind pose. Returns the number of rows.
pub fn write_animation_csv(skeleton: &Skeleton, animation: &Animation, mut f: impl Write) -> Result<usize> {
    if animation.transform_count() != skeleton.num_bones() {
        tracing::debug!(
            "animation animates {} transforms, skeleton has {} bones",
            animation.transform_count(),
            skeleton.num_bones()
        );
    }

    let mut rows = 0;
    for (frame, pose) in animation.poses().iter().enumerate() {
        let overlay = skeleton.overlay(&pose.transforms);
        for bone in 0..overlay.len() {
            write!(f, "{},", frame)?;
            write_field(&mut f, skeleton.bone_name(bone))?;
            write_transform_columns(&mut f, &skeleton.get_posed_transform(&overlay, bone))?;
            rows += 1;
        }
    }

    f.flush()?;
    Ok(rows)
}
