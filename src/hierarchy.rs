use crate::transform::Transform;

/// A skeleton's bind pose with the leading bones replaced by one animation frame.
///
/// Both arrays are borrowed, so building an overlay per frame costs nothing. Bones past the end of
/// the frame keep their bind-pose transform.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    bind_pose: &'a [Transform],
    frame: &'a [Transform],
}

impl<'a> Overlay<'a> {
    pub fn new(bind_pose: &'a [Transform], frame: &'a [Transform]) -> Self {
        Self { bind_pose, frame }
    }

    /// Number of leading bones taken from the frame.
    pub fn num_overridden(&self) -> usize {
        self.frame.len().min(self.bind_pose.len())
    }

    pub fn len(&self) -> usize {
        self.bind_pose.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bind_pose.is_empty()
    }

    pub fn transform(&self, bone: usize) -> &'a Transform {
        if bone < self.num_overridden() {
            &self.frame[bone]
        } else {
            &self.bind_pose[bone]
        }
    }
}

/// Resolves `bone` to root space by composing each ancestor, nearest first, onto its transform.
///
/// `parents` must form a forest; roots are marked with -1.
pub fn global_transform(parents: &[i16], overlay: &Overlay, bone: usize) -> Transform {
    let mut transform = *overlay.transform(bone);
    let mut next = parents[bone];

    while let Ok(parent) = usize::try_from(next) {
        transform = overlay.transform(parent).compose(&transform);
        next = parents[parent];
    }

    transform
}
