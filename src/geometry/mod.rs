pub(crate) mod hit;
pub(crate) mod transform;
