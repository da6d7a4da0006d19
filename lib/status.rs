//! Lifecycle stages of the computable objects in the pipeline.

/// Progress of a computable object.
///
/// Stages are ordered and only ever advance: `Constructed < Prepared <
/// Computed`. A stage's method is a no-op when the object has already reached
/// or passed that stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectStatus {
    /// Freshly created; nothing is allocated.
    #[default]
    Constructed,
    /// Structures are allocated and sized, but values are not final.
    Prepared,
    /// Numerical values are final and may be queried.
    Computed,
}

impl ObjectStatus {
    /// Return `true` if `self` has reached at least `Prepared`.
    pub fn is_prepared(self) -> bool { self >= Self::Prepared }

    /// Return `true` if `self` has reached `Computed`.
    pub fn is_computed(self) -> bool { self >= Self::Computed }

    /// Advance to `next`, never moving backwards.
    pub fn advance(&mut self, next: Self) { *self = (*self).max(next); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_regresses() {
        let mut status = ObjectStatus::default();
        assert_eq!(status, ObjectStatus::Constructed);
        status.advance(ObjectStatus::Computed);
        status.advance(ObjectStatus::Prepared);
        assert_eq!(status, ObjectStatus::Computed);
        assert!(status.is_prepared());
        assert!(status.is_computed());
    }
}
