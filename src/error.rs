//! Engine error types.

/// Errors reported by fallible space and body operations.
///
/// Precondition violations abort the offending call and leave the space
/// untouched. Degenerate geometry inside the narrow phase is not an error;
/// it degrades to "no contact".
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("{0} is already added to the space")]
    AlreadyInSpace(&'static str),

    #[error("{0} is not in the space")]
    NotInSpace(&'static str),

    #[error("shape's body must be added to the space before the shape")]
    BodyNotInSpace,

    #[error("dynamic body mass must be finite and positive, got {0}")]
    InvalidMass(f32),

    #[error("dynamic body moment must be positive, got {0}")]
    InvalidMoment(f32),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(&'static str),

    #[error("non-finite value passed for {0}")]
    NonFinite(&'static str),

    #[error("time step must be finite and non-negative, got {0}")]
    InvalidTimeStep(f32),

    #[error("polygon needs at least 3 non-collinear vertices")]
    DegeneratePolygon,
}
