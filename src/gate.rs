//! Render gate: full page or same-sized placeholder
//!
//! A pure function of three flags, recomputed every frame. Pages flying past
//! during a fast flick are replaced by blank placeholders of identical size;
//! during initial load and while a zoom anchor is pending, full rendering is
//! forced so the user never stares at an empty viewport.

/// What to draw for a visible item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderDecision {
    /// Invoke the page renderer at full fidelity
    Full,
    /// Blank placeholder of identical size
    Placeholder,
}

/// Inputs to the gate, all owned by other components
#[derive(Clone, Copy, Debug)]
pub struct GateInputs {
    /// First geometry batch for the current document has resolved
    pub geometry_ready: bool,
    /// A captured zoom anchor is waiting to be consumed
    pub zooming: bool,
    /// Signed velocity in item heights per sampling interval
    pub normalized_velocity: f32,
}

/// Decide whether a visible item renders at full fidelity
#[must_use]
pub fn decide(inputs: GateInputs, fast_threshold: f32) -> RenderDecision {
    let fast = inputs.normalized_velocity.abs() > fast_threshold;
    if inputs.zooming || !fast || !inputs.geometry_ready {
        RenderDecision::Full
    } else {
        RenderDecision::Placeholder
    }
}
