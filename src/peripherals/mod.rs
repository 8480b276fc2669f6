//! Hardware collaborators consumed by the control core.
//!
//! The core never touches a motor or controller directly. It talks to
//! implementations of [`Actuator`](actuator::Actuator) and
//! [`OperatorInput`](controller::OperatorInput), which are provided for
//! vexide devices on the brain and by the `sim` doubles everywhere else.

/// Motor and servo command interface.
///
/// Provides the [`Actuator`](actuator::Actuator) trait used by the
/// drivetrain, puncher, angle adjuster, intake and cap lift.
pub mod actuator;

/// Operator controller input.
///
/// Provides [`InputState`](controller::InputState) snapshots with normalized
/// stick axes and edge-aware button states.
pub mod controller;

/// vexide bindings for the collaborator traits.
#[cfg(target_os = "vexos")]
pub mod vex;

use std::{cell::RefCell, rc::Rc};

/// Makes an object clonable by wrapping it in `Rc` and `RefCell`
pub fn make_cloneable<T>(t: T) -> Rc<RefCell<T>> { Rc::new(RefCell::new(t)) }
