/*!
Character controller root module.

A physics-driven rolling sphere that walks on whatever surface the local gravity
field makes "down". The host engine integrates the body; this module only reads
its velocity at the start of a step and writes the adjusted velocity back.

- settings: tunables and the slope thresholds derived from them
- contact:  per-step ground/steep contact accumulation
- snap:     single-ray ground snapping after briefly losing contact
- velocity: input frame and contact-plane velocity control
- jump:     ground, steep and air jumps
- sphere:   the controller tying the pieces together per fixed step
*/

pub mod contact;
pub mod jump;
pub mod settings;
pub mod snap;
pub mod sphere;
pub mod velocity;

pub use contact::ContactAccumulator;
pub use jump::{JumpKind, jump_speed};
pub use settings::{ControllerSettings, SlopeLimits};
pub use sphere::{CharacterController, ControllerError, StepOutcome};
pub use velocity::InputFrame;
