//! cuelink — Rust bindings for the Corsair CUE SDK lighting library.
//!
//! The crate is a thin, synchronous marshaling layer over the vendor's
//! closed-source dynamic library. It declares the native record layouts
//! ([`ffi`]), resolves the SDK's entry points behind the [`sdk::CueApi`]
//! seam, decodes native records into owned values ([`types`]), and sequences
//! the handshake → control-request → query/set session in [`Controller`].
//!
//! Device enumeration, LED addressing, frame batching and everything else
//! that makes the lights move lives inside the vendor library; this crate
//! only shapes data to cross that boundary correctly.
//!
//! ```no_run
//! use cuelink::Controller;
//!
//! # fn main() -> cuelink::Result<()> {
//! let controller = Controller::new(false)?;
//! for (index, model) in controller.device_models() {
//!     println!("{index}: {model}");
//! }
//! controller.set_led(0, 1, (255, 0, 0));
//! controller.flush();
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod error;
pub mod ffi;
pub mod sdk;
pub mod types;

pub use controller::Controller;
pub use error::{CueError, Result};
pub use sdk::{CueApi, CueSdk, DEFAULT_LIBRARY_PATH};
pub use types::{DeviceInfo, DeviceType, LedColor, LedPosition, ProtocolDetails};
