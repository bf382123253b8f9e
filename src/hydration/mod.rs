//! Client hydration subsystem.
//!
//! # Data Flow
//! ```text
//! Render (cache miss, function component):
//!     injector.rs → body scripts: {static}/js/<name>.js, {static}/js/init.js
//!                 → register GET {static}/js/init.js
//!
//! GET {static}/js/init.js:
//!     → referer guard
//!     → bootstrap.rs: obfuscation.rs (reveal key) → crypto.rs (import, encrypt)
//!     → window.__INITIAL_DATA__ = "<ciphertext>";
//! ```

pub mod bootstrap;
pub mod crypto;
pub mod injector;
pub mod obfuscation;

pub use bootstrap::{BootstrapEncoder, EncodeError};
pub use crypto::{AesGcmProvider, CryptoProvider};
pub use injector::HydrationInjector;
pub use obfuscation::KeyMaterial;
