//! System providers for all supported platforms.
//!
//! Each module implements [`SystemProvider`] for one console: a structural
//! validator (magic bytes / signature), an identity extractor (serial,
//! title, region, version), and — where the format embeds one — a header
//! checksum verification hook for the quality scorer.

use rom_warden_core::ProviderRegistry;

pub(crate) mod util;

pub mod gameboy;
pub mod gamecube;
pub mod gba;
pub mod genesis;
pub mod n3ds;
pub mod n64;
pub mod nes;
pub mod ps1;
pub mod ps2;
pub mod psp;
pub mod snes;
pub mod switch;
pub mod wii;

pub use gameboy::GameBoyProvider;
pub use gamecube::GameCubeProvider;
pub use gba::GbaProvider;
pub use genesis::GenesisProvider;
pub use n3ds::N3dsProvider;
pub use n64::N64Provider;
pub use nes::NesProvider;
pub use ps1::Ps1Provider;
pub use ps2::Ps2Provider;
pub use psp::PspProvider;
pub use snes::SnesProvider;
pub use switch::SwitchProvider;
pub use wii::WiiProvider;

/// Build a registry with every provider registered.
///
/// Registration order matters for shared extensions: it is the fallback
/// order when no validator confirms (e.g. a featureless `.iso` defaults to
/// PS2, matching the most common case in mixed collections).
pub fn default_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry
        .register(Ps2Provider::new())
        .register(Ps1Provider::new())
        .register(PspProvider::new())
        .register(GameCubeProvider::new())
        .register(WiiProvider::new())
        .register(SwitchProvider::new())
        .register(N3dsProvider::new())
        .register(NesProvider::new())
        .register(SnesProvider::new())
        .register(N64Provider::new())
        .register(GameBoyProvider::new())
        .register(GbaProvider::new())
        .register(GenesisProvider::new());
    registry
}
