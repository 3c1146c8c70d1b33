//! Stream descriptors and the resolution tokens they carry.

mod assembler;
mod token;

pub use assembler::{BehaviorHints, StreamAssembler, StreamDescriptor, ERROR_EXTERNAL_URL};
pub use token::{
    ParsedIdInfo, PlaybackInfo, ResolutionToken, StoreAuth, TokenError, TorrentPlayback,
    UsenetPlayback, RESOLVE_PATH,
};
