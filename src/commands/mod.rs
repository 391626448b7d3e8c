pub mod classify;
pub mod fingerprint;
pub mod saliency;
pub mod stego;
pub mod train;
